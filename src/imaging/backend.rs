//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the capabilities every backend must
//! supply: decode, JPEG encode, inpaint, denoise and text rendering. These
//! are the opaque pixel algorithms; everything above them (which pixels to
//! touch, when to mark a handle edited) lives in
//! [`operations`](super::operations).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on `image`,
//! `imageproc` and `ab_glyph`.

use super::params::{DenoiseParams, InpaintParams, Quality, TextStyle};
use image::{GrayImage, RgbImage};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("Failed to encode {path}: {reason}")]
    Encode { path: PathBuf, reason: String },
    #[error("No usable font for text overlay: {0}")]
    FontUnavailable(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for image processing backends.
///
/// Every method is a pure buffer-in, buffer-out contract except `draw_text`,
/// which renders onto the caller's buffer, and the two I/O methods.
pub trait ImageBackend {
    /// Decode the file at `path` into 8-bit RGB.
    fn decode(&self, path: &Path) -> Result<RgbImage, BackendError>;

    /// Encode `image` as JPEG at `path`, replacing any existing file.
    fn encode_jpeg(&self, image: &RgbImage, path: &Path, quality: Quality)
    -> Result<(), BackendError>;

    /// Fill every pixel where `mask` is non-zero from its unmasked surroundings.
    fn inpaint(
        &self,
        image: &RgbImage,
        mask: &GrayImage,
        params: InpaintParams,
    ) -> Result<RgbImage, BackendError>;

    /// Fixed-strength colour denoise.
    fn denoise(&self, image: &RgbImage, params: DenoiseParams) -> Result<RgbImage, BackendError>;

    /// Render `text` left-aligned with its baseline on the vertical centre.
    fn draw_text(
        &self,
        image: &mut RgbImage,
        text: &str,
        style: &TextStyle,
    ) -> Result<(), BackendError>;
}
