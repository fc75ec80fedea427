//! Image processing — pure Rust, no system libraries.
//!
//! | Operation | Where |
//! |---|---|
//! | **Brightness / region brighten** | [`operations`], saturating per sample |
//! | **HSL shift** | [`operations`] over 8-bit HSV from the calculations module |
//! | **Inpaint / denoise / text** | [`ImageBackend`] capabilities |
//! | **Decode / JPEG encode** | [`ImageBackend`] capabilities |
//!
//! The module is split into:
//! - **Calculations**: Pure per-sample functions (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Functions that apply one edit to one owned buffer

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{channel_means, hsv_to_rgb, rgb_to_hsv, saturating_shift, shift_hsv};
pub use operations::{OperationError, metadata_sidecar_path};
pub use params::{DenoiseParams, InpaintParams, Quality, Rect, TextStyle};
pub use rust_backend::RustBackend;
