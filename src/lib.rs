//! # Darkroom
//!
//! A minimal photo culling and touch-up tool. Point it at one or more
//! folders, step through every file, apply a few quick adjustments, mark
//! rejects, and write the keepers out as JPEGs.
//!
//! # Workflow
//!
//! ```text
//! 1. Load     folders/  →  Catalogue          (one handle per regular file)
//! 2. Edit     Catalogue →  Catalogue          (text session or preview window)
//! 3. Export   Catalogue →  edited_0.jpg ...   (edited, not culled)
//! ```
//!
//! Everything stays in memory between stages; nothing is written to disk
//! until export, apart from the preset file and metadata sidecars that the
//! user asks for explicitly.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`catalogue`] | Folder scanning, [`catalogue::ImageHandle`] with edit and cull flags |
//! | [`imaging`] | Pixel operations, colour conversion, and the [`imaging::ImageBackend`] trait |
//! | [`preset`] | Four-integer adjustment preset stored in a text file |
//! | [`session`] | Text-driven per-image state machine |
//! | [`input`] | Integer parsing for values typed at a prompt |
//! | [`preview`] | Slider model behind the preview window |
//! | [`export`] | Sequential JPEG export of edited handles |
//! | [`config`] | `darkroom.toml` loading, merging onto stock defaults, validation |
//! | [`output`] | User-facing message formatting |
//! | `gui` | iced preview window (cargo feature `gui`) |
//!
//! # Design Decisions
//!
//! ## Undecodable Files Stay in the Catalogue
//!
//! A file that fails to decode still gets a handle with no pixels. Edits on
//! it are no-ops and export skips it, but the user still sees it in order
//! and can cull it. The catalogue mirrors the folder contents one to one.
//!
//! ## Rectangles Are Rejected, Not Clamped
//!
//! Region commands take a user-typed rectangle. One that leaves the image
//! returns [`imaging::OperationError::OutOfRange`] and the session reports
//! it; silently editing a different area than the one asked for is worse
//! than asking again.
//!
//! ## Pluggable Backend
//!
//! Codec I/O, inpainting, denoising and text rendering go through
//! [`imaging::ImageBackend`]. [`imaging::RustBackend`] implements them with
//! `image`, `imageproc` and `ab_glyph`; tests swap in a recording mock so
//! session and export logic can be checked without real pixels on disk.

pub mod catalogue;
pub mod config;
pub mod export;
#[cfg(feature = "gui")]
pub mod gui;
pub mod imaging;
pub mod input;
pub mod output;
pub mod preset;
pub mod preview;
pub mod session;
