//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, BMP, GIF) | `image::ImageReader` with content sniffing |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Denoise | `imageproc::filter::median_filter` |
//! | Text overlay | `imageproc::drawing::draw_text_mut` + `ab_glyph` font |
//! | Inpaint | onion-peel fill from the mask border inward |

use super::backend::{BackendError, ImageBackend};
use super::params::{DenoiseParams, InpaintParams, Quality, TextStyle};
use ab_glyph::{FontVec, PxScale};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder, ImageReader, Rgb, RgbImage};
use std::path::{Path, PathBuf};

/// Fonts tried, in order, when no overlay font is configured.
const FALLBACK_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Default)]
pub struct RustBackend {
    font: Option<PathBuf>,
}

impl RustBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the TrueType/OpenType font at `path` for text overlays.
    pub fn with_font(font: impl Into<PathBuf>) -> Self {
        Self {
            font: Some(font.into()),
        }
    }

    fn load_font(&self) -> Result<FontVec, BackendError> {
        let candidates: Vec<&Path> = match &self.font {
            Some(path) => vec![path.as_path()],
            None => FALLBACK_FONTS.iter().map(Path::new).collect(),
        };

        for path in &candidates {
            let Ok(bytes) = std::fs::read(path) else {
                continue;
            };
            match FontVec::try_from_vec(bytes) {
                Ok(font) => return Ok(font),
                Err(e) => log::warn!("Ignoring unreadable font {}: {e}", path.display()),
            }
        }

        Err(BackendError::FontUnavailable(match &self.font {
            Some(path) => format!("cannot load {}", path.display()),
            None => "no system font found; set overlay.font in the config".to_string(),
        }))
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<RgbImage, BackendError> {
        let decode_err = |reason: String| BackendError::Decode {
            path: path.to_path_buf(),
            reason,
        };
        let img = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| decode_err(e.to_string()))?;
        Ok(img.to_rgb8())
    }

    fn encode_jpeg(
        &self,
        image: &RgbImage,
        path: &Path,
        quality: Quality,
    ) -> Result<(), BackendError> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        JpegEncoder::new_with_quality(writer, quality.value())
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| BackendError::Encode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    fn inpaint(
        &self,
        image: &RgbImage,
        mask: &GrayImage,
        params: InpaintParams,
    ) -> Result<RgbImage, BackendError> {
        if mask.dimensions() != image.dimensions() {
            return Err(BackendError::ProcessingFailed(format!(
                "mask is {:?} but image is {:?}",
                mask.dimensions(),
                image.dimensions()
            )));
        }
        Ok(fill_from_border(image, mask, params.radius.max(1)))
    }

    fn denoise(&self, image: &RgbImage, params: DenoiseParams) -> Result<RgbImage, BackendError> {
        Ok(imageproc::filter::median_filter(
            image,
            params.radius,
            params.radius,
        ))
    }

    fn draw_text(
        &self,
        image: &mut RgbImage,
        text: &str,
        style: &TextStyle,
    ) -> Result<(), BackendError> {
        let font = self.load_font()?;
        // draw_text_mut positions the top of the line box
        let top = (image.height() / 2) as i32 - style.scale.round() as i32;
        imageproc::drawing::draw_text_mut(
            image,
            Rgb(style.color),
            style.left,
            top,
            PxScale::from(style.scale),
            &font,
            text,
        );
        Ok(())
    }
}

/// Coordinates of the masked (non-zero) pixels, in row-major order.
fn masked_pixels(mask: &GrayImage) -> Vec<(u32, u32)> {
    mask.enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] != 0)
        .map(|(x, y, _)| (x, y))
        .collect()
}

/// Fill masked pixels ring by ring from the border of the masked region.
///
/// Each pass assigns every still-masked pixel that has at least one known
/// pixel within `radius` the inverse-square-distance weighted mean of those
/// known pixels. Newly filled pixels become known for the next pass. A mask
/// covering the whole image leaves it unchanged.
///
/// Passes only visit pixels that are still masked, so the work depends on
/// the masked area rather than the image size.
fn fill_from_border(image: &RgbImage, mask: &GrayImage, radius: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let mut out = image.clone();
    let mut known: Vec<bool> = mask.pixels().map(|p| p.0[0] == 0).collect();
    let mut pending = masked_pixels(mask);
    let r = radius as i64;
    let r2 = r * r;

    while !pending.is_empty() {
        let mut filled = Vec::new();
        let mut still_pending = Vec::with_capacity(pending.len());

        for (x, y) in pending {
            let mut acc = [0.0f64; 3];
            let mut total = 0.0f64;
            for dy in -r..=r {
                for dx in -r..=r {
                    let d2 = dx * dx + dy * dy;
                    if d2 == 0 || d2 > r2 {
                        continue;
                    }
                    let (nx, ny) = (x as i64 + dx, y as i64 + dy);
                    if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                        continue;
                    }
                    if !known[(ny as u32 * width + nx as u32) as usize] {
                        continue;
                    }
                    let weight = 1.0 / d2 as f64;
                    let sample = out.get_pixel(nx as u32, ny as u32).0;
                    for (a, s) in acc.iter_mut().zip(sample) {
                        *a += weight * f64::from(s);
                    }
                    total += weight;
                }
            }

            if total > 0.0 {
                let color = acc.map(|a| (a / total).round().clamp(0.0, 255.0) as u8);
                filled.push((x, y, color));
            } else {
                still_pending.push((x, y));
            }
        }

        if filled.is_empty() {
            break;
        }
        for (x, y, color) in filled {
            out.put_pixel(x, y, Rgb(color));
            known[(y * width + x) as usize] = true;
        }
        pending = still_pending;
    }

    out
}
