//! High-level image operations.
//!
//! These functions decide *which* pixels change and hand the opaque parts
//! (inpainting, denoising, text rendering) to an [`ImageBackend`]. Each one
//! works on a single owned buffer; marking a handle as edited is the
//! caller's job (see [`ImageHandle::edit`](crate::catalogue::ImageHandle::edit)).

use super::backend::{BackendError, ImageBackend};
use super::calculations::{channel_means, saturating_shift, shift_hsv};
use super::params::{DenoiseParams, InpaintParams, Rect, TextStyle};
use image::{GrayImage, Luma, RgbImage};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OperationError {
    #[error("Rectangle {rect} is out of range for a {width}x{height} image")]
    OutOfRange { rect: Rect, width: u32, height: u32 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, OperationError>;

/// Add `delta` to every sample, saturating at 0 and 255.
pub fn brighten(image: &mut RgbImage, delta: i32) {
    for sample in image.iter_mut() {
        *sample = saturating_shift(*sample, delta);
    }
}

/// Shift hue, saturation and lightness of every pixel by fixed deltas.
pub fn shift_hsl(image: &mut RgbImage, hue: i32, saturation: i32, light: i32) {
    for pixel in image.pixels_mut() {
        pixel.0 = shift_hsv(pixel.0, hue, saturation, light);
    }
}

fn check_bounds(image: &RgbImage, rect: Rect) -> Result<()> {
    if rect.fits_within(image.width(), image.height()) {
        Ok(())
    } else {
        Err(OperationError::OutOfRange {
            rect,
            width: image.width(),
            height: image.height(),
        })
    }
}

/// Brighten only the samples inside `rect`.
///
/// Fails without touching the buffer if `rect` is not fully inside it.
pub fn brighten_region(image: &mut RgbImage, rect: Rect, delta: i32) -> Result<()> {
    check_bounds(image, rect)?;
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            let pixel = image.get_pixel_mut(x as u32, y as u32);
            pixel.0 = pixel.0.map(|s| saturating_shift(s, delta));
        }
    }
    Ok(())
}

/// Build a binary mask: 255 inside `rect`, 0 elsewhere.
pub fn rect_mask(width: u32, height: u32, rect: Rect) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        Luma([if rect.contains(x, y) { 255 } else { 0 }])
    })
}

/// Replace the contents of `rect` by inpainting from its surroundings.
pub fn remove_region(
    backend: &impl ImageBackend,
    image: &mut RgbImage,
    rect: Rect,
    params: InpaintParams,
) -> Result<()> {
    check_bounds(image, rect)?;
    let mask = rect_mask(image.width(), image.height(), rect);
    *image = backend.inpaint(image, &mask, params)?;
    Ok(())
}

/// Render `text` onto the image at the fixed overlay position.
pub fn overlay_text(
    backend: &impl ImageBackend,
    image: &mut RgbImage,
    text: &str,
    style: &TextStyle,
) -> Result<()> {
    backend.draw_text(image, text, style)?;
    Ok(())
}

/// Run the backend's fixed-strength denoise over the whole image.
pub fn denoise(
    backend: &impl ImageBackend,
    image: &mut RgbImage,
    params: DenoiseParams,
) -> Result<()> {
    *image = backend.denoise(image, params)?;
    Ok(())
}

/// Sidecar path for an image: the full file name with `.meta` appended.
///
/// ```
/// # use darkroom::imaging::metadata_sidecar_path;
/// # use std::path::{Path, PathBuf};
/// assert_eq!(
///     metadata_sidecar_path(Path::new("shots/dawn.jpg")),
///     PathBuf::from("shots/dawn.jpg.meta")
/// );
/// ```
pub fn metadata_sidecar_path(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_os_string();
    name.push(".meta");
    PathBuf::from(name)
}

/// Sidecar body: one `key=value` line per channel, blue first.
pub fn format_metadata(image: &RgbImage) -> String {
    let [r, g, b] = channel_means(image);
    format!("mean_b={b}\nmean_g={g}\nmean_r={r}\n")
}

/// Write per-channel mean statistics next to the source image.
///
/// Returns the sidecar path. The buffer is only read.
pub fn write_metadata(image: &RgbImage, source: &Path) -> Result<PathBuf> {
    let sidecar = metadata_sidecar_path(source);
    std::fs::write(&sidecar, format_metadata(image))?;
    Ok(sidecar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use image::Rgb;

    fn sample_image() -> RgbImage {
        RgbImage::from_fn(8, 6, |x, y| {
            Rgb([(x * 30) as u8, (y * 40) as u8, ((x + y) * 15) as u8])
        })
    }

    #[test]
    fn brighten_twice_equals_brighten_once_with_sum() {
        for (d1, d2) in [(10, 15), (-20, 5), (100, 100), (-7, -300), (250, -250)] {
            let mut twice = sample_image();
            brighten(&mut twice, d1);
            brighten(&mut twice, d2);

            let mut once = sample_image();
            brighten(&mut once, d1 + d2);

            // Only equal where neither step clamped
            for ((a, b), orig) in twice.iter().zip(once.iter()).zip(sample_image().iter()) {
                let first = i32::from(*orig) + d1;
                if (0..=255).contains(&first) {
                    assert_eq!(a, b, "d1={d1} d2={d2} orig={orig}");
                }
            }
        }
    }

    #[test]
    fn brighten_saturates_instead_of_wrapping() {
        let mut img = RgbImage::from_pixel(2, 2, Rgb([250, 5, 128]));
        brighten(&mut img, 10);
        assert_eq!(img.get_pixel(0, 0).0, [255, 15, 138]);
        brighten(&mut img, -20);
        assert_eq!(img.get_pixel(1, 1).0, [235, 0, 118]);
    }

    #[test]
    fn shift_hsl_inverts_when_nothing_saturates() {
        let original = RgbImage::from_fn(6, 1, |x, _| {
            Rgb(match x {
                0 => [255, 0, 0],
                1 => [0, 255, 0],
                2 => [0, 0, 255],
                3 => [120, 120, 120],
                4 => [255, 255, 0],
                _ => [0, 0, 0],
            })
        });

        let mut img = original.clone();
        shift_hsl(&mut img, 0, 0, -40);
        shift_hsl(&mut img, 0, 0, 40);
        for x in 0..5 {
            assert_eq!(img.get_pixel(x, 0), original.get_pixel(x, 0), "pixel {x}");
        }
        // Black clamped at zero on the way down, so it comes back lighter
        assert_eq!(img.get_pixel(5, 0).0, [40, 40, 40]);

        let mut img = original.clone();
        shift_hsl(&mut img, 30, 0, 0);
        shift_hsl(&mut img, -30, 0, 0);
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 255, 0]);
        assert_eq!(img.get_pixel(2, 0).0, [0, 0, 255]);
    }

    #[test]
    fn shift_hsl_changes_hue() {
        let mut img = RgbImage::from_pixel(1, 1, Rgb([255, 0, 0]));
        shift_hsl(&mut img, 60, 0, 0);
        assert_eq!(img.get_pixel(0, 0).0, [0, 255, 0]);
    }

    #[test]
    fn brighten_region_only_touches_inside() {
        let before = sample_image();
        let mut img = before.clone();
        let rect = Rect::new(2, 1, 3, 2);

        brighten_region(&mut img, rect, 20).unwrap();

        for (x, y, p) in img.enumerate_pixels() {
            let orig = before.get_pixel(x, y).0;
            if rect.contains(x, y) {
                assert_eq!(p.0, orig.map(|s| saturating_shift(s, 20)));
            } else {
                assert_eq!(p.0, orig, "outside pixel {x},{y} changed");
            }
        }
    }

    #[test]
    fn brighten_region_out_of_range_is_rejected_untouched() {
        let before = sample_image();
        let mut img = before.clone();

        let err = brighten_region(&mut img, Rect::new(6, 0, 5, 2), 20).unwrap_err();
        assert!(matches!(
            err,
            OperationError::OutOfRange {
                width: 8,
                height: 6,
                ..
            }
        ));
        assert_eq!(img, before);
    }

    #[test]
    fn rect_mask_marks_exactly_the_rectangle() {
        let mask = rect_mask(5, 5, Rect::new(1, 1, 2, 3));
        let count = mask.pixels().filter(|p| p.0[0] == 255).count();
        assert_eq!(count, 6);
        assert_eq!(mask.get_pixel(0, 0).0[0], 0);
        assert_eq!(mask.get_pixel(2, 3).0[0], 255);
    }

    #[test]
    fn remove_region_passes_mask_to_backend() {
        let backend = MockBackend::new();
        let mut img = sample_image();

        remove_region(&backend, &mut img, Rect::new(0, 0, 2, 2), InpaintParams::default())
            .unwrap();

        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Inpaint {
                masked: 4,
                radius: 3
            }]
        );
        assert_eq!(img.get_pixel(1, 1).0, [0, 0, 0]);
    }

    #[test]
    fn remove_region_out_of_range_skips_backend() {
        let backend = MockBackend::new();
        let mut img = sample_image();

        let result = remove_region(
            &backend,
            &mut img,
            Rect::new(-1, 0, 2, 2),
            InpaintParams::default(),
        );
        assert!(matches!(result, Err(OperationError::OutOfRange { .. })));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn overlay_and_denoise_delegate_to_backend() {
        let backend = MockBackend::new();
        let mut img = sample_image();

        overlay_text(&backend, &mut img, "caption", &TextStyle::default()).unwrap();
        denoise(&backend, &mut img, DenoiseParams { radius: 2 }).unwrap();

        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::DrawText("caption".to_string()),
                RecordedOp::Denoise { radius: 2 },
            ]
        );
    }

    #[test]
    fn metadata_lines_are_blue_green_red() {
        let img = RgbImage::from_pixel(3, 3, Rgb([10, 20, 30]));
        assert_eq!(format_metadata(&img), "mean_b=30\nmean_g=20\nmean_r=10\n");
    }

    #[test]
    fn write_metadata_creates_sidecar_next_to_source() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("dawn.jpg");
        let img = RgbImage::from_pixel(2, 2, Rgb([1, 2, 3]));

        let sidecar = write_metadata(&img, &source).unwrap();

        assert_eq!(sidecar, tmp.path().join("dawn.jpg.meta"));
        let content = std::fs::read_to_string(sidecar).unwrap();
        assert!(content.contains("mean_r=1"));
        assert!(content.contains("mean_b=3"));
    }
}
