//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what to change on a handle) and the
//! [`backend`](super::backend) (which does the actual pixel work).
//!
//! ## Types
//!
//! - [`Rect`] — Caller-supplied rectangle for region brighten and removal.
//! - [`Quality`] — JPEG encoding quality (1–100, default 95). Clamped on construction.
//! - [`DenoiseParams`] — Fixed-strength median denoise radius.
//! - [`InpaintParams`] — Neighbourhood radius used when filling a masked region.
//! - [`TextStyle`] — Scale and colour of the text overlay.

use std::fmt;

/// An axis-aligned rectangle in pixel coordinates.
///
/// Fields are signed so that values typed at a prompt can be represented
/// as-is and rejected by [`Rect::fits_within`] instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge, or `None` if it overflows.
    pub fn right(&self) -> Option<i64> {
        self.x.checked_add(self.width)
    }

    /// Exclusive bottom edge, or `None` if it overflows.
    pub fn bottom(&self) -> Option<i64> {
        self.y.checked_add(self.height)
    }

    /// True when the rectangle is non-empty and lies entirely inside an
    /// image of the given dimensions.
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.width > 0
            && self.height > 0
            && self
                .right()
                .is_some_and(|right| right <= i64::from(image_width))
            && self
                .bottom()
                .is_some_and(|bottom| bottom <= i64::from(image_height))
    }

    /// Whether pixel `(px, py)` lies inside the rectangle.
    ///
    /// An edge that overflows `i64` lies past every pixel.
    pub fn contains(&self, px: u32, py: u32) -> bool {
        let (px, py) = (i64::from(px), i64::from(py));
        px >= self.x
            && py >= self.y
            && self.right().is_none_or(|right| px < right)
            && self.bottom().is_none_or(|bottom| py < bottom)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Quality setting for JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Median-filter radius for denoising. Radius 1 is a 3x3 window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DenoiseParams {
    pub radius: u32,
}

impl Default for DenoiseParams {
    fn default() -> Self {
        Self { radius: 1 }
    }
}

/// Inpainting neighbourhood radius in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InpaintParams {
    pub radius: u32,
}

impl Default for InpaintParams {
    fn default() -> Self {
        Self { radius: 3 }
    }
}

/// How overlay text is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Glyph height in pixels.
    pub scale: f32,
    pub color: [u8; 3],
    /// Left margin in pixels.
    pub left: i32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            scale: 32.0,
            color: [255, 255, 255],
            left: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_95() {
        assert_eq!(Quality::default().value(), 95);
    }

    #[test]
    fn rect_inside_bounds_fits() {
        assert!(Rect::new(0, 0, 10, 10).fits_within(10, 10));
        assert!(Rect::new(2, 3, 4, 5).fits_within(10, 10));
    }

    #[test]
    fn rect_crossing_edge_does_not_fit() {
        assert!(!Rect::new(5, 0, 6, 1).fits_within(10, 10));
        assert!(!Rect::new(0, 9, 1, 2).fits_within(10, 10));
    }

    #[test]
    fn rect_negative_or_empty_does_not_fit() {
        assert!(!Rect::new(-1, 0, 2, 2).fits_within(10, 10));
        assert!(!Rect::new(0, 0, 0, 2).fits_within(10, 10));
        assert!(!Rect::new(0, 0, 2, -2).fits_within(10, 10));
    }

    #[test]
    fn rect_with_overflowing_edge_does_not_fit() {
        assert!(!Rect::new(i64::MAX, 0, 1, 1).fits_within(10, 10));
        assert!(!Rect::new(0, i64::MAX, 1, 1).fits_within(10, 10));
        assert!(!Rect::new(1, 0, i64::MAX, 1).fits_within(10, 10));
        assert_eq!(Rect::new(i64::MAX, 0, 1, 1).right(), None);
    }

    #[test]
    fn rect_with_overflowing_edge_contains_no_image_pixel() {
        let r = Rect::new(i64::MAX, 0, 1, 1);
        assert!(!r.contains(0, 0));
        assert!(!r.contains(u32::MAX, 0));
    }

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect::new(1, 1, 2, 2);
        assert!(r.contains(1, 1));
        assert!(r.contains(2, 2));
        assert!(!r.contains(3, 2));
        assert!(!r.contains(0, 1));
    }

    #[test]
    fn rect_display() {
        assert_eq!(Rect::new(3, 4, 10, 20).to_string(), "10x20+3+4");
    }

    #[test]
    fn default_params() {
        assert_eq!(DenoiseParams::default().radius, 1);
        assert_eq!(InpaintParams::default().radius, 3);
        assert_eq!(TextStyle::default().color, [255, 255, 255]);
    }
}
