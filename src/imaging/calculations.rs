//! Pure per-sample calculations: saturating shifts, 8-bit HSV conversion and
//! channel statistics.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! ## HSV encoding
//!
//! Hue is stored in half-degrees so it fits a byte: `0..=179` covers the full
//! circle, saturation and value use `0..=255`. Hue values above 179 (reachable
//! after a saturating shift) are interpreted modulo 360° on the way back.
//!
//! The byte encoding is lossy. Many distinct RGB triples share one HSV triple
//! (hue alone keeps 180 steps), so `hsv_to_rgb(rgb_to_hsv(p))` is not `p` for
//! most coloured pixels, and a shift followed by its negation does not
//! restore them either. Greys and pure primaries convert exactly.

use image::RgbImage;

/// Add `delta` to a sample, clamping to `0..=255` instead of wrapping.
///
/// ```
/// # use darkroom::imaging::saturating_shift;
/// assert_eq!(saturating_shift(250, 20), 255);
/// assert_eq!(saturating_shift(10, -20), 0);
/// assert_eq!(saturating_shift(100, 20), 120);
/// ```
pub fn saturating_shift(sample: u8, delta: i32) -> u8 {
    (i32::from(sample).saturating_add(delta)).clamp(0, 255) as u8
}

/// Convert an RGB triple to 8-bit HSV (`[h, s, v]`, hue in half-degrees).
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (rf, gf, bf) = (f32::from(r), f32::from(g), f32::from(b));
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = max - min;

    let s = if max > 0.0 { diff * 255.0 / max } else { 0.0 };

    let mut h = if diff == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / diff
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    let half = (h / 2.0).round() as u16;
    [
        if half >= 180 { 0 } else { half as u8 },
        s.round() as u8,
        max as u8,
    ]
}

/// Convert an 8-bit HSV triple back to RGB.
pub fn hsv_to_rgb([h, s, v]: [u8; 3]) -> [u8; 3] {
    let degrees = f32::from(h) * 2.0;
    let s = f32::from(s) / 255.0;
    let v = f32::from(v);

    let sector = degrees / 60.0;
    let floor = sector.floor();
    let f = sector - floor;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match (floor as u32) % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    [to_sample(r), to_sample(g), to_sample(b)]
}

fn to_sample(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Shift each HSV channel of one pixel independently, saturating per channel.
///
/// Each call rounds through the 8-bit HSV encoding, so shifting by `-delta`
/// afterwards only restores pixels that convert exactly (see the module docs).
pub fn shift_hsv(rgb: [u8; 3], hue: i32, saturation: i32, light: i32) -> [u8; 3] {
    let [h, s, v] = rgb_to_hsv(rgb);
    hsv_to_rgb([
        saturating_shift(h, hue),
        saturating_shift(s, saturation),
        saturating_shift(v, light),
    ])
}

/// Mean sample value per channel, in `[r, g, b]` order.
///
/// Returns zeros for an image with no pixels.
pub fn channel_means(image: &RgbImage) -> [f64; 3] {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return [0.0; 3];
    }

    let mut sums = [0u64; 3];
    for pixel in image.pixels() {
        for (sum, sample) in sums.iter_mut().zip(pixel.0) {
            *sum += u64::from(sample);
        }
    }

    sums.map(|sum| sum as f64 / count as f64)
}
