//! # Floyd–Steinberg Error Diffusion
//!
//! Converts the anti-aliased text surface into pure black and white before
//! it is packed for the printer.
//!
//! ## Algorithm
//!
//! Pixels are visited row by row, left to right. Each one is snapped to
//! black or white and the difference (the quantization error) is pushed onto
//! neighbours that have not been visited yet:
//!
//! ```text
//!            ┌───────┬───────┐
//!            │   *   │ 7/16  │
//!    ┌───────┼───────┼───────┤
//!    │ 3/16  │ 5/16  │ 1/16  │
//!    └───────┴───────┴───────┘
//! ```
//!
//! Neighbours off the edge of the image are skipped; error never wraps to
//! the opposite side.
//!
//! ## Luminance
//!
//! The surface is drawn strictly in black on white, so R = G = B and the red
//! channel alone is used as luminance. Values below [`THRESHOLD`] become
//! black (0), everything else white (255).
//!
//! ## Usage Example
//!
//! ```
//! use image::{Rgba, RgbaImage};
//! use periprint::render::dither;
//!
//! let gray = RgbaImage::from_pixel(8, 8, Rgba([128, 128, 128, 255]));
//! let mono = dither::dithered(&gray);
//!
//! assert!(mono.pixels().all(|p| p[0] == 0 || p[0] == 255));
//! ```

use image::RgbaImage;

/// Cut-off between black and white on the 0-255 scale.
pub const THRESHOLD: f32 = 128.0;

/// Dither `image` in place. Alpha is left untouched; R, G and B are set to
/// the same 0 or 255 value.
pub fn dither(image: &mut RgbaImage) {
    let width = image.width() as usize;
    let height = image.height() as usize;

    // Signed working buffer so accumulated error is not clamped mid-pass
    let mut lum: Vec<f32> = image.pixels().map(|p| p[0] as f32).collect();

    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let old = lum[i];
            let new = if old < THRESHOLD { 0.0 } else { 255.0 };
            let error = old - new;
            lum[i] = new;

            if x + 1 < width {
                lum[i + 1] += error * 7.0 / 16.0;
            }
            if y + 1 < height {
                let below = i + width;
                if x > 0 {
                    lum[below - 1] += error * 3.0 / 16.0;
                }
                lum[below] += error * 5.0 / 16.0;
                if x + 1 < width {
                    lum[below + 1] += error * 1.0 / 16.0;
                }
            }
        }
    }

    for (pixel, value) in image.pixels_mut().zip(lum) {
        let v = value as u8;
        pixel[0] = v;
        pixel[1] = v;
        pixel[2] = v;
    }
}

/// Dithered copy of `image`.
pub fn dithered(image: &RgbaImage) -> RgbaImage {
    let mut out = image.clone();
    dither(&mut out);
    out
}

// ============================================================================
// TESTS
// ============================================================================
