//! # Bitmap Packing
//!
//! Turns a dithered surface into the T02 raster payload: one bit per pixel,
//! MSB first, rows packed back to back with no per-row byte alignment.
//!
//! ```text
//! pixel index:  0 1 2 3 4 5 6 7 | 8 9 ...
//! byte 0 bit:   7 6 5 4 3 2 1 0 | byte 1 bit 7 ...
//! ```
//!
//! The payload length depends only on the declared dimensions:
//! `ceil(width * height / 8)`.
//!
//! ```
//! use image::{Rgba, RgbaImage};
//! use periprint::render::pack;
//!
//! let mut img = RgbaImage::from_pixel(8, 1, Rgba([255, 255, 255, 255]));
//! img.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
//! img.put_pixel(7, 0, Rgba([0, 0, 0, 255]));
//!
//! assert_eq!(pack::pack(&img), vec![0b1000_0001]);
//! ```

use image::RgbaImage;

/// Packed length for a `width x height` image.
#[inline]
pub fn packed_len(width: u32, height: u32) -> usize {
    (width as usize * height as usize).div_ceil(8)
}

/// Pack `image` into printer raster bytes.
///
/// Only pure black (red channel 0) sets a bit, so run the ditherer first.
pub fn pack(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = vec![0u8; packed_len(image.width(), image.height())];

    for (i, pixel) in image.pixels().enumerate() {
        if pixel[0] == 0 {
            bytes[i / 8] |= 1 << (7 - (i % 8));
        }
    }

    bytes
}

/// Inverse of [`pack`]: `true` for black, row-major, `width * height` long.
pub fn unpack(bytes: &[u8], width: u32, height: u32) -> Vec<bool> {
    (0..width as usize * height as usize)
        .map(|i| {
            bytes
                .get(i / 8)
                .is_some_and(|byte| byte & (1 << (7 - (i % 8))) != 0)
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{BLACK, WHITE};

    #[test]
    fn test_packed_len() {
        assert_eq!(packed_len(384, 74), 3552);
        assert_eq!(packed_len(8, 1), 1);
        assert_eq!(packed_len(3, 3), 2);
        assert_eq!(packed_len(0, 10), 0);
    }

    #[test]
    fn test_all_white_is_zero() {
        let img = RgbaImage::from_pixel(16, 4, WHITE);
        assert_eq!(pack(&img), vec![0u8; 8]);
    }

    #[test]
    fn test_all_black_is_ones() {
        let img = RgbaImage::from_pixel(16, 4, BLACK);
        assert_eq!(pack(&img), vec![0xFF; 8]);
    }

    #[test]
    fn test_rows_are_not_byte_aligned() {
        // 3x3: row 1 starts at bit 3 of byte 0
        let mut img = RgbaImage::from_pixel(3, 3, WHITE);
        img.put_pixel(0, 1, BLACK);
        img.put_pixel(2, 2, BLACK);
        // indices 3 and 8
        assert_eq!(pack(&img), vec![0b0001_0000, 0b1000_0000]);
    }

    #[test]
    fn test_gray_does_not_set_bits() {
        let img = RgbaImage::from_pixel(8, 1, image::Rgba([1, 1, 1, 255]));
        assert_eq!(pack(&img), vec![0]);
    }

    #[test]
    fn test_unpack_restores_pixels() {
        let mut img = RgbaImage::from_pixel(13, 7, WHITE);
        for (x, y, p) in img.enumerate_pixels_mut() {
            if (x * 7 + y * 5) % 3 == 0 {
                *p = BLACK;
            }
        }
        let bits = unpack(&pack(&img), 13, 7);
        let expected: Vec<bool> = img.pixels().map(|p| p[0] == 0).collect();
        assert_eq!(bits, expected);
    }
}
