//! # Rasterizer
//!
//! The pipeline does not shape or draw glyphs itself. It asks a
//! [`Rasterizer`] to measure strings and draw them onto an owned
//! [`RgbaImage`], then manipulates the pixels directly.
//!
//! - [`glyph`]: TrueType/OpenType rasterizer backed by `ab_glyph`

pub mod glyph;
#[cfg(test)]
pub(crate) mod testing;

use image::{Rgba, RgbaImage};

use crate::error::Result;
use crate::style::FontSpec;

pub use glyph::{FontBook, GlyphRasterizer};

/// Opaque black, the only ink colour the printer has.
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Opaque white (paper).
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Text measurement and drawing capability.
pub trait Rasterizer {
    /// Advance width of `text` in pixels.
    fn measure_width(&self, text: &str, font: &FontSpec) -> Result<f32>;

    /// Distance from the top of a line box to its baseline.
    fn ascent(&self, font: &FontSpec) -> Result<f32> {
        Ok(font.size_px as f32 * 0.8)
    }

    /// Draw `text` in black with its top-left corner at `(x, y)`.
    fn draw_text(
        &self,
        surface: &mut RgbaImage,
        text: &str,
        x: f32,
        y: f32,
        font: &FontSpec,
    ) -> Result<()>;

    /// Draw a 1px black line. Endpoints outside the surface are clipped.
    fn draw_line(&self, surface: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32) {
        // Bresenham
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y) = (x0, y0);
        let mut err = dx + dy;

        loop {
            put_black(surface, x, y);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

/// Set one pixel black, ignoring coordinates off the surface.
pub fn put_black(surface: &mut RgbaImage, x: i32, y: i32) {
    if x >= 0 && y >= 0 && (x as u32) < surface.width() && (y as u32) < surface.height() {
        surface.put_pixel(x as u32, y as u32, BLACK);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LineOnly;

    impl Rasterizer for LineOnly {
        fn measure_width(&self, _text: &str, _font: &FontSpec) -> Result<f32> {
            Ok(0.0)
        }

        fn draw_text(
            &self,
            _surface: &mut RgbaImage,
            _text: &str,
            _x: f32,
            _y: f32,
            _font: &FontSpec,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_horizontal_line() {
        let mut img = RgbaImage::from_pixel(10, 3, WHITE);
        LineOnly.draw_line(&mut img, 2, 1, 6, 1);
        for x in 0..10 {
            let expected = if (2..=6).contains(&x) { BLACK } else { WHITE };
            assert_eq!(*img.get_pixel(x, 1), expected, "x = {}", x);
        }
        assert!(img.rows().next().unwrap().all(|p| *p == WHITE));
    }

    #[test]
    fn test_line_is_clipped() {
        let mut img = RgbaImage::from_pixel(4, 4, WHITE);
        LineOnly.draw_line(&mut img, -5, 2, 10, 2);
        assert!((0..4).all(|x| *img.get_pixel(x, 2) == BLACK));
    }

    #[test]
    fn test_diagonal_line_endpoints() {
        let mut img = RgbaImage::from_pixel(5, 5, WHITE);
        LineOnly.draw_line(&mut img, 0, 0, 4, 4);
        for i in 0..5 {
            assert_eq!(*img.get_pixel(i, i), BLACK);
        }
    }
}
