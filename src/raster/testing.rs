//! Deterministic rasterizer for unit tests.

use image::RgbaImage;

use super::{Rasterizer, put_black};
use crate::error::Result;
use crate::style::FontSpec;

/// Every character advances `size * ratio` pixels. Non-space glyphs are
/// drawn as solid blocks covering the upper 70% of the line box.
pub struct FixedAdvance {
    pub ratio: f32,
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self { ratio: 0.5 }
    }
}

impl Rasterizer for FixedAdvance {
    fn measure_width(&self, text: &str, font: &FontSpec) -> Result<f32> {
        Ok(text.chars().count() as f32 * font.size_px as f32 * self.ratio)
    }

    fn draw_text(
        &self,
        surface: &mut RgbaImage,
        text: &str,
        x: f32,
        y: f32,
        font: &FontSpec,
    ) -> Result<()> {
        let advance = font.size_px as f32 * self.ratio;
        let glyph_height = (font.size_px as f32 * 0.7) as i32;
        for (n, ch) in text.chars().enumerate() {
            if ch == ' ' {
                continue;
            }
            let left = (x + n as f32 * advance) as i32;
            for gy in 0..glyph_height {
                for gx in 0..(advance as i32 - 1).max(1) {
                    put_black(surface, left + gx, y as i32 + gy);
                }
            }
        }
        Ok(())
    }
}
