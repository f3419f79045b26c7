//! # Rendering Module
//!
//! Turns text into a printable surface.
//!
//! ## Modules
//!
//! - [`layout`]: Word wrap and font-size search
//! - [`dither`]: Floyd–Steinberg error diffusion to 1-bit
//! - [`pack`]: 1-bit surface to printer raster bytes
//! - [`preview`]: PNG encoding for previews
//!
//! ## Surface Layout
//!
//! ```text
//! row 0      ████████████████████████████████  ┐ cut guide
//! row 1      ████████████████████████████████  ┘
//!            ...
//!                      centred lines            interior (height - 4)
//!            ...
//! row h-2    ████████████████████████████████  ┐ cut guide
//! row h-1    ████████████████████████████████  ┘
//! ```
//!
//! The guide bars are written after dithering so error diffusion never
//! disturbs them.

pub mod dither;
pub mod layout;
pub mod pack;
pub mod preview;

use image::RgbaImage;
use log::debug;

use crate::error::{PeriprintError, Result};
use crate::raster::{BLACK, Rasterizer, WHITE};
use crate::style::StyleSpec;

pub use layout::LayoutResult;
pub use preview::Preview;

/// Thickness of each cut-guide bar in rows.
pub const CUT_GUIDE_ROWS: u32 = 2;

/// Gap between a line's baseline and its underline stroke.
pub const UNDERLINE_OFFSET: f32 = 3.0;

/// A rendered surface and the layout used to draw it.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub image: RgbaImage,
    pub layout: LayoutResult,
}

/// Render `text` onto a fresh `width x height` surface.
///
/// With `dither` off the anti-aliased grays are kept, which is what
/// previews want. The cut guides are drawn in both cases.
pub fn render_text<R: Rasterizer + ?Sized>(
    raster: &R,
    text: &str,
    width: u32,
    height: u32,
    style: &StyleSpec,
    dither: bool,
) -> Result<Rendered> {
    if width == 0 || height == 0 {
        return Err(PeriprintError::Render(format!(
            "Cannot create a {}x{} surface",
            width, height
        )));
    }

    let mut image = RgbaImage::from_pixel(width, height, WHITE);
    let interior = height.saturating_sub(2 * CUT_GUIDE_ROWS);
    let layout = layout::layout(raster, text, width, interior, style)?;
    let font = style.font(layout.font_size);

    let block = layout.lines.len() as i64 * layout.font_size as i64;
    let start_y = CUT_GUIDE_ROWS as i64 + (interior as i64 - block).div_euclid(2);
    debug!(
        "Rendering {} line(s) at {} from y={}",
        layout.lines.len(),
        font,
        start_y
    );

    let ascent = if style.underline {
        raster.ascent(&font)?
    } else {
        0.0
    };

    let mut y = start_y as f32;
    for line in &layout.lines {
        let line_width = raster.measure_width(line, &font)?;
        let x = (width as f32 - line_width) / 2.0;
        raster.draw_text(&mut image, line, x, y, &font)?;

        if style.underline && line_width > 0.0 {
            let stroke_y = (y + ascent + UNDERLINE_OFFSET).round() as i32;
            let x0 = x.round() as i32;
            let x1 = (x + line_width).round() as i32 - 1;
            raster.draw_line(&mut image, x0, stroke_y, x1, stroke_y);
        }

        y += layout.font_size as f32;
    }

    if dither {
        dither::dither(&mut image);
    }
    draw_cut_guides(&mut image);

    Ok(Rendered { image, layout })
}

/// Force the top and bottom [`CUT_GUIDE_ROWS`] rows to opaque black.
pub fn draw_cut_guides(image: &mut RgbaImage) {
    let height = image.height();
    let rows = (0..CUT_GUIDE_ROWS).chain(height.saturating_sub(CUT_GUIDE_ROWS)..height);
    for y in rows.filter(|&y| y < height) {
        for x in 0..image.width() {
            image.put_pixel(x, y, BLACK);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::testing::FixedAdvance;

    fn row_is(image: &RgbaImage, y: u32, pixel: image::Rgba<u8>) -> bool {
        (0..image.width()).all(|x| *image.get_pixel(x, y) == pixel)
    }

    #[test]
    fn test_surface_dimensions() {
        let out = render_text(&FixedAdvance::default(), "Hi", 384, 74, &StyleSpec::default(), true)
            .unwrap();
        assert_eq!(out.image.dimensions(), (384, 74));
        assert_eq!(out.layout.lines, vec!["Hi"]);
        assert_eq!(out.layout.font_size, 70);
    }

    #[test]
    fn test_cut_guides_present() {
        for dither in [false, true] {
            let out =
                render_text(&FixedAdvance::default(), "Hi", 384, 74, &StyleSpec::default(), dither)
                    .unwrap();
            for y in [0, 1, 72, 73] {
                assert!(row_is(&out.image, y, BLACK), "row {} (dither {})", y, dither);
            }
        }
    }

    #[test]
    fn test_cut_guides_on_empty_text() {
        let out = render_text(&FixedAdvance::default(), "", 384, 20, &StyleSpec::default(), true)
            .unwrap();
        assert!(row_is(&out.image, 0, BLACK));
        assert!(row_is(&out.image, 19, BLACK));
        assert!((2..18).all(|y| row_is(&out.image, y, WHITE)));
    }

    #[test]
    fn test_tiny_heights_are_all_guide() {
        let raster = FixedAdvance::default();
        for height in 1..=4 {
            let out = render_text(&raster, "x", 16, height, &StyleSpec::default(), true).unwrap();
            assert!((0..height).all(|y| row_is(&out.image, y, BLACK)));
        }
    }

    #[test]
    fn test_zero_height_is_render_error() {
        let err = render_text(&FixedAdvance::default(), "Hi", 384, 0, &StyleSpec::default(), true)
            .unwrap_err();
        assert!(matches!(err, PeriprintError::Render(_)));
    }

    #[test]
    fn test_text_is_centred() {
        // "Hi" at 20px is 20 wide: x = (384 - 20) / 2 = 182
        let style = StyleSpec::default().size(20);
        let out = render_text(&FixedAdvance::default(), "Hi", 384, 44, &style, false).unwrap();
        // interior 40, block 20 => top at 2 + 10 = 12
        assert_eq!(out.image.get_pixel(182, 12)[0], 0);
        assert_eq!(out.image.get_pixel(181, 12)[0], 255);
        assert_eq!(out.image.get_pixel(182, 11)[0], 255);
    }

    #[test]
    fn test_underline_drawn_below_baseline() {
        let style = StyleSpec::default().size(20).underline();
        let out = render_text(&FixedAdvance::default(), "Hi", 384, 44, &style, false).unwrap();
        // top 12, default ascent 16, stroke at 12 + 16 + 3 = 31
        assert_eq!(out.image.get_pixel(182, 31)[0], 0);
        assert_eq!(out.image.get_pixel(201, 31)[0], 0);
        assert_eq!(out.image.get_pixel(202, 31)[0], 255);

        let plain = render_text(
            &FixedAdvance::default(),
            "Hi",
            384,
            44,
            &StyleSpec::default().size(20),
            false,
        )
        .unwrap();
        assert_eq!(plain.image.get_pixel(182, 31)[0], 255);
    }

    #[test]
    fn test_dithered_output_is_binary() {
        let out = render_text(
            &FixedAdvance::default(),
            "hello world",
            384,
            60,
            &StyleSpec::default(),
            true,
        )
        .unwrap();
        assert!(out.image.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }
}
