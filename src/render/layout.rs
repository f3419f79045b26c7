//! # Text Layout
//!
//! Word-wraps text to the print width and picks a font size.
//!
//! ## Auto-fit
//!
//! Without an explicit size the engine binary-searches integer sizes in
//! `[MIN_FONT_SIZE, min(MAX_FONT_SIZE, max_height)]`. For each candidate it
//! greedily packs words into lines; the candidate is feasible when every
//! word fits the width on its own and `lines * size <= max_height`.
//!
//! Shrinking the font never increases the line count, so feasibility is
//! monotonic in the size and the search keeps the largest feasible one.
//!
//! ## Overflow
//!
//! When nothing is feasible the minimum size is used anyway. A word wider
//! than the print width is then emitted on its own line and allowed to run
//! off the edge, and the block may be taller than `max_height`. Neither is
//! an error.
//!
//! ```
//! # use periprint::raster::Rasterizer;
//! # use periprint::style::{FontSpec, StyleSpec};
//! # use image::RgbaImage;
//! # struct Mono;
//! # impl Rasterizer for Mono {
//! #     fn measure_width(&self, t: &str, f: &FontSpec) -> periprint::Result<f32> {
//! #         Ok(t.chars().count() as f32 * f.size_px as f32 * 0.5)
//! #     }
//! #     fn draw_text(&self, _: &mut RgbaImage, _: &str, _: f32, _: f32, _: &FontSpec)
//! #         -> periprint::Result<()> { Ok(()) }
//! # }
//! use periprint::render::layout::layout;
//!
//! let result = layout(&Mono, "Hi", 384, 70, &StyleSpec::default()).unwrap();
//! assert_eq!(result.lines, vec!["Hi".to_string()]);
//! assert_eq!(result.font_size, 70);
//! ```

use log::debug;

use crate::error::Result;
use crate::raster::Rasterizer;
use crate::style::{FontSpec, MAX_FONT_SIZE, MIN_FONT_SIZE, StyleSpec};

/// Resolved font size and wrapped lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutResult {
    pub font_size: u32,
    pub lines: Vec<String>,
}

/// Paragraphs (split on newlines) of whitespace-separated words.
fn paragraphs(text: &str) -> Vec<Vec<&str>> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n')
        .map(|line| line.split_whitespace().collect())
        .collect()
}

/// Greedy wrap at one font size.
///
/// Returns `None` when a single word is wider than `max_width` and `force`
/// is off. With `force` on, such a word gets a line to itself.
fn wrap<R: Rasterizer + ?Sized>(
    raster: &R,
    paragraphs: &[Vec<&str>],
    font: &FontSpec,
    max_width: f32,
    force: bool,
) -> Result<Option<Vec<String>>> {
    let mut lines = Vec::new();

    for words in paragraphs {
        let mut current = String::new();

        for &word in words {
            if !current.is_empty() {
                let candidate = format!("{} {}", current, word);
                if raster.measure_width(&candidate, font)? <= max_width {
                    current = candidate;
                    continue;
                }
                lines.push(std::mem::take(&mut current));
            }

            if raster.measure_width(word, font)? > max_width {
                if !force {
                    return Ok(None);
                }
                lines.push(word.to_string());
            } else {
                current = word.to_string();
            }
        }

        if !current.is_empty() || words.is_empty() {
            lines.push(current);
        }
    }

    Ok(Some(lines))
}

/// Lay out `text` within `max_width x max_height` pixels.
///
/// Fails only when the rasterizer cannot measure (no font available).
pub fn layout<R: Rasterizer + ?Sized>(
    raster: &R,
    text: &str,
    max_width: u32,
    max_height: u32,
    style: &StyleSpec,
) -> Result<LayoutResult> {
    let paragraphs = paragraphs(text);
    let max_width = max_width as f32;

    if let Some(size) = style.font_size {
        let font_size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        let lines = wrap(raster, &paragraphs, &style.font(font_size), max_width, true)?
            .unwrap_or_default();
        return Ok(LayoutResult { font_size, lines });
    }

    let mut low = MIN_FONT_SIZE;
    let mut high = MAX_FONT_SIZE.min(max_height).max(MIN_FONT_SIZE);
    let mut best: Option<LayoutResult> = None;

    while low <= high {
        let size = (low + high) / 2;
        let fitted = wrap(raster, &paragraphs, &style.font(size), max_width, false)?;

        match fitted {
            Some(lines) if lines.len() as u32 * size <= max_height => {
                best = Some(LayoutResult {
                    font_size: size,
                    lines,
                });
                low = size + 1;
            }
            Some(lines) => {
                debug!("Size {}px too tall: {} lines in {}px", size, lines.len(), max_height);
                high = size - 1;
            }
            None => {
                debug!("Size {}px has a word wider than {}px", size, max_width);
                high = size - 1;
            }
        }
    }

    match best {
        Some(result) => {
            debug!("Fitted {}px: {:?}", result.font_size, result.lines);
            Ok(result)
        }
        None => {
            let font_size = MIN_FONT_SIZE;
            let lines = wrap(raster, &paragraphs, &style.font(font_size), max_width, true)?
                .unwrap_or_default();
            debug!("Nothing fits, overflowing at {}px: {:?}", font_size, lines);
            Ok(LayoutResult { font_size, lines })
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
