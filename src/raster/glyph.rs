//! TTF/OTF text rasterizer built on `ab_glyph`.
//!
//! Fonts live in a [`FontBook`], keyed by family name. DejaVu Sans regular
//! and bold are compiled in ([`FontBook::builtin`]); more families can be
//! loaded from a directory at runtime. File names follow the usual
//! `Family-Style.ttf` convention (`Arial-Bold.ttf`, `Arial-BoldItalic.ttf`,
//! ...). A bold request against a family with no bold face is drawn with a
//! one-pixel synthetic smear, the way browsers fake bold.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont};
use image::RgbaImage;
use log::debug;

use super::Rasterizer;
use crate::error::{PeriprintError, Result};
use crate::style::FontSpec;

/// The four faces a family can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Regular = 0,
    Bold = 1,
    Italic = 2,
    BoldItalic = 3,
}

impl Face {
    fn of(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => Face::Regular,
            (true, false) => Face::Bold,
            (false, true) => Face::Italic,
            (true, true) => Face::BoldItalic,
        }
    }

    fn is_bold(self) -> bool {
        matches!(self, Face::Bold | Face::BoldItalic)
    }

    /// Faces to try, best match first.
    fn fallbacks(self) -> [Face; 4] {
        match self {
            Face::Regular => [Face::Regular, Face::Italic, Face::Bold, Face::BoldItalic],
            Face::Bold => [Face::Bold, Face::Regular, Face::BoldItalic, Face::Italic],
            Face::Italic => [Face::Italic, Face::Regular, Face::BoldItalic, Face::Bold],
            Face::BoldItalic => [Face::BoldItalic, Face::Bold, Face::Italic, Face::Regular],
        }
    }
}

/// Split `Arial-BoldItalic` into its family and face.
pub fn parse_font_name(stem: &str) -> (String, Face) {
    let Some((family, style)) = stem.rsplit_once('-') else {
        return (stem.to_string(), Face::Regular);
    };
    let face = match style.to_lowercase().as_str() {
        "bold" => Face::Bold,
        "italic" | "oblique" => Face::Italic,
        "bolditalic" | "boldoblique" => Face::BoldItalic,
        "regular" | "book" | "roman" => Face::Regular,
        // Not a style suffix, so the dash is part of the family name
        _ => return (stem.to_string(), Face::Regular),
    };
    (family.to_string(), face)
}

/// Family name of the fonts compiled into the binary.
pub const BUILTIN_FAMILY: &str = "DejaVuSans";

const DEJAVU_SANS: &[u8] = include_bytes!("fonts/DejaVuSans.ttf");
const DEJAVU_SANS_BOLD: &[u8] = include_bytes!("fonts/DejaVuSans-Bold.ttf");

/// Loaded font families.
///
/// A style naming a family that is not loaded is drawn with the fallback
/// family. Unless one is chosen with
/// [`set_fallback_family`](Self::set_fallback_family), the fallback is the
/// family with a regular face and the most faces loaded, ties broken by name.
#[derive(Default)]
pub struct FontBook {
    families: HashMap<String, [Option<FontArc>; 4]>,
    fallback: Option<String>,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// DejaVu Sans regular and bold, embedded at build time.
    pub fn builtin() -> Result<Self> {
        let mut book = Self::new();
        for (face, bytes) in [(Face::Regular, DEJAVU_SANS), (Face::Bold, DEJAVU_SANS_BOLD)] {
            let font = FontArc::try_from_slice(bytes).map_err(|e| {
                PeriprintError::Layout(format!("Invalid builtin font: {}", e))
            })?;
            book.insert_font(BUILTIN_FAMILY, face, font);
        }
        Ok(book)
    }

    /// Load every `.ttf`/`.otf` file in `dir` (not recursive).
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let mut book = Self::new();
        book.add_dir(dir)?;
        Ok(book)
    }

    /// Add the fonts in `dir` to this book. Faces already loaded under the
    /// same family are replaced. Returns the number of files loaded.
    pub fn add_dir<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize> {
        let dir = dir.as_ref();
        let mut entries: Vec<_> = fs::read_dir(dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
            })
            .collect();
        entries.sort();

        let mut loaded = 0;
        for path in entries {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let (family, face) = parse_font_name(stem);
            let bytes = fs::read(&path)?;
            self.insert(&family, face, bytes)?;
            debug!("Loaded font {} ({:?}) from {}", family, face, path.display());
            loaded += 1;
        }

        Ok(loaded)
    }

    /// Register raw font bytes as one face of `family`.
    pub fn insert(&mut self, family: &str, face: Face, bytes: Vec<u8>) -> Result<()> {
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| PeriprintError::Layout(format!("Invalid font for {}: {}", family, e)))?;
        self.insert_font(family, face, font);
        Ok(())
    }

    fn insert_font(&mut self, family: &str, face: Face, font: FontArc) {
        self.families.entry(family.to_lowercase()).or_default()[face as usize] = Some(font);
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Family names, lowercased and sorted.
    pub fn families(&self) -> Vec<String> {
        let mut names: Vec<String> = self.families.keys().cloned().collect();
        names.sort();
        names
    }

    /// Use `family` for styles naming a family that is not loaded.
    pub fn set_fallback_family(&mut self, family: &str) -> Result<()> {
        let key = family.to_lowercase();
        if !self.families.contains_key(&key) {
            return Err(PeriprintError::Layout(format!(
                "Fallback family {} is not loaded",
                family
            )));
        }
        self.fallback = Some(key);
        Ok(())
    }

    /// The family unknown names resolve to, lowercased.
    pub fn fallback_family(&self) -> Option<&str> {
        if let Some(name) = &self.fallback {
            return Some(name.as_str());
        }
        let rank = |faces: &[Option<FontArc>; 4]| {
            (
                faces[Face::Regular as usize].is_some(),
                faces.iter().flatten().count(),
            )
        };
        self.families
            .iter()
            .max_by(|(a_name, a), (b_name, b)| {
                rank(*a).cmp(&rank(*b)).then_with(|| b_name.cmp(a_name))
            })
            .map(|(name, _)| name.as_str())
    }

    /// Pick a face for `spec`. Returns the font and whether bold must be
    /// faked.
    fn resolve(&self, spec: &FontSpec) -> Result<(&FontArc, bool)> {
        let faces = self
            .families
            .get(&spec.family.to_lowercase())
            .or_else(|| {
                self.fallback_family()
                    .and_then(|name| self.families.get(name))
            })
            .ok_or_else(|| PeriprintError::Layout("No fonts loaded".to_string()))?;

        let wanted = Face::of(spec.bold, spec.italic);
        for face in wanted.fallbacks() {
            if let Some(font) = &faces[face as usize] {
                return Ok((font, spec.bold && !face.is_bold()));
            }
        }
        Err(PeriprintError::Layout(format!(
            "Family {} has no faces",
            spec.family
        )))
    }
}

/// Convert a CSS-style pixel size (em height) into an `ab_glyph` scale.
fn px_scale(font: &FontArc, size_px: u32) -> PxScale {
    let units_per_em = font.units_per_em().unwrap_or(1000.0);
    PxScale::from(size_px as f32 * font.height_unscaled() / units_per_em)
}

/// Glyph ids with their x offsets, and the total advance.
fn layout_glyphs(font: &FontArc, scale: PxScale, text: &str) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(scale);
    let mut glyphs = Vec::with_capacity(text.len());
    let mut caret = 0.0f32;
    let mut previous: Option<GlyphId> = None;

    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        glyphs.push((id, caret));
        caret += scaled.h_advance(id);
        previous = Some(id);
    }

    (glyphs, caret)
}

/// [`Rasterizer`] over a [`FontBook`].
pub struct GlyphRasterizer {
    book: FontBook,
}

impl GlyphRasterizer {
    pub fn new(book: FontBook) -> Self {
        Self { book }
    }

    pub fn book(&self) -> &FontBook {
        &self.book
    }

    fn draw_pass(
        surface: &mut RgbaImage,
        font: &FontArc,
        scale: PxScale,
        text: &str,
        x: f32,
        baseline: f32,
    ) {
        let (glyphs, _) = layout_glyphs(font, scale, text);
        let (width, height) = (surface.width() as i32, surface.height() as i32);

        for (id, offset) in glyphs {
            let glyph = id.with_scale_and_position(scale, ab_glyph::point(x + offset, baseline));
            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = gx as i32 + bounds.min.x as i32;
                let py = gy as i32 + bounds.min.y as i32;
                if px < 0 || py < 0 || px >= width || py >= height {
                    return;
                }
                let pixel = surface.get_pixel_mut(px as u32, py as u32);
                let keep = 1.0 - coverage.clamp(0.0, 1.0);
                for channel in &mut pixel.0[..3] {
                    *channel = (*channel as f32 * keep).round() as u8;
                }
                pixel.0[3] = 255;
            });
        }
    }
}

impl Rasterizer for GlyphRasterizer {
    fn measure_width(&self, text: &str, font: &FontSpec) -> Result<f32> {
        let (face, fake_bold) = self.book.resolve(font)?;
        let (_, width) = layout_glyphs(face, px_scale(face, font.size_px), text);
        if fake_bold && !text.is_empty() {
            return Ok(width + 1.0);
        }
        Ok(width)
    }

    fn ascent(&self, font: &FontSpec) -> Result<f32> {
        let (face, _) = self.book.resolve(font)?;
        Ok(face.as_scaled(px_scale(face, font.size_px)).ascent())
    }

    fn draw_text(
        &self,
        surface: &mut RgbaImage,
        text: &str,
        x: f32,
        y: f32,
        font: &FontSpec,
    ) -> Result<()> {
        let (face, fake_bold) = self.book.resolve(font)?;
        let scale = px_scale(face, font.size_px);
        let baseline = y + face.as_scaled(scale).ascent();

        Self::draw_pass(surface, face, scale, text, x, baseline);
        if fake_bold {
            Self::draw_pass(surface, face, scale, text, x + 1.0, baseline);
        }
        Ok(())
    }
}
