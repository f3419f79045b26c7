//! # Text Style
//!
//! [`StyleSpec`] is the per-request style a caller asks for. [`FontSpec`] is
//! what the renderer hands to the rasterizer once the font size is resolved.
//!
//! ```
//! use periprint::style::StyleSpec;
//!
//! let base = StyleSpec::default();
//! let loud = base.clone().bold().underline().size(48);
//!
//! assert!(!base.bold);
//! assert!(loud.bold && loud.underline);
//! assert_eq!(loud.font_size, Some(48));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Family used when the caller does not name one.
pub const DEFAULT_FAMILY: &str = "Arial";

/// Smallest font size the layout engine will pick.
pub const MIN_FONT_SIZE: u32 = 8;

/// Largest font size the layout engine will pick.
pub const MAX_FONT_SIZE: u32 = 200;

/// Style attributes for one print or preview request.
///
/// Values are immutable once built; the builder methods consume and return
/// a new value rather than mutating shared state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSpec {
    pub font_family: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Explicit size in pixels. `None` means auto-fit to the print area.
    pub font_size: Option<u32>,
}

impl Default for StyleSpec {
    fn default() -> Self {
        Self {
            font_family: DEFAULT_FAMILY.to_string(),
            bold: false,
            italic: false,
            underline: false,
            font_size: None,
        }
    }
}

impl StyleSpec {
    pub fn family(self, family: impl Into<String>) -> Self {
        Self {
            font_family: family.into(),
            ..self
        }
    }

    pub fn bold(self) -> Self {
        Self { bold: true, ..self }
    }

    pub fn italic(self) -> Self {
        Self {
            italic: true,
            ..self
        }
    }

    pub fn underline(self) -> Self {
        Self {
            underline: true,
            ..self
        }
    }

    /// Fix the font size instead of auto-fitting.
    pub fn size(self, px: u32) -> Self {
        Self {
            font_size: Some(px),
            ..self
        }
    }

    /// Resolve this style at a concrete pixel size.
    pub fn font(&self, size_px: u32) -> FontSpec {
        FontSpec {
            family: self.font_family.clone(),
            size_px,
            bold: self.bold,
            italic: self.italic,
        }
    }
}

/// A fully resolved font selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontSpec {
    pub family: String,
    pub size_px: u32,
    pub bold: bool,
    pub italic: bool,
}

/// CSS-like shorthand, e.g. `italic bold 24px Arial`.
impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.italic {
            write!(f, "italic ")?;
        }
        if self.bold {
            write!(f, "bold ")?;
        }
        write!(f, "{}px {}", self.size_px, self.family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style_auto_fits() {
        let style = StyleSpec::default();
        assert_eq!(style.font_family, "Arial");
        assert_eq!(style.font_size, None);
        assert!(!style.bold && !style.italic && !style.underline);
    }

    #[test]
    fn test_builders_do_not_touch_original() {
        let base = StyleSpec::default();
        let derived = base.clone().family("Courier").italic();
        assert_eq!(base.font_family, "Arial");
        assert_eq!(derived.font_family, "Courier");
        assert!(derived.italic);
    }

    #[test]
    fn test_font_display() {
        let font = StyleSpec::default().bold().italic().font(24);
        assert_eq!(font.to_string(), "italic bold 24px Arial");
        assert_eq!(StyleSpec::default().font(8).to_string(), "8px Arial");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let style: StyleSpec = serde_json::from_str(r#"{"bold": true}"#).unwrap();
        assert!(style.bold);
        assert_eq!(style.font_family, DEFAULT_FAMILY);
        assert_eq!(style.font_size, None);
    }
}
