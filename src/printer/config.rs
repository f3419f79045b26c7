//! # Printer Configuration
//!
//! Hardware constants for the supported printer and the user-facing
//! settings file.
//!
//! ## Supported Printers
//!
//! | Model | Width (dots) | Width (bytes) | Label ratio |
//! |-------|--------------|---------------|-------------|
//! | PeriPage T02 | 384 | 48 | 0.82 px/mm |
//!
//! ## Usage
//!
//! ```
//! use periprint::printer::PrinterConfig;
//!
//! let config = PrinterConfig::T02;
//! println!("Print width: {} dots ({} bytes)",
//!          config.width_dots,
//!          config.width_bytes);
//! assert_eq!(config.mm_to_dots(90.0), 74);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PeriprintError, Result};
use crate::style::StyleSpec;
use crate::transport::TransportConfig;

/// # Printer Configuration
///
/// Defines the hardware characteristics of a thermal printer.
///
/// ## Physical Properties
///
/// - **width_dots**: Printable width in dots, the raster width of every job
/// - **width_bytes**: Width in bytes (width_dots / 8)
/// - **mm_to_px**: Pixels per millimetre of label height
///
/// ## Label Height
///
/// The label height ratio is not the head's resolution. It is the ratio the
/// vendor app uses when a label length is chosen in millimetres:
///
/// ```text
/// height_px = round(height_mm * 0.82)
///
/// For a 90mm label:
///   90 * 0.82 = 73.8  =>  74 rows
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrinterConfig {
    /// Printer model name
    pub name: &'static str,

    /// Print width in dots (pixels)
    pub width_dots: u32,

    /// Print width in bytes (width_dots / 8)
    pub width_bytes: u32,

    /// Label height pixels per millimetre
    pub mm_to_px: f32,
}

impl PrinterConfig {
    /// # PeriPage T02 Configuration
    ///
    /// Pocket-size Bluetooth LE label and receipt printer.
    ///
    /// | Property | Value |
    /// |----------|-------|
    /// | Print width | 384 dots |
    /// | Interface | Bluetooth LE, service `0xFF00` |
    /// | Write characteristic | `0xFF02`, write without response |
    /// | Packet limit | 512 bytes |
    pub const T02: Self = Self {
        name: "PeriPage T02",
        width_dots: 384,
        width_bytes: 48,
        mm_to_px: 0.82,
    };

    /// Convert a label height in millimetres to pixel rows.
    ///
    /// ```
    /// use periprint::printer::PrinterConfig;
    ///
    /// assert_eq!(PrinterConfig::T02.mm_to_dots(50.0), 41);
    /// ```
    #[inline]
    pub fn mm_to_dots(&self, mm: f32) -> u32 {
        (mm * self.mm_to_px).round().max(0.0) as u32
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::T02
    }
}

// ============================================================================
// SETTINGS
// ============================================================================

/// Settings loaded from a JSON file. Every field is optional.
///
/// ```json
/// {
///   "height_mm": 50,
///   "font_dir": "/usr/share/fonts/truetype/msttcorefonts",
///   "fallback_family": "Arial",
///   "style": { "font_family": "Arial", "bold": true },
///   "transport": { "name_prefix": "T02", "retry_attempts": 5 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Label height in millimetres.
    pub height_mm: f32,
    /// Directory of `.ttf`/`.otf` files, loaded on top of the builtin
    /// DejaVu Sans.
    pub font_dir: Option<PathBuf>,
    /// Family drawn when a style names one that is not loaded.
    pub fallback_family: Option<String>,
    pub style: StyleSpec,
    pub transport: TransportConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            height_mm: 90.0,
            font_dir: None,
            fallback_family: None,
            style: StyleSpec::default(),
            transport: TransportConfig::default(),
        }
    }
}

impl Settings {
    /// Read and validate a settings file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            PeriprintError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let settings: Self = serde_json::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.height_mm.is_finite() && self.height_mm > 0.0) {
            return Err(PeriprintError::Config(format!(
                "height_mm must be positive, got {}",
                self.height_mm
            )));
        }
        self.transport.validate()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_t02_dimensions() {
        let config = PrinterConfig::T02;
        assert_eq!(config.width_dots, 384);
        assert_eq!(config.width_bytes, 48);
        assert_eq!(config.width_dots, config.width_bytes * 8);
    }

    #[test]
    fn test_mm_to_dots() {
        let config = PrinterConfig::T02;
        assert_eq!(config.mm_to_dots(90.0), 74);
        assert_eq!(config.mm_to_dots(0.0), 0);
        assert_eq!(config.mm_to_dots(-5.0), 0);
    }

    #[test]
    fn test_default_is_t02() {
        assert_eq!(PrinterConfig::default(), PrinterConfig::T02);
    }

    #[test]
    fn test_settings_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.height_mm, 90.0);
        assert_eq!(settings.transport.name_prefix, "T02");
        assert_eq!(settings.font_dir, None);
    }

    #[test]
    fn test_settings_partial_override() {
        let json = r#"{"height_mm": 40, "fallback_family": "Arial", "style": {"bold": true}, "transport": {"retry_attempts": 5}}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.fallback_family.as_deref(), Some("Arial"));
        assert_eq!(settings.height_mm, 40.0);
        assert!(settings.style.bold);
        assert_eq!(settings.style.font_family, "Arial");
        assert_eq!(settings.transport.retry_attempts, 5);
        assert_eq!(settings.transport.chunk_size, 512);
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings {
            height_mm: 0.0,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(PeriprintError::Config(_))));

        settings.height_mm = 30.0;
        settings.transport.chunk_size = 4096;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_load() {
        let path = std::env::temp_dir().join(format!("periprint-{}.json", uuid::Uuid::new_v4()));
        let mut file = fs::File::create(&path).unwrap();
        write!(file, r#"{{"font_dir": "/tmp/fonts"}}"#).unwrap();
        drop(file);

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.font_dir, Some(PathBuf::from("/tmp/fonts")));
        assert_eq!(settings.fallback_family, None);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_settings_load_missing_file() {
        let err = Settings::load("/nonexistent/periprint.json").unwrap_err();
        assert!(matches!(err, PeriprintError::Config(_)));
    }

    #[test]
    fn test_settings_load_bad_json() {
        let path = std::env::temp_dir().join(format!("periprint-{}.json", uuid::Uuid::new_v4()));
        fs::write(&path, "{ not json").unwrap();
        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, PeriprintError::Json(_)));
        fs::remove_file(&path).unwrap();
    }
}
