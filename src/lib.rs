//! # Periprint - Thermal Label Printer Library
//!
//! Periprint prints text labels on PeriPage T02 thermal printers over
//! Bluetooth LE. It provides:
//!
//! - **Layout**: Word wrap with automatic font-size fitting
//! - **Dithering**: Floyd–Steinberg error diffusion to 1-bit
//! - **Protocol implementation**: T02 raster command builders
//! - **Transport**: Chunked, paced, retrying writes over BLE
//!
//! ## Quick Start
//!
//! ```no_run
//! # #[cfg(feature = "ble")]
//! # async fn demo() -> periprint::Result<()> {
//! use periprint::{
//!     Printer, StyleSpec, TransportConfig,
//!     raster::{FontBook, GlyphRasterizer},
//!     transport::ble::BleConnector,
//! };
//!
//! let transport = TransportConfig::default();
//! let connector = BleConnector::new(transport.scan_timeout()).await?;
//! let fonts = GlyphRasterizer::new(FontBook::builtin()?);
//!
//! let mut printer = Printer::new(connector, fonts, transport)?;
//! printer.connect().await?;
//! printer
//!     .print_text_mm("Hello world", 90.0, &StyleSpec::default().bold())
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`style`] | Style and font selection |
//! | [`raster`] | Text measurement and drawing |
//! | [`render`] | Layout, dithering, packing and previews |
//! | [`protocol`] | T02 command builders |
//! | [`transport`] | Link session and connectors |
//! | [`printer`] | Printer configuration and orchestrator |
//! | [`error`] | Error types |
//!
//! ## Supported Printers
//!
//! Currently tested with:
//! - PeriPage T02 (384 dots, Bluetooth LE)

pub mod error;
pub mod printer;
pub mod protocol;
pub mod raster;
pub mod render;
pub mod style;
pub mod transport;

// Re-exports for convenience
pub use error::{PeriprintError, Result};
pub use printer::{Printer, PrinterConfig, PrinterState, Settings};
pub use style::StyleSpec;
pub use transport::{Session, TransportConfig};
