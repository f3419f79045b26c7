//! # Printer Module
//!
//! The printer as a whole: its hardware constants, user settings and the
//! orchestrator that runs a print from text to transmitted frames.
//!
//! ## Modules
//!
//! - [`config`]: Printer hardware specifications and settings file
//! - [`orchestrator`]: Connect, preview, print and feed operations

pub mod config;
pub mod orchestrator;

pub use config::{PrinterConfig, Settings};
pub use orchestrator::{Printer, PrinterState};
