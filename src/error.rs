//! # Error Types
//!
//! This module defines error types used throughout the periprint library.

use thiserror::Error;

/// Main error type for periprint operations
#[derive(Debug, Error)]
pub enum PeriprintError {
    /// An operation needed a printer but none has been chosen yet
    #[error("No device selected")]
    DeviceNotSelected,

    /// The printer service or its writable characteristic is missing
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// A frame could not be delivered after every retry
    #[error("Transport error after {attempts} attempt(s): {message}")]
    Transport { attempts: u32, message: String },

    /// Drawing surface could not be created or drawn on
    #[error("Render error: {0}")]
    Render(String),

    /// Dimensions do not fit the printer's command encoding
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Text measurement is unavailable
    #[error("Layout error: {0}")]
    Layout(String),

    /// Invalid settings
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PNG encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Settings file could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PeriprintError {
    /// Build a single-attempt transport error, the shape channel
    /// implementations report a failed write in.
    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::Transport {
            attempts: 1,
            message: message.into(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, PeriprintError>;
