//! # T02 Protocol Implementation
//!
//! Byte-level command builders for PeriPage T02-class printers. Everything
//! here is a pure function of width and height; nothing performs I/O.
//!
//! ## Module Structure
//!
//! - [`commands`]: Init, job start, padding, feed
//! - [`graphics`]: Raster header and the full image frame sequence
//!
//! ## Usage Example
//!
//! ```
//! use periprint::protocol::{commands, graphics};
//!
//! // A 384 x 8 all-black strip
//! let bitmap = vec![0xFF; 48 * 8];
//!
//! let mut frames = vec![commands::init()];
//! frames.extend(graphics::print_job(384, 8, bitmap).unwrap());
//!
//! assert_eq!(frames.first().unwrap(), &vec![0x1B, 0x40]);
//! assert_eq!(frames.last().unwrap(), &vec![0x1B, 0x64, 0x01]);
//! ```

pub mod commands;
pub mod graphics;
