//! # Raster Graphics Commands
//!
//! The T02 prints images in ESC/POS raster mode (`GS v 0`). The header is
//! sent as its own frame, followed by the packed bitmap as a second frame.
//!
//! ## Bit Packing
//!
//! Graphics data is packed as bytes where each bit represents one dot:
//! - Bit 7 (MSB) = leftmost dot
//! - Bit 0 (LSB) = rightmost dot
//! - 1 = black (print), 0 = white (no print)
//!
//! ```text
//! Byte value 0xF0 = 11110000 = ████░░░░
//! Byte value 0xAA = 10101010 = █░█░█░█░
//! ```
//!
//! ## T02 Specifications
//!
//! | Property | Value |
//! |----------|-------|
//! | Print width | 384 dots (48 bytes) |
//! | Max height per job | 65535 rows |

use super::commands::{self, GS, u16_le};
use crate::error::{PeriprintError, Result};

/// `GS v 0 m` with `m = 0` (normal density).
pub const BITMAP_MODE: [u8; 4] = [GS, b'v', b'0', 0x00];

/// # Raster Bit Image Header (GS v 0 m xL xH yL yH)
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | GS v 0 m xL xH yL yH |
/// | Hex     | 1D 76 30 00 xL xH yL yH |
///
/// ## Parameters
///
/// - `xL, xH`: Width in bytes. The T02 is 48 bytes wide, so `xH` is
///   always 0.
/// - `yL, yH`: Height in rows, little-endian.
///
/// ## Errors
///
/// [`PeriprintError::Protocol`] when the height exceeds 16 bits or the width
/// exceeds 255 bytes.
///
/// ```
/// use periprint::protocol::graphics;
///
/// let header = graphics::bitmap_header(384, 74).unwrap();
/// assert_eq!(header, vec![0x1D, 0x76, 0x30, 0x00, 48, 0x00, 74, 0x00]);
///
/// assert!(graphics::bitmap_header(384, 70_000).is_err());
/// ```
pub fn bitmap_header(width_dots: u32, height: u32) -> Result<Vec<u8>> {
    let width_bytes = u8::try_from(width_dots.div_ceil(8)).map_err(|_| {
        PeriprintError::Protocol(format!("Width {} dots does not fit one byte", width_dots))
    })?;
    let height = u16::try_from(height).map_err(|_| {
        PeriprintError::Protocol(format!("Height {} rows exceeds 65535", height))
    })?;
    let [yl, yh] = u16_le(height);

    let mut cmd = Vec::with_capacity(8);
    cmd.extend_from_slice(&BITMAP_MODE);
    cmd.push(width_bytes);
    cmd.push(0x00);
    cmd.push(yl);
    cmd.push(yh);
    Ok(cmd)
}

/// The full frame sequence for one image, in transmission order:
///
/// 1. `START_PRINT`
/// 2. `PADDING`
/// 3. raster header
/// 4. packed bitmap
/// 5. `FEED_PAPER`
///
/// `INIT` is not included; the transport session owns it.
///
/// ```
/// use periprint::protocol::graphics;
///
/// let bitmap = vec![0u8; 48 * 10];
/// let frames = graphics::print_job(384, 10, bitmap).unwrap();
/// assert_eq!(frames.len(), 5);
/// assert_eq!(frames[3].len(), 480);
/// ```
pub fn print_job(width_dots: u32, height: u32, bitmap: Vec<u8>) -> Result<Vec<Vec<u8>>> {
    let expected = (width_dots as usize * height as usize).div_ceil(8);
    if bitmap.len() != expected {
        return Err(PeriprintError::Protocol(format!(
            "Bitmap is {} bytes, expected {} for {}x{}",
            bitmap.len(),
            expected,
            width_dots,
            height
        )));
    }

    Ok(vec![
        commands::start_print(),
        commands::padding(),
        bitmap_header(width_dots, height)?,
        bitmap,
        commands::feed_paper(),
    ])
}
