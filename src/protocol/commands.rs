//! # T02 Printer Commands
//!
//! Fixed command sequences understood by PeriPage T02-class printers. The
//! firmware speaks a small ESC/POS subset plus a vendor-specific job
//! preamble.
//!
//! ## Escape Sequence Structure
//!
//! | Command | Bytes | Meaning |
//! |---------|-------|---------|
//! | `INIT` | `1B 40` | ESC @, reset the printer |
//! | `FEED_PAPER` | `1B 64 01` | ESC d 1, feed one line |
//! | `FEED_AND_CUT` | `1D 56 42 00` | GS V B 0, feed and cut |
//! | `START_PRINT` | `10 FF FE 01` | vendor job start |
//! | `PADDING` | 12 × `00` | sent right after `START_PRINT` |
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding:
//! - `u16` value 0x1234 is sent as bytes `[0x34, 0x12]`

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix
///
/// Used for raster graphics (`GS v 0`) and cutting (`GS V`).
pub const GS: u8 = 0x1D;

/// DLE (Data Link Escape) - Vendor job control prefix
pub const DLE: u8 = 0x10;

/// Number of zero bytes that follow `START_PRINT`.
pub const PADDING_LEN: usize = 12;

// ============================================================================
// INITIALIZATION
// ============================================================================

/// # Initialize Printer (ESC @)
///
/// Resets the printer to its power-on state. The transport session sends
/// this whenever it (re)establishes a link, before any other command.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
/// | Decimal | 27 64 |
///
/// ```
/// use periprint::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

// ============================================================================
// JOB CONTROL
// ============================================================================

/// # Start Print Job (DLE 0xFF 0xFE 0x01)
///
/// Vendor command that opens a print job. Must be followed by [`padding`]
/// before the raster header.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | Hex     | 10 FF FE 01 |
///
/// ```
/// use periprint::protocol::commands;
///
/// assert_eq!(commands::start_print(), vec![0x10, 0xFF, 0xFE, 0x01]);
/// ```
#[inline]
pub fn start_print() -> Vec<u8> {
    vec![DLE, 0xFF, 0xFE, 0x01]
}

/// Twelve zero bytes. The printer discards them; without them the first
/// raster rows are dropped.
#[inline]
pub fn padding() -> Vec<u8> {
    vec![0u8; PADDING_LEN]
}

// ============================================================================
// PAPER CONTROL
// ============================================================================

/// # Feed One Line (ESC d 1)
///
/// Prints any buffered data and advances the paper by one line.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC d 1 |
/// | Hex     | 1B 64 01 |
/// | Decimal | 27 100 1 |
#[inline]
pub fn feed_paper() -> Vec<u8> {
    vec![ESC, b'd', 0x01]
}

/// # Feed and Cut (GS V B 0)
///
/// Only meaningful on units fitted with a cutter. The T02 has a tear bar,
/// so the default print sequence ends with [`feed_paper`] instead.
#[inline]
pub fn feed_and_cut() -> Vec<u8> {
    vec![GS, b'V', b'B', 0x00]
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Encode a u16 value as little-endian bytes [low, high]
///
/// ```
/// use periprint::protocol::commands::u16_le;
///
/// assert_eq!(u16_le(0x1234), [0x34, 0x12]);
/// assert_eq!(u16_le(74), [74, 0]);
/// ```
#[inline]
pub const fn u16_le(value: u16) -> [u8; 2] {
    [value as u8, (value >> 8) as u8]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        assert_eq!(init(), vec![0x1B, 0x40]);
    }

    #[test]
    fn test_start_print() {
        assert_eq!(start_print(), vec![0x10, 0xFF, 0xFE, 0x01]);
    }

    #[test]
    fn test_padding() {
        let pad = padding();
        assert_eq!(pad.len(), 12);
        assert!(pad.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_feed_paper() {
        assert_eq!(feed_paper(), vec![0x1B, 0x64, 0x01]);
    }

    #[test]
    fn test_feed_and_cut() {
        assert_eq!(feed_and_cut(), vec![0x1D, 0x56, 0x42, 0x00]);
    }

    #[test]
    fn test_u16_le() {
        assert_eq!(u16_le(0x0000), [0x00, 0x00]);
        assert_eq!(u16_le(0x00FF), [0xFF, 0x00]);
        assert_eq!(u16_le(0xFF00), [0x00, 0xFF]);
        assert_eq!(u16_le(384), [0x80, 0x01]);
    }
}
