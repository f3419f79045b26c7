//! # Transport
//!
//! Delivery of command frames to the printer over a lossy, packet-limited
//! link.
//!
//! ## Modules
//!
//! - [`session`]: Chunking, pacing, retries and link (re)establishment
//! - [`memory`]: In-memory connector that records every write
//! - [`ble`]: Bluetooth LE connector built on `btleplug` (feature `ble`)
//!
//! ## Link Model
//!
//! ```text
//! Connector ──discover("T02")──► Device
//!     │
//!     └──open_channel(Device, 0xFF00)──► Channel
//!                                          ├─ characteristics() -> [ff01, ff02, ff03]
//!                                          └─ write("…ff02…", ≤512 bytes)
//! ```
//!
//! The session picks the first characteristic whose identifier contains
//! `ff02` (case-insensitive) and sends unacknowledged writes to it.

#[cfg(feature = "ble")]
pub mod ble;
pub mod memory;
pub mod session;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PeriprintError, Result};

pub use memory::MemoryConnector;
pub use session::Session;

/// Largest write the link accepts in one packet.
pub const MAX_CHUNK_SIZE: usize = 512;

/// Substring identifying the printer's write characteristic.
pub const WRITE_CHARACTERISTIC: &str = "ff02";

/// Primary printer service, `0xFF00` on the Bluetooth base UUID.
pub const SERVICE_UUID: Uuid = short_uuid(0xFF00);

/// Expand a 16-bit Bluetooth UUID onto the base UUID
/// `0000xxxx-0000-1000-8000-00805f9b34fb`.
///
/// ```
/// use periprint::transport::short_uuid;
///
/// assert_eq!(
///     short_uuid(0xFF02).to_string(),
///     "0000ff02-0000-1000-8000-00805f9b34fb"
/// );
/// ```
pub const fn short_uuid(short: u16) -> Uuid {
    Uuid::from_u128(((short as u128) << 96) | 0x0000_0000_0000_1000_8000_0080_5f9b_34fb)
}

/// First characteristic whose identifier contains `ff02`, ignoring case.
pub fn find_write_characteristic(ids: &[String]) -> Option<&String> {
    ids.iter()
        .find(|id| id.to_lowercase().contains(WRITE_CHARACTERISTIC))
}

/// An open link to one printer service.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Whether the underlying link is still up.
    async fn is_connected(&self) -> bool;

    /// Identifiers of the service's characteristics.
    fn characteristics(&self) -> Vec<String>;

    /// Unacknowledged write of at most [`MAX_CHUNK_SIZE`] bytes.
    async fn write(&mut self, characteristic: &str, data: &[u8]) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

/// Finds printers and opens channels to them.
#[async_trait]
pub trait Connector: Send + Sync {
    type Device: Send + Sync;
    type Channel: Channel;

    /// Find a device whose advertised name starts with `name_prefix`.
    async fn discover(&self, name_prefix: &str) -> Result<Self::Device>;

    /// Connect to `device` if needed and open `service`.
    async fn open_channel(&self, device: &Self::Device, service: Uuid) -> Result<Self::Channel>;
}

/// Link tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Advertised name prefix to look for.
    pub name_prefix: String,
    pub chunk_size: usize,
    /// Pause after each chunk.
    pub chunk_delay_ms: u64,
    /// Attempts per frame, the first one included.
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub scan_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            name_prefix: "T02".to_string(),
            chunk_size: MAX_CHUNK_SIZE,
            chunk_delay_ms: 50,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            scan_timeout_ms: 10_000,
        }
    }
}

impl TransportConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(PeriprintError::Config(format!(
                "chunk_size must be 1..={}, got {}",
                MAX_CHUNK_SIZE, self.chunk_size
            )));
        }
        if self.retry_attempts == 0 {
            return Err(PeriprintError::Config(
                "retry_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_uuid() {
        assert_eq!(
            SERVICE_UUID.to_string(),
            "0000ff00-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_find_write_characteristic_case_insensitive() {
        let ids = vec![
            "0000FF01-0000-1000-8000-00805F9B34FB".to_string(),
            "0000FF02-0000-1000-8000-00805F9B34FB".to_string(),
            "0000ff03-0000-1000-8000-00805f9b34fb".to_string(),
        ];
        assert_eq!(find_write_characteristic(&ids), Some(&ids[1]));
    }

    #[test]
    fn test_find_write_characteristic_substring_anywhere() {
        let ids = vec!["custom-ff02-endpoint".to_string()];
        assert_eq!(find_write_characteristic(&ids), Some(&ids[0]));
        assert_eq!(find_write_characteristic(&["ff03".to_string()]), None);
        assert_eq!(find_write_characteristic(&[]), None);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = TransportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 512);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.retry_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_config_rejects_oversized_chunks() {
        let config = TransportConfig {
            chunk_size: 513,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PeriprintError::Config(_))));
    }

    #[test]
    fn test_config_rejects_zero_attempts() {
        let config = TransportConfig {
            retry_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
