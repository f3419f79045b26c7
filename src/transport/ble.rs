//! # Bluetooth LE Transport
//!
//! [`Connector`] for real printers, built on `btleplug`.
//!
//! ## Discovery
//!
//! The first adapter reported by the system is used. Discovery scans until
//! a peripheral advertising a name with the configured prefix shows up or
//! the scan timeout passes.
//!
//! ## Writes
//!
//! Writes go out as write-without-response, matching how the printer's
//! `ff02` characteristic is meant to be driven. Pacing between packets is
//! the session's job, not this module's.
//!
//! ## Platform Notes
//!
//! - **Linux**: needs BlueZ running and permission to talk to it
//! - **macOS**: the terminal needs Bluetooth permission

use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use log::{debug, info};
use tokio::time::{Instant, sleep};
use uuid::Uuid;

use super::{Channel, Connector};
use crate::error::{PeriprintError, Result};

/// How often the peripheral list is polled while scanning.
const SCAN_POLL: Duration = Duration::from_millis(250);

fn ble_error(context: &str, e: btleplug::Error) -> PeriprintError {
    PeriprintError::ServiceUnavailable(format!("{}: {}", context, e))
}

/// A peripheral found during discovery.
#[derive(Debug, Clone)]
pub struct BleDevice {
    pub name: String,
    peripheral: Peripheral,
}

/// Connector over the host's first Bluetooth adapter.
pub struct BleConnector {
    adapter: Adapter,
    scan_timeout: Duration,
}

impl BleConnector {
    pub async fn new(scan_timeout: Duration) -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|e| ble_error("Bluetooth unavailable", e))?;
        let adapter = manager
            .adapters()
            .await
            .map_err(|e| ble_error("Listing adapters failed", e))?
            .into_iter()
            .next()
            .ok_or_else(|| {
                PeriprintError::ServiceUnavailable("No Bluetooth adapter found".to_string())
            })?;
        Ok(Self {
            adapter,
            scan_timeout,
        })
    }

    async fn find(&self, name_prefix: &str) -> Result<Option<BleDevice>> {
        let peripherals = self
            .adapter
            .peripherals()
            .await
            .map_err(|e| ble_error("Listing peripherals failed", e))?;

        for peripheral in peripherals {
            let name = match peripheral.properties().await {
                Ok(Some(props)) => props.local_name,
                _ => None,
            };
            if let Some(name) = name.filter(|n| n.starts_with(name_prefix)) {
                return Ok(Some(BleDevice { name, peripheral }));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl Connector for BleConnector {
    type Device = BleDevice;
    type Channel = BleChannel;

    async fn discover(&self, name_prefix: &str) -> Result<BleDevice> {
        info!("Scanning for printers named {}*", name_prefix);
        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(|e| ble_error("Scan failed", e))?;

        let deadline = Instant::now() + self.scan_timeout;
        let found = loop {
            if let Some(device) = self.find(name_prefix).await? {
                break Some(device);
            }
            if Instant::now() >= deadline {
                break None;
            }
            sleep(SCAN_POLL).await;
        };

        if let Err(e) = self.adapter.stop_scan().await {
            debug!("Stopping scan failed: {}", e);
        }

        match found {
            Some(device) => {
                info!("Found {}", device.name);
                Ok(device)
            }
            None => Err(PeriprintError::DeviceNotSelected),
        }
    }

    async fn open_channel(&self, device: &BleDevice, service: Uuid) -> Result<BleChannel> {
        let peripheral = device.peripheral.clone();

        let connected = peripheral.is_connected().await.unwrap_or(false);
        if !connected {
            debug!("Connecting to {}", device.name);
            peripheral
                .connect()
                .await
                .map_err(|e| ble_error("Connect failed", e))?;
        }
        peripheral
            .discover_services()
            .await
            .map_err(|e| ble_error("Service discovery failed", e))?;

        let found = peripheral
            .services()
            .into_iter()
            .find(|s| s.uuid == service)
            .ok_or_else(|| {
                PeriprintError::ServiceUnavailable(format!(
                    "{} has no service {}",
                    device.name, service
                ))
            })?;

        Ok(BleChannel {
            peripheral,
            characteristics: found.characteristics.into_iter().collect(),
        })
    }
}

/// An open printer service on a connected peripheral.
pub struct BleChannel {
    peripheral: Peripheral,
    characteristics: Vec<Characteristic>,
}

#[async_trait]
impl Channel for BleChannel {
    async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    fn characteristics(&self) -> Vec<String> {
        self.characteristics
            .iter()
            .map(|c| c.uuid.to_string())
            .collect()
    }

    async fn write(&mut self, characteristic: &str, data: &[u8]) -> Result<()> {
        let target = self
            .characteristics
            .iter()
            .find(|c| c.uuid.to_string() == characteristic)
            .ok_or_else(|| {
                PeriprintError::ServiceUnavailable(format!(
                    "Unknown characteristic {}",
                    characteristic
                ))
            })?;
        self.peripheral
            .write(target, data, WriteType::WithoutResponse)
            .await
            .map_err(|e| PeriprintError::write_failed(e.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        self.peripheral
            .disconnect()
            .await
            .map_err(|e| ble_error("Disconnect failed", e))
    }
}
