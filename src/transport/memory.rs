//! # In-Memory Transport
//!
//! A [`Connector`] that records every write instead of sending it anywhere.
//! Used by `--dry-run` and by the tests, which can also inject write
//! failures and dropped links.
//!
//! Clones share state, so a test can hand one clone to a session and keep
//! another to inspect what arrived.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use log::trace;
use uuid::Uuid;

use super::{Channel, Connector, MAX_CHUNK_SIZE, SERVICE_UUID, short_uuid};
use crate::error::{PeriprintError, Result};

/// A device found by [`MemoryConnector::discover`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDevice {
    pub name: String,
}

#[derive(Debug, Default)]
struct State {
    devices: Vec<String>,
    service_present: bool,
    characteristics: Vec<String>,
    connected: bool,
    opens: usize,
    fail_opens: usize,

    fail_next: usize,
    fail_always: bool,
    fail_call: Option<usize>,

    write_calls: usize,
    chunks: Vec<Vec<u8>>,
}

/// Recording connector.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    state: Arc<Mutex<State>>,
}

impl MemoryConnector {
    /// One device advertising `devices` names, exposing the printer service
    /// with the usual `ff01`/`ff02`/`ff03` characteristics.
    pub fn with_devices(devices: &[&str]) -> Self {
        let state = State {
            devices: devices.iter().map(|d| d.to_string()).collect(),
            service_present: true,
            characteristics: [0xFF01, 0xFF02, 0xFF03]
                .into_iter()
                .map(|id| short_uuid(id).to_string())
                .collect(),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// A single printer named like a real T02.
    pub fn t02() -> Self {
        Self::with_devices(&["T02_4C1A"])
    }

    pub fn without_service(self) -> Self {
        self.lock().service_present = false;
        self
    }

    pub fn with_characteristics(self, ids: &[&str]) -> Self {
        self.lock().characteristics = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    /// Fail the next `n` attempts to open the service.
    pub fn fail_next_opens(&self, n: usize) {
        self.lock().fail_opens = n;
    }

    /// Fail the next `n` write calls.
    pub fn fail_next_writes(&self, n: usize) {
        self.lock().fail_next = n;
    }

    /// Fail every write until turned off.
    pub fn fail_all_writes(&self, fail: bool) {
        self.lock().fail_always = fail;
    }

    /// Fail the `n`th write call counted from the last [`clear`](Self::clear).
    pub fn fail_write_number(&self, n: usize) {
        self.lock().fail_call = Some(n);
    }

    /// Simulate the printer going out of range.
    pub fn drop_link(&self) {
        self.lock().connected = false;
    }

    pub fn is_link_up(&self) -> bool {
        self.lock().connected
    }

    /// Successful writes, in order.
    pub fn chunks(&self) -> Vec<Vec<u8>> {
        self.lock().chunks.clone()
    }

    /// Every successfully written byte, concatenated.
    pub fn bytes(&self) -> Vec<u8> {
        self.lock().chunks.concat()
    }

    /// Write calls made, failed ones included.
    pub fn write_calls(&self) -> usize {
        self.lock().write_calls
    }

    /// Channels opened so far.
    pub fn opens(&self) -> usize {
        self.lock().opens
    }

    /// Forget recorded writes.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.chunks.clear();
        state.write_calls = 0;
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Device = MemoryDevice;
    type Channel = MemoryChannel;

    async fn discover(&self, name_prefix: &str) -> Result<MemoryDevice> {
        let state = self.lock();
        state
            .devices
            .iter()
            .find(|name| name.starts_with(name_prefix))
            .map(|name| MemoryDevice { name: name.clone() })
            .ok_or(PeriprintError::DeviceNotSelected)
    }

    async fn open_channel(&self, device: &MemoryDevice, service: Uuid) -> Result<MemoryChannel> {
        let mut state = self.lock();
        if state.fail_opens > 0 {
            state.fail_opens -= 1;
            return Err(PeriprintError::ServiceUnavailable(format!(
                "{} did not answer",
                device.name
            )));
        }
        if !state.service_present || service != SERVICE_UUID {
            return Err(PeriprintError::ServiceUnavailable(format!(
                "{} has no service {}",
                device.name, service
            )));
        }
        state.connected = true;
        state.opens += 1;
        Ok(MemoryChannel {
            state: Arc::clone(&self.state),
            characteristics: state.characteristics.clone(),
        })
    }
}

/// Channel handed out by [`MemoryConnector`].
#[derive(Debug)]
pub struct MemoryChannel {
    state: Arc<Mutex<State>>,
    characteristics: Vec<String>,
}

impl MemoryChannel {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Channel for MemoryChannel {
    async fn is_connected(&self) -> bool {
        self.lock().connected
    }

    fn characteristics(&self) -> Vec<String> {
        self.characteristics.clone()
    }

    async fn write(&mut self, characteristic: &str, data: &[u8]) -> Result<()> {
        let mut state = self.lock();
        state.write_calls += 1;
        let call = state.write_calls;

        if !state.connected {
            return Err(PeriprintError::write_failed("GATT Server is disconnected"));
        }
        if data.len() > MAX_CHUNK_SIZE {
            return Err(PeriprintError::write_failed(format!(
                "{} bytes exceeds the {} byte packet limit",
                data.len(),
                MAX_CHUNK_SIZE
            )));
        }
        if state.fail_always || state.fail_call == Some(call) {
            return Err(PeriprintError::write_failed("injected failure"));
        }
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(PeriprintError::write_failed("injected failure"));
        }

        trace!("{} <- {} bytes", characteristic, data.len());
        state.chunks.push(data.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.lock().connected = false;
        Ok(())
    }
}
