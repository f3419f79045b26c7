//! # Transport Session
//!
//! Owns the connection to one printer and delivers frames over it.
//!
//! ## Delivery
//!
//! Every frame is split into chunks of at most `chunk_size` bytes, written
//! in order with a short pause after each one so the link's flow control
//! keeps up:
//!
//! ```text
//! frame (3552 bytes) ─► [512][512][512][512][512][512][480]
//!                         │ 50ms │ 50ms │ ...
//! ```
//!
//! ## Retries
//!
//! If any chunk write fails the *whole frame* is sent again, up to
//! `retry_attempts` attempts in total with `retry_delay` between them. Before
//! each attempt the link is re-established if it dropped, and a fresh link
//! always starts with `INIT`. When the attempts run out the session is torn
//! down and a [`PeriprintError::Transport`] is returned.
//!
//! While connecting, failing to find the device, service or write
//! characteristic is not retried; those errors surface immediately. Once a
//! frame is in flight, a reconnect that cannot reopen the service counts
//! against the attempts like a failed write.

use log::{debug, info, warn};
use tokio::time::sleep;

use super::{Channel, Connector, SERVICE_UUID, TransportConfig, find_write_characteristic};
use crate::error::{PeriprintError, Result};
use crate::protocol::commands;

/// An open channel and the characteristic frames are written to.
struct Link<H> {
    channel: H,
    characteristic: String,
}

/// Why one attempt failed.
enum Failure {
    /// Not worth retrying (no device, no service, no characteristic).
    Fatal(PeriprintError),
    /// A chunk write failed.
    Write(PeriprintError),
}

/// Connection state for one printer.
pub struct Session<C: Connector> {
    connector: C,
    config: TransportConfig,
    device: Option<C::Device>,
    link: Option<Link<C::Channel>>,
    last_attempts: u32,
}

impl<C: Connector> Session<C> {
    pub fn new(connector: C, config: TransportConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            connector,
            config,
            device: None,
            link: None,
            last_attempts: 0,
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Whether a device has been selected.
    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    /// Whether the link is currently up.
    pub async fn is_connected(&self) -> bool {
        match &self.link {
            Some(link) => link.channel.is_connected().await,
            None => false,
        }
    }

    /// Attempts used by the most recent send or connect.
    pub fn last_attempts(&self) -> u32 {
        self.last_attempts
    }

    /// Discover a printer by name prefix and bring the link up.
    pub async fn connect(&mut self) -> Result<()> {
        self.close_link().await;
        let device = self.connector.discover(&self.config.name_prefix).await?;
        self.device = Some(device);
        self.deliver(None).await?;
        info!("Connected to printer");
        Ok(())
    }

    /// Close the link and forget the device.
    pub async fn disconnect(&mut self) -> Result<()> {
        let mut result = Ok(());
        if let Some(mut link) = self.link.take() {
            if link.channel.is_connected().await {
                result = link.channel.close().await;
            }
        }
        self.device = None;
        result
    }

    /// Deliver one frame, retrying on write failures.
    pub async fn send(&mut self, frame: &[u8]) -> Result<()> {
        debug!(
            "Sending {} byte frame in {} chunk(s)",
            frame.len(),
            frame.len().div_ceil(self.config.chunk_size)
        );
        self.deliver(Some(frame)).await
    }

    async fn deliver(&mut self, frame: Option<&[u8]>) -> Result<()> {
        let attempts = self.config.retry_attempts;
        let mut attempt = 1;

        loop {
            self.last_attempts = attempt;
            match self.attempt(frame).await {
                Ok(()) => return Ok(()),
                Err(Failure::Fatal(e)) => return Err(e),
                Err(Failure::Write(e)) if attempt < attempts => {
                    warn!(
                        "Write failed: {}. Retrying... (attempt {} of {})",
                        e,
                        attempt + 1,
                        attempts
                    );
                    sleep(self.config.retry_delay()).await;
                    attempt += 1;
                }
                Err(Failure::Write(e)) => {
                    warn!("Giving up after {} attempt(s)", attempt);
                    self.close_link().await;
                    self.device = None;
                    let message = match e {
                        PeriprintError::Transport { message, .. } => message,
                        other => other.to_string(),
                    };
                    return Err(PeriprintError::Transport {
                        attempts: attempt,
                        message,
                    });
                }
            }
        }
    }

    async fn attempt(&mut self, frame: Option<&[u8]>) -> std::result::Result<(), Failure> {
        self.ensure_connected(frame.is_some()).await?;
        let Some(frame) = frame else {
            return Ok(());
        };
        let link = self
            .link
            .as_mut()
            .ok_or(Failure::Fatal(PeriprintError::DeviceNotSelected))?;
        write_chunks(link, frame, &self.config)
            .await
            .map_err(Failure::Write)
    }

    /// Bring the link up if it is missing or dropped, sending `INIT` on a
    /// fresh one. With `retry_open` set, failing to reopen the service is
    /// retryable.
    async fn ensure_connected(&mut self, retry_open: bool) -> std::result::Result<(), Failure> {
        let device = self
            .device
            .as_ref()
            .ok_or(Failure::Fatal(PeriprintError::DeviceNotSelected))?;

        if let Some(link) = &self.link {
            if link.channel.is_connected().await {
                return Ok(());
            }
            info!("Link dropped, reconnecting");
        }
        self.link = None;

        debug!("Opening printer service {}", SERVICE_UUID);
        let channel = self
            .connector
            .open_channel(device, SERVICE_UUID)
            .await
            .map_err(|e| {
                if retry_open {
                    Failure::Write(e)
                } else {
                    Failure::Fatal(e)
                }
            })?;

        let ids = channel.characteristics();
        debug!("Available characteristics: {:?}", ids);
        let characteristic = find_write_characteristic(&ids).cloned().ok_or_else(|| {
            Failure::Fatal(PeriprintError::ServiceUnavailable(
                "No writable characteristic found".to_string(),
            ))
        })?;

        let mut link = Link {
            channel,
            characteristic,
        };
        if let Err(e) = write_chunks(&mut link, &commands::init(), &self.config).await {
            if let Err(close) = link.channel.close().await {
                debug!("Closing half-open link failed: {}", close);
            }
            return Err(Failure::Write(e));
        }

        self.link = Some(link);
        Ok(())
    }

    async fn close_link(&mut self) {
        if let Some(mut link) = self.link.take() {
            if let Err(e) = link.channel.close().await {
                debug!("Closing link failed: {}", e);
            }
        }
    }
}

async fn write_chunks<H: Channel>(
    link: &mut Link<H>,
    frame: &[u8],
    config: &TransportConfig,
) -> Result<()> {
    let delay = config.chunk_delay();
    for chunk in frame.chunks(config.chunk_size) {
        link.channel.write(&link.characteristic, chunk).await?;
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryConnector;
    use std::time::Duration;
    use tokio::time::Instant;

    fn session(connector: &MemoryConnector) -> Session<MemoryConnector> {
        Session::new(connector.clone(), TransportConfig::default()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_sends_init() {
        let mem = MemoryConnector::t02();
        let mut s = session(&mem);
        s.connect().await.unwrap();
        assert!(s.is_connected().await);
        assert_eq!(mem.chunks(), vec![commands::init()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_without_device() {
        let mem = MemoryConnector::t02();
        let mut s = session(&mem);
        let err = s.send(&[1, 2, 3]).await.unwrap_err();
        assert!(matches!(err, PeriprintError::DeviceNotSelected));
        assert_eq!(mem.write_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunking_preserves_order() {
        let mem = MemoryConnector::t02();
        let mut s = session(&mem);
        s.connect().await.unwrap();
        mem.clear();

        let frame: Vec<u8> = (0..1300u32).map(|i| (i % 251) as u8).collect();
        s.send(&frame).await.unwrap();

        let chunks = mem.chunks();
        assert_eq!(chunks.len(), 3);
        assert_eq!(
            chunks.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![512, 512, 276]
        );
        assert_eq!(chunks.concat(), frame);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunks_are_paced() {
        let mem = MemoryConnector::t02();
        let mut s = session(&mem);
        s.connect().await.unwrap();

        let start = Instant::now();
        s.send(&[0u8; 1024]).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_uses_three_attempts() {
        let mem = MemoryConnector::t02();
        let mut s = session(&mem);
        s.connect().await.unwrap();
        mem.fail_all_writes(true);
        let calls_before = mem.write_calls();

        let start = Instant::now();
        let err = s.send(&[0u8; 10]).await.unwrap_err();

        assert!(matches!(err, PeriprintError::Transport { attempts: 3, .. }));
        assert_eq!(mem.write_calls() - calls_before, 3);
        assert_eq!(s.last_attempts(), 3);
        // Two backoffs between three attempts
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        // Session torn down
        assert!(!s.has_device());
        assert!(!s.is_connected().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_second_attempt() {
        let mem = MemoryConnector::t02();
        let mut s = session(&mem);
        s.connect().await.unwrap();
        mem.clear();
        mem.fail_next_writes(1);

        s.send(&[7u8; 600]).await.unwrap();

        assert_eq!(s.last_attempts(), 2);
        // Whole frame resent, not just the failed chunk
        assert_eq!(mem.chunks().concat(), vec![7u8; 600]);
        assert_eq!(mem.write_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_mid_frame_resends_whole_frame() {
        let mem = MemoryConnector::t02();
        let mut s = session(&mem);
        s.connect().await.unwrap();
        mem.clear();
        mem.fail_write_number(2);

        let frame: Vec<u8> = (0..1024u32).map(|i| i as u8).collect();
        s.send(&frame).await.unwrap();

        // First chunk landed, second failed, then the full frame again
        let chunks = mem.chunks();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], frame[..512]);
        assert_eq!(chunks[1..].concat(), frame);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_link_reconnects_with_init() {
        let mem = MemoryConnector::t02();
        let mut s = session(&mem);
        s.connect().await.unwrap();
        mem.clear();
        mem.drop_link();

        s.send(&[9, 9]).await.unwrap();

        assert_eq!(mem.chunks(), vec![commands::init(), vec![9, 9]]);
        assert_eq!(mem.opens(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_service_is_not_retried() {
        let mem = MemoryConnector::t02().without_service();
        let mut s = session(&mem);
        let start = Instant::now();
        let err = s.connect().await.unwrap_err();
        assert!(matches!(err, PeriprintError::ServiceUnavailable(_)));
        assert_eq!(s.last_attempts(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_reconnect_uses_retry_budget() {
        let mem = MemoryConnector::t02();
        let mut s = session(&mem);
        s.connect().await.unwrap();
        mem.drop_link();
        let mem = mem.without_service();
        mem.clear();

        let start = Instant::now();
        let err = s.send(&[1, 2, 3]).await.unwrap_err();

        assert!(matches!(err, PeriprintError::Transport { attempts: 3, .. }));
        assert_eq!(s.last_attempts(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert_eq!(mem.write_calls(), 0);
        assert!(!s.has_device());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_recovers_when_service_returns() {
        let mem = MemoryConnector::t02();
        let mut s = session(&mem);
        s.connect().await.unwrap();
        mem.drop_link();
        mem.fail_next_opens(1);
        mem.clear();

        s.send(&[5, 6]).await.unwrap();

        assert_eq!(s.last_attempts(), 2);
        assert_eq!(mem.chunks(), vec![commands::init(), vec![5, 6]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_characteristic() {
        let mem = MemoryConnector::t02().with_characteristics(&["0000ff01", "0000ff03"]);
        let mut s = session(&mem);
        let err = s.connect().await.unwrap_err();
        assert!(matches!(err, PeriprintError::ServiceUnavailable(_)));
        assert_eq!(mem.write_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_matching_device() {
        let mem = MemoryConnector::with_devices(&["Speaker", "Watch"]);
        let mut s = session(&mem);
        assert!(matches!(
            s.connect().await,
            Err(PeriprintError::DeviceNotSelected)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_clears_session() {
        let mem = MemoryConnector::t02();
        let mut s = session(&mem);
        s.connect().await.unwrap();
        s.disconnect().await.unwrap();
        assert!(!s.has_device());
        assert!(!mem.is_link_up());
        assert!(matches!(
            s.send(&[1]).await,
            Err(PeriprintError::DeviceNotSelected)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_frame_writes_nothing() {
        let mem = MemoryConnector::t02();
        let mut s = session(&mem);
        s.connect().await.unwrap();
        mem.clear();
        s.send(&[]).await.unwrap();
        assert_eq!(mem.write_calls(), 0);
    }
}
