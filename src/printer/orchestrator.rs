//! # Print Orchestrator
//!
//! Ties layout, rendering, packing and transport together behind the
//! handful of operations a front-end needs.
//!
//! ## States
//!
//! ```text
//!                connect()
//! Disconnected ───────────► Connected ◄──────────────────┐
//!      ▲                        │ print_text()            │ frames sent
//!      │                        ▼                         │ (or recoverable
//!      │                    Rendering ───► Transmitting ──┘  failure)
//!      │                                        │
//!      └──────── retries exhausted ─────────────┘
//! ```
//!
//! A preview never touches the printer. It renders without dithering so the
//! anti-aliased shapes are visible, and it is kept as pending state until a
//! print succeeds or the printer is disconnected.

use log::{debug, info, warn};

use super::config::PrinterConfig;
use crate::error::{PeriprintError, Result};
use crate::protocol::{commands, graphics};
use crate::raster::Rasterizer;
use crate::render::{self, Preview, pack};
use crate::style::StyleSpec;
use crate::transport::{Connector, Session, TransportConfig};

/// Where the printer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterState {
    Disconnected,
    Connected,
    Rendering,
    Transmitting,
}

/// A printer and the text waiting to go to it.
pub struct Printer<C: Connector, R: Rasterizer> {
    session: Session<C>,
    rasterizer: R,
    config: PrinterConfig,
    state: PrinterState,
    pending_text: Option<String>,
    preview: Option<Preview>,
}

impl<C: Connector, R: Rasterizer> Printer<C, R> {
    pub fn new(connector: C, rasterizer: R, transport: TransportConfig) -> Result<Self> {
        Ok(Self {
            session: Session::new(connector, transport)?,
            rasterizer,
            config: PrinterConfig::T02,
            state: PrinterState::Disconnected,
            pending_text: None,
            preview: None,
        })
    }

    pub fn state(&self) -> PrinterState {
        self.state
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    /// Text of the last preview or unfinished print.
    pub fn pending_text(&self) -> Option<&str> {
        self.pending_text.as_deref()
    }

    pub fn cached_preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub async fn connect(&mut self) -> Result<()> {
        match self.session.connect().await {
            Ok(()) => {
                self.state = PrinterState::Connected;
                Ok(())
            }
            Err(e) => {
                self.state = PrinterState::Disconnected;
                Err(e)
            }
        }
    }

    pub async fn disconnect(&mut self) -> Result<()> {
        self.preview = None;
        self.state = PrinterState::Disconnected;
        self.session.disconnect().await
    }

    /// Render `text` for display. Nothing is sent to the printer.
    pub fn get_preview(&mut self, text: &str, height: u32, style: &StyleSpec) -> Result<Preview> {
        let rendered = render::render_text(
            &self.rasterizer,
            text,
            self.config.width_dots,
            height,
            style,
            false,
        )?;
        let preview = Preview::encode(&rendered.image)?;
        self.pending_text = Some(text.to_string());
        self.preview = Some(preview.clone());
        Ok(preview)
    }

    /// Render, dither, pack and send `text` as one label `height` rows tall.
    pub async fn print_text(&mut self, text: &str, height: u32, style: &StyleSpec) -> Result<()> {
        if !self.session.has_device() {
            return Err(PeriprintError::DeviceNotSelected);
        }
        let width = self.config.width_dots;
        graphics::bitmap_header(width, height)?;

        self.pending_text = Some(text.to_string());
        self.state = PrinterState::Rendering;
        let frames = match self.build_job(text, height, style) {
            Ok(frames) => frames,
            Err(e) => {
                self.state = PrinterState::Connected;
                return Err(e);
            }
        };

        self.state = PrinterState::Transmitting;
        for frame in &frames {
            if let Err(e) = self.session.send(frame).await {
                warn!("Print failed: {}", e);
                self.state = self.settled_state();
                return Err(e);
            }
        }

        info!("Printed {}x{} label", width, height);
        self.state = PrinterState::Connected;
        self.pending_text = None;
        self.preview = None;
        Ok(())
    }

    /// [`print_text`](Self::print_text) with the height given in millimetres.
    pub async fn print_text_mm(
        &mut self,
        text: &str,
        height_mm: f32,
        style: &StyleSpec,
    ) -> Result<()> {
        let height = self.config.mm_to_dots(height_mm);
        self.print_text(text, height, style).await
    }

    /// Advance the paper by one line.
    pub async fn feed_paper(&mut self) -> Result<()> {
        if !self.session.has_device() {
            return Err(PeriprintError::DeviceNotSelected);
        }
        let result = self.session.send(&commands::feed_paper()).await;
        self.state = self.settled_state();
        result
    }

    fn build_job(&self, text: &str, height: u32, style: &StyleSpec) -> Result<Vec<Vec<u8>>> {
        let width = self.config.width_dots;
        let rendered = render::render_text(&self.rasterizer, text, width, height, style, true)?;
        let bitmap = pack::pack(&rendered.image);
        debug!(
            "Packed {} bytes, {} rows of {}",
            bitmap.len(),
            height,
            self.config.width_bytes
        );
        graphics::print_job(width, height, bitmap)
    }

    fn settled_state(&self) -> PrinterState {
        if self.session.has_device() {
            PrinterState::Connected
        } else {
            PrinterState::Disconnected
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
