//! Adapter Links
//!
//! An [`AdapterLink`] is one open, half-duplex session with an ELM327: write
//! a command line, read until the `>` prompt. A [`LinkProvider`] finds the
//! candidate ports and opens links on them.

use crate::error::ObdError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info};

/// ELM327 prompt printed when the adapter is ready for the next command
pub const PROMPT: u8 = b'>';

/// One open session with an adapter
#[async_trait]
pub trait AdapterLink: Send {
    /// Send one command and return the reply lines printed before the prompt
    async fn send(&mut self, command: &str, timeout: Duration) -> Result<Vec<String>, ObdError>;

    /// Port this link was opened on
    fn port(&self) -> &str;

    /// Release the underlying device
    async fn close(&mut self);
}

/// Finds adapter ports and opens links on them
#[async_trait]
pub trait LinkProvider: Send + Sync {
    type Link: AdapterLink;

    /// Candidate ports, sorted
    fn scan(&self) -> Vec<String>;

    /// Open a link on `port` at `baud_rate`
    async fn open(&self, port: &str, baud_rate: u32) -> Result<Self::Link, ObdError>;
}

/// Split raw adapter output into trimmed, non-empty lines.
///
/// The prompt and any echo of `command` are dropped.
pub fn split_reply(raw: &[u8], command: &str) -> Vec<String> {
    String::from_utf8_lossy(raw)
        .split(|c: char| c == '\r' || c == '\n')
        .map(|line| line.trim_matches(|c: char| c.is_whitespace() || c == '>' || c == '\0'))
        .filter(|line| !line.is_empty() && *line != command)
        .map(str::to_string)
        .collect()
}

/// Serial (USB or Bluetooth RFCOMM) link
pub struct SerialLink {
    port: String,
    stream: SerialStream,
}

impl SerialLink {
    /// Open `port` at `baud_rate`, 8N1
    pub fn open(port: &str, baud_rate: u32) -> Result<Self, ObdError> {
        debug!("Opening serial port {} at {} baud", port, baud_rate);
        let stream = tokio_serial::new(port, baud_rate)
            .timeout(Duration::from_millis(100))
            .open_native_async()?;

        Ok(Self {
            port: port.to_string(),
            stream,
        })
    }

    async fn read_until_prompt(&mut self, buf: &mut Vec<u8>) -> Result<(), ObdError> {
        let mut chunk = [0u8; 256];
        loop {
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(ObdError::SerialError(format!(
                    "{}: device closed the stream",
                    self.port
                )));
            }
            buf.extend_from_slice(&chunk[..n]);
            if buf.contains(&PROMPT) {
                return Ok(());
            }
        }
    }
}

#[async_trait]
impl AdapterLink for SerialLink {
    async fn send(&mut self, command: &str, timeout: Duration) -> Result<Vec<String>, ObdError> {
        debug!("{} <- {}", self.port, command);
        self.stream
            .write_all(format!("{}\r", command).as_bytes())
            .await?;
        self.stream.flush().await?;

        let mut buf = Vec::new();
        tokio::time::timeout(timeout, self.read_until_prompt(&mut buf))
            .await
            .map_err(|_| ObdError::Timeout(timeout.as_millis() as u64))??;

        let lines = split_reply(&buf, command);
        debug!("{} -> {:?}", self.port, lines);
        Ok(lines)
    }

    fn port(&self) -> &str {
        &self.port
    }

    async fn close(&mut self) {
        info!("Closing serial port {}", self.port);
        // the device is released when the stream is dropped
        let _ = self.stream.flush().await;
    }
}

/// Discovers serial ports through the operating system
#[derive(Debug, Clone, Default)]
pub struct SerialLinkProvider;

impl SerialLinkProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LinkProvider for SerialLinkProvider {
    type Link = SerialLink;

    fn scan(&self) -> Vec<String> {
        let mut ports: Vec<String> = tokio_serial::available_ports()
            .unwrap_or_default()
            .into_iter()
            .map(|info| info.port_name)
            .collect();
        ports.sort();
        ports.dedup();
        ports
    }

    async fn open(&self, port: &str, baud_rate: u32) -> Result<SerialLink, ObdError> {
        SerialLink::open(port, baud_rate)
    }
}
