//! OBD-II Client for ELM327 Adapters
//!
//! Performs the adapter handshake on one port and sends catalog commands
//! over the resulting link.

use crate::catalog::{CommandSpec, Ecu};
use crate::error::ObdError;
use crate::link::{AdapterLink, LinkProvider};
use crate::message::{parse_response, Frame, RawMessage};
use crate::protocol::{ObdProtocol, BAUD_RATE_CANDIDATES};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout for OBD commands
const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Timeout for the reset command while probing baud rates
const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Setup commands sent after reset, each answered with `OK`
const SETUP_COMMANDS: [&str; 4] = ["ATE0", "ATL0", "ATS1", "ATH1"];

/// Length of one `ATST` step in microseconds
const ATST_STEP_MICROS: u128 = 4096;

/// `ATST` value for a host-side `timeout`.
///
/// The adapter gives up after half the host timeout so its `NO DATA` (or
/// the end of a short fast-mode reply) arrives before the host read expires.
pub fn adapter_timeout_steps(timeout: Duration) -> u8 {
    let steps = (timeout.as_micros() / 2 / ATST_STEP_MICROS).clamp(1, 0xFF);
    steps as u8
}

/// How far the handshake got
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObdStatus {
    /// No adapter answered
    NotConnected,
    /// Adapter answered, vehicle did not
    ElmConnected,
    /// Adapter and vehicle both answered
    CarConnected,
}

/// Connection options shared by every client the manager creates
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Append the responder count to requests so the adapter stops early
    pub fast: bool,
    /// Command timeout
    pub timeout: Duration,
    /// Fixed baud rate, or `None` to probe [`BAUD_RATE_CANDIDATES`]
    pub baud_rate: Option<u32>,
    /// Protocol to request, `Auto` lets the adapter search
    pub protocol: ObdProtocol,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            fast: true,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            baud_rate: None,
            protocol: ObdProtocol::Auto,
        }
    }
}

/// OBD-II client for one ELM327-compatible adapter
pub struct ObdClient<L: AdapterLink> {
    /// Open link, `None` once closed
    link: Option<L>,
    /// Serial port device path (e.g., "/dev/ttyUSB0" or "COM3")
    port: String,
    /// Protocol reported by the adapter after the probe
    protocol: ObdProtocol,
    /// Handshake result
    status: ObdStatus,
    options: ClientOptions,
    /// ECUs that answered the `0100` probe
    responders: usize,
}

impl<L: AdapterLink> ObdClient<L> {
    /// Open `port` through `provider` and run the ELM327 handshake.
    ///
    /// Never fails: how far the handshake got is reported by [`status`].
    ///
    /// [`status`]: ObdClient::status
    pub async fn connect<P>(provider: &P, port: &str, options: ClientOptions) -> Self
    where
        P: LinkProvider<Link = L>,
    {
        info!("Connecting to OBD adapter on {}", port);

        let mut client = Self {
            link: None,
            port: port.to_string(),
            protocol: options.protocol,
            status: ObdStatus::NotConnected,
            options,
            responders: 0,
        };

        match client.handshake(provider).await {
            Ok(status) => client.status = status,
            Err(e) => {
                warn!("Handshake on {} failed: {}", port, e);
                client.close().await;
            }
        }

        info!("Adapter on {} status: {:?}", port, client.status);
        client
    }

    async fn handshake<P>(&mut self, provider: &P) -> Result<ObdStatus, ObdError>
    where
        P: LinkProvider<Link = L>,
    {
        self.link = Some(self.open_link(provider).await?);

        for command in SETUP_COMMANDS {
            self.expect_ok(command).await?;
        }
        let steps = adapter_timeout_steps(self.options.timeout);
        self.expect_ok(&format!("ATST{:02X}", steps)).await?;
        self.expect_ok(self.options.protocol.to_elm_command()).await?;

        let probe = self.send("0100").await?;
        let reported = self.send("ATDPN").await?;
        if let Some(protocol) = reported.first().and_then(|r| ObdProtocol::from_elm_number(r)) {
            self.protocol = protocol;
        }

        let responders = parse_response(&probe, self.protocol, true)
            .iter()
            .filter(|m| !m.has_error() && !m.data.is_empty())
            .count();
        if responders == 0 {
            info!("Adapter on {} answered, vehicle did not: {:?}", self.port, probe);
            return Ok(ObdStatus::ElmConnected);
        }

        self.responders = responders;
        info!(
            "Vehicle connected on {} ({:?}, {} ECUs)",
            self.port, self.protocol, responders
        );
        Ok(ObdStatus::CarConnected)
    }

    /// Find a baud rate the adapter answers `ATZ` on
    async fn open_link<P>(&self, provider: &P) -> Result<L, ObdError>
    where
        P: LinkProvider<Link = L>,
    {
        let candidates: Vec<u32> = match self.options.baud_rate {
            Some(baud) => vec![baud],
            None => BAUD_RATE_CANDIDATES.to_vec(),
        };

        for baud in candidates {
            let mut link = match provider.open(&self.port, baud).await {
                Ok(link) => link,
                Err(e) => {
                    debug!("Cannot open {} at {} baud: {}", self.port, baud, e);
                    continue;
                }
            };

            match link.send("ATZ", PROBE_TIMEOUT).await {
                Ok(lines) if !lines.is_empty() => {
                    info!("Adapter on {} at {} baud: {}", self.port, baud, lines.join(" "));
                    return Ok(link);
                }
                Ok(_) => debug!("No reset banner on {} at {} baud", self.port, baud),
                Err(e) => debug!("No answer on {} at {} baud: {}", self.port, baud, e),
            }
            link.close().await;
        }

        Err(ObdError::AdapterNotResponding)
    }

    async fn send(&mut self, command: &str) -> Result<Vec<String>, ObdError> {
        let timeout = self.options.timeout;
        let link = self.link.as_mut().ok_or(ObdError::NotConnected)?;
        link.send(command, timeout).await
    }

    async fn expect_ok(&mut self, command: &str) -> Result<(), ObdError> {
        let lines = self.send(command).await?;
        if lines.iter().any(|l| l.contains("OK")) {
            Ok(())
        } else {
            Err(ObdError::InvalidResponse(format!(
                "{} answered {:?}",
                command, lines
            )))
        }
    }

    /// Send a catalog command and return one message per responding ECU.
    ///
    /// A transport failure marks the client as not connected.
    pub async fn query(&mut self, spec: &CommandSpec) -> Result<Vec<RawMessage>, ObdError> {
        if spec.is_adapter() {
            if self.link.is_none() {
                return Err(ObdError::NotConnected);
            }
        } else if self.status != ObdStatus::CarConnected {
            return Err(ObdError::VehicleNotConnected);
        }

        let mut request = spec.request_text();
        if self.options.fast && spec.fast && !spec.is_adapter() && self.responders > 0 {
            request.push_str(&self.responders.min(9).to_string());
        }

        debug!("Querying {} ({})", spec.name, request);
        let lines = match self.send(&request).await {
            Ok(lines) => lines,
            Err(e) => {
                warn!("Query {} failed on {}: {}", spec.name, self.port, e);
                self.status = ObdStatus::NotConnected;
                return Err(e);
            }
        };

        if spec.is_adapter() {
            let text = lines.join(" ");
            let frames = lines.into_iter().map(Frame::text).collect();
            return Ok(vec![RawMessage::new(Ecu::Adapter, frames, text.into_bytes())]);
        }

        Ok(parse_response(&lines, self.protocol, true))
    }

    /// Close the link; the client cannot be reused afterwards
    pub async fn close(&mut self) {
        if let Some(mut link) = self.link.take() {
            info!("Disconnecting OBD client on {}", self.port);
            link.close().await;
        }
        self.status = ObdStatus::NotConnected;
    }

    /// Check if the vehicle is connected
    pub fn is_connected(&self) -> bool {
        self.status == ObdStatus::CarConnected
    }

    pub fn status(&self) -> ObdStatus {
        self.status
    }

    /// Get current protocol
    pub fn protocol(&self) -> ObdProtocol {
        self.protocol
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    /// Number of ECUs that answered the connection probe
    pub fn responders(&self) -> usize {
        self.responders
    }
}
