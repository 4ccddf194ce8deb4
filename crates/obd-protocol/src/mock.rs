//! Simulated ELM327 adapter
//!
//! Answers the same command lines a real adapter does, on CAN 11 bit with
//! headers, so the client, connection manager and logging loop can run
//! without hardware. Tests use the shared [`MockState`] to take the vehicle
//! off the bus, unplug ports or drop the link mid-session.

use crate::error::ObdError;
use crate::link::{AdapterLink, LinkProvider};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

const ELM_VERSION: &str = "ELM327 v1.5";
const ENGINE_TX: u32 = 0x7E8;
const TRANSMISSION_TX: u32 = 0x7E9;

/// VIN reported by the simulated vehicle
pub const MOCK_VIN: &str = "1G1JC5444R7252367";

/// Shared, inspectable state of the simulator
#[derive(Debug, Clone)]
pub struct MockState {
    /// Ports with an adapter plugged in
    pub adapter_ports: Vec<String>,
    /// Whether the vehicle answers OBD requests
    pub vehicle_on: bool,
    /// Number of `0100` probes answered with `UNABLE TO CONNECT` before the
    /// vehicle comes up
    pub probe_failures: usize,
    /// Fail the link once after this many OBD requests
    pub fail_after: Option<usize>,
    /// Battery voltage printed by `ATRV`
    pub voltage: f64,
    /// Replies per request: transmitter id and payload (echo included)
    pub responses: HashMap<String, Vec<(u32, Vec<u8>)>>,
    /// Number of links opened
    pub opens: usize,
    /// Number of OBD (non AT) requests received
    pub queries: usize,
    /// Every command line received, in order
    pub sent: Vec<String>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            adapter_ports: vec!["/dev/ttyUSB0".to_string()],
            vehicle_on: true,
            probe_failures: 0,
            fail_after: None,
            voltage: 12.6,
            responses: default_responses(),
            opens: 0,
            queries: 0,
            sent: Vec::new(),
        }
    }
}

fn default_responses() -> HashMap<String, Vec<(u32, Vec<u8>)>> {
    let mut vin = vec![0x49, 0x02, 0x01];
    vin.extend_from_slice(MOCK_VIN.as_bytes());

    let entries: Vec<(&str, Vec<(u32, Vec<u8>)>)> = vec![
        (
            "0100",
            vec![
                (ENGINE_TX, vec![0x41, 0x00, 0xBE, 0x3E, 0xB8, 0x11]),
                (TRANSMISSION_TX, vec![0x41, 0x00, 0x80, 0x10, 0x00, 0x00]),
            ],
        ),
        ("0101", vec![(ENGINE_TX, vec![0x41, 0x01, 0x00, 0x07, 0xE5, 0x00])]),
        ("0104", vec![(ENGINE_TX, vec![0x41, 0x04, 0x33])]),
        ("0105", vec![(ENGINE_TX, vec![0x41, 0x05, 0x7B])]),
        ("0106", vec![(ENGINE_TX, vec![0x41, 0x06, 0x90])]),
        ("010C", vec![(ENGINE_TX, vec![0x41, 0x0C, 0x1A, 0xF8])]),
        ("010D", vec![(ENGINE_TX, vec![0x41, 0x0D, 0x32])]),
        ("0110", vec![(ENGINE_TX, vec![0x41, 0x10, 0x01, 0xF4])]),
        ("0111", vec![(ENGINE_TX, vec![0x41, 0x11, 0x40])]),
        ("0113", vec![(ENGINE_TX, vec![0x41, 0x13, 0x03])]),
        ("0162", vec![(ENGINE_TX, vec![0x41, 0x62, 0xAF])]),
        (
            "0166",
            vec![(ENGINE_TX, vec![0x41, 0x66, 0x02, 0x00, 0x00, 0x00, 0x40])],
        ),
        (
            "01A6",
            vec![(ENGINE_TX, vec![0x41, 0xA6, 0x00, 0x01, 0x86, 0xA0])],
        ),
        ("0902", vec![(ENGINE_TX, vin)]),
    ];

    entries
        .into_iter()
        .map(|(request, replies)| (request.to_string(), replies))
        .collect()
}

/// Render one reply as CAN frames with 11 bit headers
fn can_frames(tx_id: u32, payload: &[u8], headers: bool) -> Vec<String> {
    let hex = |bytes: &[u8]| {
        bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    };
    let with_header = |body: String| {
        if headers {
            format!("{:03X} {}", tx_id, body)
        } else {
            body
        }
    };

    if payload.len() <= 7 {
        return vec![with_header(format!("{:02X} {}", payload.len(), hex(payload)))];
    }

    let mut lines = vec![with_header(format!(
        "1{:X} {:02X} {}",
        (payload.len() >> 8) & 0x0F,
        payload.len() & 0xFF,
        hex(&payload[..6])
    ))];
    for (seq, chunk) in payload[6..].chunks(7).enumerate() {
        lines.push(with_header(format!(
            "2{:X} {}",
            (seq + 1) & 0x0F,
            hex(chunk)
        )));
    }
    lines
}

/// Opens [`MockLink`]s that share one [`MockState`]
#[derive(Debug, Clone)]
pub struct MockLinkProvider {
    ports: Vec<String>,
    state: Arc<Mutex<MockState>>,
}

impl MockLinkProvider {
    /// Simulator with a single adapter on `/dev/ttyUSB0`
    pub fn new() -> Self {
        Self::with_state(MockState::default())
    }

    /// Simulator with explicit state; every adapter port is also scanned
    pub fn with_state(state: MockState) -> Self {
        let ports = state.adapter_ports.clone();
        Self {
            ports,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Add ports that show up in a scan but have nothing attached
    pub fn with_empty_ports(mut self, ports: &[&str]) -> Self {
        self.ports.extend(ports.iter().map(|p| p.to_string()));
        self
    }

    /// Snapshot of the shared state
    pub fn snapshot(&self) -> MockState {
        self.lock().clone()
    }

    /// Change the shared state
    pub fn update(&self, change: impl FnOnce(&mut MockState)) {
        change(&mut self.lock());
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockLinkProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkProvider for MockLinkProvider {
    type Link = MockLink;

    fn scan(&self) -> Vec<String> {
        let mut ports = self.ports.clone();
        ports.sort();
        ports.dedup();
        ports
    }

    async fn open(&self, port: &str, baud_rate: u32) -> Result<MockLink, ObdError> {
        debug!("Opening mock adapter {} at {} baud", port, baud_rate);
        self.lock().opens += 1;
        Ok(MockLink {
            port: port.to_string(),
            state: Arc::clone(&self.state),
            headers: false,
            closed: false,
        })
    }
}

/// One session with the simulated adapter
#[derive(Debug)]
pub struct MockLink {
    port: String,
    state: Arc<Mutex<MockState>>,
    headers: bool,
    closed: bool,
}

impl MockLink {
    fn reply(&mut self, command: &str) -> Result<Vec<String>, ObdError> {
        let shared = Arc::clone(&self.state);
        let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
        state.sent.push(command.to_string());

        if self.closed {
            return Err(ObdError::NotConnected);
        }
        if !state.adapter_ports.iter().any(|p| *p == self.port) {
            // nothing attached: the write succeeds but no prompt ever comes back
            return Err(ObdError::AdapterNotResponding);
        }

        let upper = command.trim().to_ascii_uppercase();
        if let Some(at) = upper.strip_prefix("AT") {
            return Ok(self.at_reply(at, &state));
        }

        state.queries += 1;
        if let Some(limit) = state.fail_after {
            if state.queries > limit {
                state.fail_after = None;
                return Err(ObdError::SerialError(format!(
                    "{}: device disconnected",
                    self.port
                )));
            }
        }

        // fast mode appends the expected responder count; like the real
        // adapter, stop listening after that many frames
        let (request, limit) = if upper.len() % 2 == 1 {
            let (request, count) = upper.split_at(upper.len() - 1);
            (request, count.parse::<usize>().ok())
        } else {
            (upper.as_str(), None)
        };

        if !state.vehicle_on {
            return Ok(vec!["SEARCHING...".to_string(), "UNABLE TO CONNECT".to_string()]);
        }
        if request == "0100" && state.probe_failures > 0 {
            state.probe_failures -= 1;
            return Ok(vec!["SEARCHING...".to_string(), "UNABLE TO CONNECT".to_string()]);
        }

        Ok(match state.responses.get(request) {
            Some(replies) => replies
                .iter()
                .flat_map(|(tx, payload)| can_frames(*tx, payload, self.headers))
                .take(limit.unwrap_or(usize::MAX))
                .collect(),
            None => vec!["NO DATA".to_string()],
        })
    }

    fn at_reply(&mut self, at: &str, state: &MockState) -> Vec<String> {
        let ok = vec!["OK".to_string()];
        match at {
            "Z" => {
                self.headers = false;
                vec![ELM_VERSION.to_string()]
            }
            "I" => vec![ELM_VERSION.to_string()],
            "RV" => vec![format!("{:.1}V", state.voltage)],
            "DPN" => vec!["A6".to_string()],
            "H1" => {
                self.headers = true;
                ok
            }
            "H0" => {
                self.headers = false;
                ok
            }
            _ => ok,
        }
    }
}

#[async_trait]
impl AdapterLink for MockLink {
    async fn send(&mut self, command: &str, _timeout: Duration) -> Result<Vec<String>, ObdError> {
        self.reply(command)
    }

    fn port(&self) -> &str {
        &self.port
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::parse_response;
    use crate::protocol::ObdProtocol;

    #[test]
    fn test_multi_frame_rendering_reassembles() {
        let mut payload = vec![0x49, 0x02, 0x01];
        payload.extend_from_slice(MOCK_VIN.as_bytes());

        let lines = can_frames(ENGINE_TX, &payload, true);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("7E8 10 14"));

        let messages = parse_response(&lines, ObdProtocol::Iso15765_4Can11bit500, true);
        assert_eq!(messages[0].data, payload);
    }

    #[tokio::test]
    async fn test_mock_session() {
        let provider = MockLinkProvider::new();
        let mut link = provider.open("/dev/ttyUSB0", 38400).await.unwrap();
        let timeout = Duration::from_millis(100);

        assert_eq!(link.send("ATZ", timeout).await.unwrap(), vec![ELM_VERSION]);
        assert_eq!(link.send("ATH1", timeout).await.unwrap(), vec!["OK"]);
        assert_eq!(
            link.send("010C1", timeout).await.unwrap(),
            vec!["7E8 04 41 0C 1A F8"]
        );
        assert_eq!(link.send("0142", timeout).await.unwrap(), vec!["NO DATA"]);
        assert_eq!(provider.snapshot().queries, 2);
    }

    #[tokio::test]
    async fn test_response_count_cuts_multi_frame_reply() {
        let provider = MockLinkProvider::new();
        let mut link = provider.open("/dev/ttyUSB0", 38400).await.unwrap();
        let timeout = Duration::from_millis(100);
        link.send("ATH1", timeout).await.unwrap();

        assert_eq!(link.send("0902", timeout).await.unwrap().len(), 3);
        let lines = link.send("09021", timeout).await.unwrap();
        assert_eq!(lines, vec!["7E8 10 14 49 02 01 31 47 31"]);
    }

    #[tokio::test]
    async fn test_empty_port_never_answers() {
        let provider = MockLinkProvider::new().with_empty_ports(&["/dev/ttyS0"]);
        assert_eq!(provider.scan(), vec!["/dev/ttyS0", "/dev/ttyUSB0"]);

        let mut link = provider.open("/dev/ttyS0", 38400).await.unwrap();
        let err = link.send("ATZ", Duration::from_millis(10)).await.unwrap_err();
        assert!(matches!(err, ObdError::AdapterNotResponding));
    }

    #[tokio::test]
    async fn test_link_failure_is_one_shot() {
        let provider = MockLinkProvider::new();
        provider.update(|s| s.fail_after = Some(1));
        let mut link = provider.open("/dev/ttyUSB0", 38400).await.unwrap();
        let timeout = Duration::from_millis(100);

        assert!(link.send("010C", timeout).await.is_ok());
        assert!(link.send("010C", timeout).await.is_err());
        assert!(link.send("010C", timeout).await.is_ok());
    }
}
