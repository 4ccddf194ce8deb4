//! Connection Manager
//!
//! Owns the one live [`ObdClient`], finds an adapter with a responding
//! vehicle, and replaces the client whenever the link drops. Commands are
//! executed by name and come back decoded.

use crate::catalog::{Catalog, CommandSpec, Ecu};
use crate::client::{ClientOptions, ObdClient, ObdStatus};
use crate::decoders::decode;
use crate::error::{DecodeError, ObdError};
use crate::link::LinkProvider;
use crate::message::RawMessage;
use crate::units::UnitRegistry;
use crate::value::DecodedValue;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Connection attempts per port before moving to the next one
pub const CONNECTION_RETRY_COUNT: usize = 5;

/// Pause between connection attempts on the same port
pub const CONNECTION_WAIT_DELAY: Duration = Duration::from_secs(15);

/// Reported when the vehicle does not answer the VIN request
pub const UNKNOWN_VIN: &str = "UNKNOWN_VIN";

const UNKNOWN: &str = "unknown";

/// Errors while establishing a connection
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Every candidate port was tried and none produced a vehicle connection
    #[error("No OBD adapter with a responding vehicle on ports {ports:?}")]
    AdapterUnavailable { ports: Vec<String> },
}

/// Errors from executing one named command
#[derive(Debug, Error)]
pub enum QueryError {
    /// The command table is inconsistent; reconnecting will not help
    #[error("{command}: {source}")]
    Definition { command: String, source: DecodeError },

    /// The ECU sent a value the decoder has no meaning for
    #[error("{command}: {source}")]
    Decode { command: String, source: DecodeError },

    /// The link dropped; a new connection was made before returning
    #[error("{command}: link lost: {source}")]
    Link { command: String, source: ObdError },

    /// The link dropped and no adapter could be found again
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// How hard discovery tries before giving up
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts per port
    pub attempts: usize,
    /// Pause between attempts and before rediscovery
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: CONNECTION_RETRY_COUNT,
            delay: CONNECTION_WAIT_DELAY,
        }
    }
}

/// Executes catalog commands over a self-healing adapter connection
pub struct ConnectionManager<P: LinkProvider> {
    provider: P,
    options: ClientOptions,
    retry: RetryPolicy,
    client: ObdClient<P::Link>,
    catalog: Catalog,
    units: UnitRegistry,
}

impl<P: LinkProvider> ConnectionManager<P> {
    /// Discover an adapter and connect to the vehicle behind it
    pub async fn connect(
        provider: P,
        options: ClientOptions,
        retry: RetryPolicy,
    ) -> Result<Self, ConnectionError> {
        let client = discover(&provider, &options, retry).await?;
        Ok(Self {
            provider,
            options,
            retry,
            client,
            catalog: Catalog::new(),
            units: UnitRegistry::new(),
        })
    }

    /// Execute the command called `name`.
    ///
    /// Returns `Ok(None)` for names neither catalog knows. A missing or
    /// error reply decodes to [`DecodedValue::Absent`].
    pub async fn execute(&mut self, name: &str) -> Result<Option<DecodedValue>, QueryError> {
        let Some(spec) = self.catalog.lookup(name) else {
            warn!("Unknown command {}, skipping", name);
            return Ok(None);
        };

        let messages = match self.client.query(spec).await {
            Ok(messages) if spec.is_adapter() || self.client.is_connected() => messages,
            Ok(_) => {
                let source = ObdError::VehicleNotConnected;
                return Err(self.recover(spec, source).await);
            }
            Err(source) => return Err(self.recover(spec, source).await),
        };

        let Some(message) = select_message(spec, messages) else {
            debug!("{}: no reply from {:?}", spec.name, spec.target_ecu);
            return Ok(Some(DecodedValue::Absent));
        };

        match decode(spec, &message, &self.units) {
            Ok(value) => Ok(Some(value)),
            Err(source) if source.is_definition() => {
                error!("{}: decoder definition error: {}", spec.name, source);
                Err(QueryError::Definition {
                    command: spec.name.to_string(),
                    source,
                })
            }
            Err(source) => {
                warn!("{}: {} (raw {:?})", spec.name, source, message.frames);
                Err(QueryError::Decode {
                    command: spec.name.to_string(),
                    source,
                })
            }
        }
    }

    /// Tear the link down, wait, and rediscover.
    ///
    /// Returns the error the caller reports for the failed command.
    async fn recover(&mut self, spec: &CommandSpec, source: ObdError) -> QueryError {
        warn!(
            "{}: link to {} lost ({}), reconnecting in {:?}",
            spec.name,
            self.client.port(),
            source,
            self.retry.delay
        );
        self.client.close().await;
        tokio::time::sleep(self.retry.delay).await;

        match discover(&self.provider, &self.options, self.retry).await {
            Ok(client) => {
                info!("Reconnected on {}", client.port());
                self.client = client;
                QueryError::Link {
                    command: spec.name.to_string(),
                    source,
                }
            }
            Err(e) => {
                error!("Reconnection failed: {}", e);
                QueryError::Connection(e)
            }
        }
    }

    /// Vehicle identification number, or [`UNKNOWN_VIN`]
    pub async fn vin(&mut self) -> Result<String, QueryError> {
        let vin = match self.execute("VIN").await {
            Ok(Some(DecodedValue::Bytes(bytes))) => {
                let text = String::from_utf8_lossy(&bytes);
                text.trim_matches(|c: char| c == '\0' || c.is_whitespace())
                    .to_string()
            }
            Ok(Some(DecodedValue::RawText(text))) => text.trim().to_string(),
            Ok(_) | Err(QueryError::Decode { .. }) => String::new(),
            Err(e) => return Err(e),
        };

        if vin.is_empty() {
            warn!("Vehicle did not report a VIN, using {}", UNKNOWN_VIN);
            return Ok(UNKNOWN_VIN.to_string());
        }
        info!("VIN: {}", vin);
        Ok(vin)
    }

    /// Adapter firmware version and battery voltage as reported by the adapter
    pub async fn elm_info(&mut self) -> Result<(String, String), QueryError> {
        let version = self.adapter_text("ELM_VERSION").await?;
        let voltage = self.adapter_text("ELM_VOLTAGE").await?;
        info!("Adapter {} at {}", version, voltage);
        Ok((version, voltage))
    }

    async fn adapter_text(&mut self, name: &str) -> Result<String, QueryError> {
        let text = match self.execute(name).await? {
            Some(DecodedValue::RawText(text)) if !text.is_empty() => text,
            Some(DecodedValue::Scalar(quantity)) => self.units.render(&quantity),
            _ => UNKNOWN.to_string(),
        };
        Ok(text)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn units(&self) -> &UnitRegistry {
        &self.units
    }

    pub fn status(&self) -> ObdStatus {
        self.client.status()
    }

    /// Port of the current connection
    pub fn port(&self) -> &str {
        self.client.port()
    }

    /// Close the current connection
    pub async fn close(&mut self) {
        self.client.close().await;
    }
}

/// Try every port in order until one yields a vehicle connection
async fn discover<P: LinkProvider>(
    provider: &P,
    options: &ClientOptions,
    retry: RetryPolicy,
) -> Result<ObdClient<P::Link>, ConnectionError> {
    let ports = provider.scan();
    info!("Scanning {} candidate ports: {:?}", ports.len(), ports);

    for port in &ports {
        for attempt in 1..=retry.attempts {
            let mut client = ObdClient::connect(provider, port, options.clone()).await;
            match client.status() {
                ObdStatus::CarConnected => return Ok(client),
                ObdStatus::NotConnected => {
                    warn!("No adapter on {}, trying next port", port);
                    break;
                }
                ObdStatus::ElmConnected => {
                    warn!(
                        "Adapter on {} found no vehicle (attempt {}/{})",
                        port, attempt, retry.attempts
                    );
                    client.close().await;
                    if attempt < retry.attempts {
                        tokio::time::sleep(retry.delay).await;
                    }
                }
            }
        }
    }

    error!("No vehicle connection on any port");
    Err(ConnectionError::AdapterUnavailable { ports })
}

/// Pick the reply that answers `spec`
fn select_message(spec: &CommandSpec, mut messages: Vec<RawMessage>) -> Option<RawMessage> {
    if let Some(pos) = messages.iter().position(|m| m.ecu == spec.target_ecu) {
        return Some(messages.swap_remove(pos));
    }
    let any_reply = matches!(spec.target_ecu, Ecu::All | Ecu::Adapter) || messages.len() == 1;
    if any_reply && !messages.is_empty() {
        return Some(messages.swap_remove(0));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockLinkProvider, MockState, MOCK_VIN};
    use crate::units::Unit;

    fn options() -> ClientOptions {
        ClientOptions {
            timeout: Duration::from_millis(100),
            ..ClientOptions::default()
        }
    }

    async fn connected(provider: &MockLinkProvider) -> ConnectionManager<MockLinkProvider> {
        ConnectionManager::connect(provider.clone(), options(), RetryPolicy::default())
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_every_port() {
        let provider = MockLinkProvider::with_state(MockState {
            adapter_ports: vec!["/dev/ttyUSB0".to_string(), "/dev/ttyUSB1".to_string()],
            vehicle_on: false,
            ..MockState::default()
        });

        let result =
            ConnectionManager::connect(provider.clone(), options(), RetryPolicy::default()).await;
        match result {
            Err(ConnectionError::AdapterUnavailable { ports }) => {
                assert_eq!(ports, vec!["/dev/ttyUSB0", "/dev/ttyUSB1"]);
            }
            Ok(_) => panic!("expected AdapterUnavailable"),
        }
        assert_eq!(provider.snapshot().opens, 2 * CONNECTION_RETRY_COUNT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skips_port_without_adapter() {
        let provider = MockLinkProvider::new().with_empty_ports(&["/dev/ttyS0"]);
        let manager = connected(&provider).await;
        assert_eq!(manager.port(), "/dev/ttyUSB0");
        assert_eq!(manager.status(), ObdStatus::CarConnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_vehicle_answers() {
        let provider = MockLinkProvider::with_state(MockState {
            probe_failures: 2,
            ..MockState::default()
        });
        let manager = connected(&provider).await;
        assert_eq!(manager.status(), ObdStatus::CarConnected);
        assert_eq!(provider.snapshot().opens, 3);
    }

    #[tokio::test]
    async fn test_execute_decodes() {
        let provider = MockLinkProvider::new();
        let mut manager = connected(&provider).await;

        let value = manager.execute("RPM").await.unwrap().unwrap();
        match value {
            DecodedValue::Scalar(q) => {
                assert_eq!(q.unit, Unit::Rpm);
                assert!((q.magnitude - 1726.0).abs() < 1e-9);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_name_is_skipped() {
        let provider = MockLinkProvider::new();
        let mut manager = connected(&provider).await;
        let queries = provider.snapshot().queries;

        assert!(manager.execute("NOT_A_COMMAND").await.unwrap().is_none());
        assert_eq!(provider.snapshot().queries, queries);
    }

    #[tokio::test]
    async fn test_no_data_is_absent() {
        let provider = MockLinkProvider::new();
        let mut manager = connected(&provider).await;
        let value = manager.execute("FUEL_PRESSURE").await.unwrap();
        assert_eq!(value, Some(DecodedValue::Absent));
    }

    #[tokio::test(start_paused = true)]
    async fn test_link_failure_recovers() {
        let provider = MockLinkProvider::new();
        let mut manager = connected(&provider).await;
        let opens = provider.snapshot().opens;
        provider.update(|s| s.fail_after = Some(s.queries));

        let err = manager.execute("SPEED").await.unwrap_err();
        assert!(matches!(err, QueryError::Link { ref command, .. } if command == "SPEED"));
        assert_eq!(provider.snapshot().opens, opens + 1);

        // the next command runs on the new connection
        assert!(manager.execute("SPEED").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovery_fails_without_adapter() {
        let provider = MockLinkProvider::new();
        let mut manager = connected(&provider).await;
        provider.update(|s| {
            s.fail_after = Some(s.queries);
            s.adapter_ports.clear();
        });

        let err = manager.execute("SPEED").await.unwrap_err();
        assert!(matches!(
            err,
            QueryError::Connection(ConnectionError::AdapterUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_vin_and_adapter_info() {
        let provider = MockLinkProvider::new();
        let mut manager = connected(&provider).await;

        assert_eq!(manager.vin().await.unwrap(), MOCK_VIN);
        let (version, voltage) = manager.elm_info().await.unwrap();
        assert_eq!(version, "ELM327 v1.5");
        assert_eq!(voltage, "12.6 volt");
    }

    #[tokio::test]
    async fn test_missing_vin_falls_back() {
        let provider = MockLinkProvider::new();
        provider.update(|s| {
            s.responses.remove("0902");
        });
        let mut manager = connected(&provider).await;
        assert_eq!(manager.vin().await.unwrap(), UNKNOWN_VIN);
    }

    #[test]
    fn test_select_message_prefers_target() {
        let catalog = Catalog::new();
        let spec = catalog.lookup("RPM").unwrap();
        let messages = vec![
            RawMessage::from_bytes(Ecu::Transmission, vec![0x41, 0x0C, 0x00, 0x00]),
            RawMessage::from_bytes(Ecu::Engine, vec![0x41, 0x0C, 0x1A, 0xF8]),
        ];
        let selected = select_message(spec, messages).unwrap();
        assert_eq!(selected.ecu, Ecu::Engine);
    }

    #[test]
    fn test_select_message_ambiguous_reply() {
        let catalog = Catalog::new();
        let spec = catalog.lookup("RPM").unwrap();
        let messages = vec![
            RawMessage::from_bytes(Ecu::Transmission, vec![0x41, 0x0C, 0x00, 0x00]),
            RawMessage::from_bytes(Ecu::Other(0x7EA), vec![0x41, 0x0C, 0x00, 0x00]),
        ];
        assert!(select_message(spec, messages).is_none());
    }
}
