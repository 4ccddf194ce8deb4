//! OBD-II Error Types

use thiserror::Error;

/// Errors that can occur while talking to an ELM327 adapter
#[derive(Debug, Error)]
pub enum ObdError {
    /// Serial port connection error
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// Timeout waiting for response
    #[error("Timeout waiting for OBD response after {0}ms")]
    Timeout(u64),

    /// Invalid response from adapter
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Protocol not supported
    #[error("Protocol not supported: {0}")]
    UnsupportedProtocol(String),

    /// Adapter not responding
    #[error("OBD adapter not responding")]
    AdapterNotResponding,

    /// Link closed or never opened
    #[error("OBD adapter is not connected")]
    NotConnected,

    /// Vehicle not connected
    #[error("Vehicle ignition is off or not connected")]
    VehicleNotConnected,
}

impl From<std::io::Error> for ObdError {
    fn from(err: std::io::Error) -> Self {
        ObdError::SerialError(err.to_string())
    }
}

impl From<tokio_serial::Error> for ObdError {
    fn from(err: tokio_serial::Error) -> Self {
        ObdError::SerialError(err.to_string())
    }
}

/// Errors raised by a decoder.
///
/// Short or missing data is never an error; it decodes to `Absent`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The PID table itself is inconsistent (bad unit arithmetic)
    #[error("Decoder definition error: {0}")]
    Definition(String),

    /// A categorical field carried a code outside its table
    #[error("{field}: code {code:#04x} is not defined")]
    UnknownCode { field: &'static str, code: u8 },
}

impl DecodeError {
    /// Whether this error points at a defect in the PID table
    pub fn is_definition(&self) -> bool {
        matches!(self, DecodeError::Definition(_))
    }
}
