//! OBD-II Protocol Implementation
//!
//! This crate provides async serial communication with ELM327-compatible
//! OBD-II adapters, the static command catalog, and the decoders that turn
//! raw ECU replies into typed measurements.

pub mod catalog;
mod client;
mod connection;
pub mod decoders;
mod error;
pub mod extended;
pub mod link;
mod message;
pub mod mock;
mod protocol;
pub mod standard;
pub mod units;
mod value;

pub use catalog::{Catalog, CommandSource, CommandSpec, Ecu};
pub use client::{ClientOptions, ObdClient, ObdStatus};
pub use connection::{
    ConnectionError, ConnectionManager, QueryError, RetryPolicy, CONNECTION_RETRY_COUNT,
    CONNECTION_WAIT_DELAY, UNKNOWN_VIN,
};
pub use decoders::{decode, Decoder, Payload};
pub use error::{DecodeError, ObdError};
pub use link::{AdapterLink, LinkProvider, SerialLink, SerialLinkProvider};
pub use message::{parse_response, Frame, RawMessage, ERROR_MARKERS};
pub use mock::{MockLinkProvider, MockState, MOCK_VIN};
pub use protocol::{ObdProtocol, BAUD_RATE_CANDIDATES};
pub use units::{Quantity, Unit, UnitKind, UnitRegistry};
pub use value::{DecodedValue, Flag, IgnitionType, StatusRecord, StatusTest};

/// OBD-II mode constants
pub mod mode {
    /// Current data
    pub const CURRENT_DATA: u8 = 0x01;
    /// Vehicle information
    pub const VEHICLE_INFO: u8 = 0x09;
}
