//! Decoded PID Values

use crate::units::Quantity;
use serde::Serialize;

/// Result of decoding one ECU message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DecodedValue {
    /// Ratio quantity (magnitude + unit)
    Scalar(Quantity),
    /// Temperature in degrees Celsius
    Temperature(f64),
    /// One entry of a fixed enumeration
    Category(String),
    /// Ordered sub-values, bit arrays and gated measurements
    FlagList(Vec<Flag>),
    /// Free text (DTC codes, CVN hex)
    RawText(String),
    /// Encoded byte string (VIN, calibration id)
    Bytes(Vec<u8>),
    /// Monitor readiness record
    Status(StatusRecord),
    /// Unsupported sensor or no data
    Absent,
}

/// One element of a [`DecodedValue::FlagList`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Flag {
    Bool(bool),
    Scalar(Quantity),
    Temperature(f64),
    Category(String),
    /// Nested group (bank of sensors), may be empty
    Group(Vec<Flag>),
    Absent,
}

impl DecodedValue {
    /// Whether the value carries no data
    pub fn is_absent(&self) -> bool {
        matches!(self, DecodedValue::Absent)
    }

    /// Build a flag list from a bit array
    pub fn bits(bits: impl IntoIterator<Item = bool>) -> Self {
        DecodedValue::FlagList(bits.into_iter().map(Flag::Bool).collect())
    }
}

impl From<Option<Quantity>> for Flag {
    fn from(value: Option<Quantity>) -> Self {
        value.map_or(Flag::Absent, Flag::Scalar)
    }
}

/// Availability and completeness of one readiness monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusTest {
    pub name: &'static str,
    pub available: bool,
    pub complete: bool,
}

impl std::fmt::Display for StatusTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Test {}: {}, {}",
            self.name,
            if self.available { "Available" } else { "Not Available" },
            if self.complete { "Complete" } else { "Incomplete" }
        )
    }
}

/// Ignition type reported in the monitor status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IgnitionType {
    Spark,
    Compression,
}

/// Decoded monitor status (mode 01 PIDs 0x01 and 0x41)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    /// Malfunction indicator lamp
    pub mil: bool,
    /// Number of stored trouble codes
    pub dtc_count: u8,
    pub ignition_type: IgnitionType,
    pub misfire_monitoring: StatusTest,
    pub fuel_system_monitoring: StatusTest,
    pub component_monitoring: StatusTest,
    /// Engine-specific monitors, depend on the ignition type
    pub engine_tests: Vec<StatusTest>,
}

impl StatusRecord {
    /// The three base monitors in their fixed reporting order
    pub fn base_tests(&self) -> [StatusTest; 3] {
        [
            self.misfire_monitoring,
            self.fuel_system_monitoring,
            self.component_monitoring,
        ]
    }
}
