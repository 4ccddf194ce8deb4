//! PID Decoders
//!
//! Every catalog entry names one [`Decoder`]. The common linear formulas are
//! data-driven variants; PIDs with a support bitfield or several sub-values
//! use [`Decoder::Custom`] with a plain function.
//!
//! All byte access goes through [`Payload`], which returns `None` past the
//! end of the payload. A short payload therefore decodes to `Absent` for the
//! unreachable sub-values instead of panicking.

use crate::catalog::CommandSpec;
use crate::error::DecodeError;
use crate::message::RawMessage;
use crate::units::{Quantity, Unit, UnitRegistry};
use crate::value::{DecodedValue, Flag, IgnitionType, StatusRecord, StatusTest};
use tracing::debug;

/// Result of running one decoder
pub type DecodeResult = Result<DecodedValue, DecodeError>;

/// Signature of hand-written decoders
pub type DecodeFn = fn(&Payload<'_>, &UnitRegistry) -> DecodeResult;

/// Decode one ECU message for a command.
///
/// Adapter error strings, empty payloads and replies that do not echo the
/// request (negative responses such as `7F 01 12`) are checked before any
/// byte is read; all decode to [`DecodedValue::Absent`].
pub fn decode(spec: &CommandSpec, message: &RawMessage, units: &UnitRegistry) -> DecodeResult {
    if message.has_error() {
        debug!("{}: adapter reported an error", spec.name);
        return Ok(DecodedValue::Absent);
    }

    let echo = spec.echo_len();
    if message.data.len() <= echo {
        debug!("{}: empty payload", spec.name);
        return Ok(DecodedValue::Absent);
    }

    let expected = spec.response_echo();
    if message.data[..echo] != expected[..] {
        debug!(
            "{}: reply {:02X?} does not answer the request",
            spec.name,
            &message.data[..echo]
        );
        return Ok(DecodedValue::Absent);
    }

    let mut end = message.data.len();
    if spec.expected_length > echo && end > spec.expected_length {
        debug!(
            "{}: message longer than expected ({} > {}), truncating",
            spec.name, end, spec.expected_length
        );
        end = spec.expected_length;
    }

    let payload = Payload::new(&message.data[echo..end]);
    spec.decoder.decode(&payload, units)
}

/// Bounds-checked view of the bytes after the mode + PID echo
#[derive(Debug, Clone, Copy)]
pub struct Payload<'a> {
    bytes: &'a [u8],
}

impl<'a> Payload<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte at `index`
    pub fn u8(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).copied()
    }

    /// Big-endian `256*high + low` starting at `index`
    pub fn u16(&self, index: usize) -> Option<u16> {
        let high = self.u8(index)?;
        let low = self.u8(index + 1)?;
        Some((u16::from(high) << 8) | u16::from(low))
    }

    /// Big-endian four byte counter starting at `index`
    pub fn u32(&self, index: usize) -> Option<u32> {
        let b0 = u32::from(self.u8(index)?);
        let b1 = u32::from(self.u8(index + 1)?);
        let b2 = u32::from(self.u8(index + 2)?);
        let b3 = u32::from(self.u8(index + 3)?);
        Some((((((b0 << 8) + b1) << 8) + b2) << 8) + b3)
    }

    /// Unsigned big-endian value of `width` bytes (1, 2 or 4)
    pub fn uint(&self, index: usize, width: usize) -> Option<u32> {
        match width {
            1 => self.u8(index).map(u32::from),
            2 => self.u16(index).map(u32::from),
            4 => self.u32(index),
            _ => None,
        }
    }

    /// Whether bit `bit` of the leading support byte is set
    pub fn supported(&self, bit: u8) -> bool {
        self.u8(0).map(|b| b & (1 << bit) != 0).unwrap_or(false)
    }

    /// Read a sub-value only when its support bit is set
    pub fn gated<T>(&self, bit: u8, read: impl FnOnce(&Self) -> Option<T>) -> Option<T> {
        if self.supported(bit) {
            read(self)
        } else {
            None
        }
    }
}

/// Closed set of decode strategies
#[derive(Clone, Copy)]
pub enum Decoder {
    /// Bit array of supported PIDs, most significant bit first
    SupportedPids,
    /// `A * 100 / 255`
    Percent,
    /// `(A - 128) * 100 / 128`
    PercentCentered,
    /// `A - 125` (torque percentages)
    TorquePercent,
    /// `uint(start, width) * scale / divisor + offset`
    Linear {
        start: usize,
        width: usize,
        scale: f64,
        divisor: f64,
        offset: f64,
        unit: Unit,
    },
    /// Same as `Linear` for Celsius values
    Temperature {
        start: usize,
        width: usize,
        scale: f64,
        divisor: f64,
        offset: f64,
    },
    /// Single byte mapped through a code table
    Lookup {
        field: &'static str,
        table: &'static [(u8, &'static str)],
    },
    /// Monitor status record
    Status,
    /// Diagnostic trouble code (`P0300`)
    Dtc,
    /// Last `n` bytes as an encoded string
    EncodedString(usize),
    /// Whole payload as text (adapter replies)
    RawString,
    /// Hand-written decoder
    Custom(DecodeFn),
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decoder::SupportedPids => write!(f, "SupportedPids"),
            Decoder::Percent => write!(f, "Percent"),
            Decoder::PercentCentered => write!(f, "PercentCentered"),
            Decoder::TorquePercent => write!(f, "TorquePercent"),
            Decoder::Linear {
                scale,
                divisor,
                offset,
                unit,
                ..
            } => write!(f, "Linear({} * x / {} + {} {:?})", scale, divisor, offset, unit),
            Decoder::Temperature {
                scale,
                divisor,
                offset,
                ..
            } => write!(f, "Temperature({} * x / {} + {})", scale, divisor, offset),
            Decoder::Lookup { field, .. } => write!(f, "Lookup({})", field),
            Decoder::Status => write!(f, "Status"),
            Decoder::Dtc => write!(f, "Dtc"),
            Decoder::EncodedString(n) => write!(f, "EncodedString({})", n),
            Decoder::RawString => write!(f, "RawString"),
            Decoder::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl Decoder {
    /// Run the strategy on a payload
    pub fn decode(&self, payload: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
        match *self {
            Decoder::SupportedPids => Ok(DecodedValue::bits(bits_msb_first(payload.bytes()))),
            Decoder::Percent => scalar(payload.u8(0).map(percent), Unit::Percent, units),
            Decoder::PercentCentered => {
                scalar(payload.u8(0).map(percent_centered), Unit::Percent, units)
            }
            Decoder::TorquePercent => {
                scalar(payload.u8(0).map(torque_percent), Unit::Percent, units)
            }
            Decoder::Linear {
                start,
                width,
                scale,
                divisor,
                offset,
                unit,
            } => {
                let value = payload
                    .uint(start, width)
                    .map(|raw| f64::from(raw) * scale / divisor + offset);
                scalar(value, unit, units)
            }
            Decoder::Temperature {
                start,
                width,
                scale,
                divisor,
                offset,
            } => match payload.uint(start, width) {
                Some(raw) => Ok(DecodedValue::Temperature(
                    units.temperature(f64::from(raw) * scale / divisor + offset)?,
                )),
                None => Ok(DecodedValue::Absent),
            },
            Decoder::Lookup { field, table } => match payload.u8(0) {
                Some(code) => Ok(DecodedValue::Category(lookup(field, table, code)?.to_string())),
                None => Ok(DecodedValue::Absent),
            },
            Decoder::Status => Ok(status(payload)),
            Decoder::Dtc => Ok(match (payload.u8(0), payload.u8(1)) {
                (Some(b1), Some(b2)) => {
                    dtc_code(b1, b2).map_or(DecodedValue::Absent, DecodedValue::RawText)
                }
                _ => DecodedValue::Absent,
            }),
            Decoder::EncodedString(length) => Ok(encoded_string(payload, length)),
            Decoder::RawString => {
                let text = String::from_utf8_lossy(payload.bytes()).trim().to_string();
                Ok(if text.is_empty() {
                    DecodedValue::Absent
                } else {
                    DecodedValue::RawText(text)
                })
            }
            Decoder::Custom(decode_fn) => decode_fn(payload, units),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared formulas
// ---------------------------------------------------------------------------

pub(crate) fn percent(raw: u8) -> f64 {
    f64::from(raw) * 100.0 / 255.0
}

pub(crate) fn percent_centered(raw: u8) -> f64 {
    (f64::from(raw) - 128.0) * 100.0 / 128.0
}

pub(crate) fn torque_percent(raw: u8) -> f64 {
    f64::from(raw) - 125.0
}

/// `Some(v)` becomes a scalar, `None` becomes `Absent`
fn scalar(value: Option<f64>, unit: Unit, units: &UnitRegistry) -> DecodeResult {
    match value {
        Some(v) => Ok(DecodedValue::Scalar(units.quantity(v, unit)?)),
        None => Ok(DecodedValue::Absent),
    }
}

/// Optional magnitude to optional quantity
pub(crate) fn quantity(
    value: Option<f64>,
    unit: Unit,
    units: &UnitRegistry,
) -> Result<Option<Quantity>, DecodeError> {
    value.map(|v| units.quantity(v, unit)).transpose()
}

/// Optional Celsius magnitude to a flag
pub(crate) fn temperature_flag(
    value: Option<f64>,
    units: &UnitRegistry,
) -> Result<Flag, DecodeError> {
    Ok(match value {
        Some(c) => Flag::Temperature(units.temperature(c)?),
        None => Flag::Absent,
    })
}

pub(crate) fn lookup(
    field: &'static str,
    table: &'static [(u8, &'static str)],
    code: u8,
) -> Result<&'static str, DecodeError> {
    table
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .ok_or(DecodeError::UnknownCode { field, code })
}

pub(crate) fn bits_msb_first(bytes: &[u8]) -> Vec<bool> {
    bytes
        .iter()
        .flat_map(|b| (0..8).rev().map(move |i| b & (1 << i) != 0))
        .collect()
}

fn encoded_string(payload: &Payload<'_>, length: usize) -> DecodedValue {
    let bytes = payload.bytes();
    if bytes.len() < length {
        return DecodedValue::Absent;
    }
    let start = bytes.len() - length;
    let text: Vec<u8> = bytes[start..]
        .iter()
        .copied()
        .skip_while(|b| *b == 0)
        .collect();

    if text.is_empty() {
        DecodedValue::Absent
    } else {
        DecodedValue::Bytes(text)
    }
}

/// Two raw bytes to a standard trouble code, `None` for `00 00`
pub fn dtc_code(b1: u8, b2: u8) -> Option<String> {
    if b1 == 0x00 && b2 == 0x00 {
        return None;
    }

    let category = match (b1 >> 6) & 0x03 {
        0 => 'P',
        1 => 'C',
        2 => 'B',
        _ => 'U',
    };

    Some(format!(
        "{}{}{:X}{:X}{:X}",
        category,
        (b1 >> 4) & 0x03,
        b1 & 0x0F,
        (b2 >> 4) & 0x0F,
        b2 & 0x0F
    ))
}

// ---------------------------------------------------------------------------
// Monitor status
// ---------------------------------------------------------------------------

const SPARK_TESTS: [Option<&str>; 8] = [
    Some("CATALYST_MONITORING"),
    Some("HEATED_CATALYST_MONITORING"),
    Some("EVAPORATIVE_SYSTEM_MONITORING"),
    Some("SECONDARY_AIR_SYSTEM_MONITORING"),
    None,
    Some("OXYGEN_SENSOR_MONITORING"),
    Some("OXYGEN_SENSOR_HEATER_MONITORING"),
    Some("EGR_VVT_SYSTEM_MONITORING"),
];

const COMPRESSION_TESTS: [Option<&str>; 8] = [
    Some("NMHC_CATALYST_MONITORING"),
    Some("NOX_SCR_AFTERTREATMENT_MONITORING"),
    None,
    Some("BOOST_PRESSURE_MONITORING"),
    None,
    Some("EXHAUST_GAS_SENSOR_MONITORING"),
    Some("PM_FILTER_MONITORING"),
    Some("EGR_VVT_SYSTEM_MONITORING"),
];

fn status(payload: &Payload<'_>) -> DecodedValue {
    let (Some(a), Some(b), Some(c), Some(d)) =
        (payload.u8(0), payload.u8(1), payload.u8(2), payload.u8(3))
    else {
        return DecodedValue::Absent;
    };

    let base = |name: &'static str, bit: u8| StatusTest {
        name,
        available: b & (1 << bit) != 0,
        complete: b & (1 << (bit + 4)) == 0,
    };

    let ignition_type = if b & 0x08 != 0 {
        IgnitionType::Compression
    } else {
        IgnitionType::Spark
    };
    let names = match ignition_type {
        IgnitionType::Spark => SPARK_TESTS,
        IgnitionType::Compression => COMPRESSION_TESTS,
    };

    let engine_tests = names
        .iter()
        .enumerate()
        .filter_map(|(bit, name)| {
            name.map(|name| StatusTest {
                name,
                available: c & (1 << bit) != 0,
                complete: d & (1 << bit) == 0,
            })
        })
        .collect();

    DecodedValue::Status(StatusRecord {
        mil: a & 0x80 != 0,
        dtc_count: a & 0x7F,
        ignition_type,
        misfire_monitoring: base("MISFIRE_MONITORING", 0),
        fuel_system_monitoring: base("FUEL_SYSTEM_MONITORING", 1),
        component_monitoring: base("COMPONENT_MONITORING", 2),
        engine_tests,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Ecu};
    use crate::message::parse_response;
    use crate::protocol::ObdProtocol;

    fn units() -> UnitRegistry {
        UnitRegistry::new()
    }

    fn magnitude(value: &DecodedValue) -> f64 {
        match value {
            DecodedValue::Scalar(q) => q.magnitude,
            DecodedValue::Temperature(c) => *c,
            other => panic!("not numeric: {:?}", other),
        }
    }

    #[test]
    fn test_payload_bounds() {
        let payload = Payload::new(&[0x01, 0x2C]);
        assert_eq!(payload.u16(0), Some(300));
        assert_eq!(payload.u16(1), None);
        assert_eq!(payload.u32(0), None);
        assert_eq!(payload.u8(5), None);
    }

    #[test]
    fn test_four_byte_combine() {
        let payload = Payload::new(&[0x00, 0x01, 0x00, 0x02]);
        assert_eq!(payload.u32(0), Some(65538));
    }

    #[test]
    fn test_percent_exact_bounds() {
        let value = Decoder::Percent
            .decode(&Payload::new(&[0xFF]), &units())
            .unwrap();
        assert_eq!(magnitude(&value), 100.0);

        let value = Decoder::Percent
            .decode(&Payload::new(&[0x00]), &units())
            .unwrap();
        assert_eq!(magnitude(&value), 0.0);
    }

    #[test]
    fn test_two_byte_scaled() {
        let decoder = Decoder::Linear {
            start: 0,
            width: 2,
            scale: 1.0,
            divisor: 5.0,
            offset: 0.0,
            unit: Unit::KilogramsPerSecond,
        };
        let value = decoder
            .decode(&Payload::new(&[0x01, 0x2C]), &units())
            .unwrap();
        assert_eq!(
            value,
            DecodedValue::Scalar(Quantity {
                magnitude: 60.0,
                unit: Unit::KilogramsPerSecond
            })
        );
    }

    #[test]
    fn test_linear_short_payload_is_absent() {
        let decoder = Decoder::Linear {
            start: 0,
            width: 2,
            scale: 1.0,
            divisor: 4.0,
            offset: 0.0,
            unit: Unit::Rpm,
        };
        let value = decoder.decode(&Payload::new(&[0x1A]), &units()).unwrap();
        assert!(value.is_absent());
    }

    #[test]
    fn test_negative_response_is_absent() {
        let catalog = Catalog::new();
        let spec = catalog.lookup("ENGINE_LOAD").unwrap();

        let message = RawMessage::from_bytes(Ecu::Engine, vec![0x7F, 0x01, 0x12]);
        assert!(decode(spec, &message, &units()).unwrap().is_absent());

        // right mode, other PID
        let message = RawMessage::from_bytes(Ecu::Engine, vec![0x41, 0x05, 0x7B]);
        assert!(decode(spec, &message, &units()).unwrap().is_absent());

        let message = RawMessage::from_bytes(Ecu::Engine, vec![0x41, 0x04, 0xFF]);
        assert!((magnitude(&decode(spec, &message, &units()).unwrap()) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_vin_cut_after_first_frame_is_absent() {
        let catalog = Catalog::new();
        let spec = catalog.lookup("VIN").unwrap();
        let lines = vec!["7E8 10 14 49 02 01 31 47 31".to_string()];
        let messages = parse_response(&lines, ObdProtocol::Iso15765_4Can11bit500, true);

        let value = decode(spec, &messages[0], &units()).unwrap();
        assert!(value.is_absent());
    }

    #[test]
    fn test_encoded_string_shorter_than_field_is_absent() {
        let value = Decoder::EncodedString(17)
            .decode(&Payload::new(&[0x01, 0x31, 0x47, 0x31]), &units())
            .unwrap();
        assert!(value.is_absent());
    }

    #[test]
    fn test_temperature_offset() {
        let decoder = Decoder::Temperature {
            start: 0,
            width: 1,
            scale: 1.0,
            divisor: 1.0,
            offset: -40.0,
        };
        let value = decoder.decode(&Payload::new(&[0x73]), &units()).unwrap();
        assert_eq!(value, DecodedValue::Temperature(75.0));
    }

    #[test]
    fn test_fuel_trim_centered() {
        let value = Decoder::PercentCentered
            .decode(&Payload::new(&[0x90]), &units())
            .unwrap();
        assert!((magnitude(&value) - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_lookup_unknown_code() {
        const TABLE: [(u8, &str); 1] = [(1, "one")];
        let decoder = Decoder::Lookup {
            field: "test",
            table: &TABLE,
        };
        assert_eq!(
            decoder.decode(&Payload::new(&[1]), &units()).unwrap(),
            DecodedValue::Category("one".to_string())
        );
        assert_eq!(
            decoder.decode(&Payload::new(&[2]), &units()).unwrap_err(),
            DecodeError::UnknownCode {
                field: "test",
                code: 2
            }
        );
    }

    #[test]
    fn test_supported_pids_bit_order() {
        let value = Decoder::SupportedPids
            .decode(&Payload::new(&[0x80, 0x00, 0x00, 0x01]), &units())
            .unwrap();
        let DecodedValue::FlagList(flags) = value else {
            panic!("expected flags");
        };
        assert_eq!(flags.len(), 32);
        assert_eq!(flags[0], Flag::Bool(true));
        assert_eq!(flags[31], Flag::Bool(true));
        assert_eq!(flags[1], Flag::Bool(false));
    }

    #[test]
    fn test_status_record() {
        // MIL on, 3 DTCs, spark, misfire available + incomplete
        let value = Decoder::Status
            .decode(&Payload::new(&[0x83, 0x17, 0x01, 0x00]), &units())
            .unwrap();
        let DecodedValue::Status(record) = value else {
            panic!("expected status");
        };
        assert!(record.mil);
        assert_eq!(record.dtc_count, 3);
        assert_eq!(record.ignition_type, IgnitionType::Spark);
        assert!(record.misfire_monitoring.available);
        assert!(!record.misfire_monitoring.complete);
        assert!(record.fuel_system_monitoring.available);
        assert!(record.fuel_system_monitoring.complete);
        assert_eq!(record.engine_tests.len(), 7);
        assert!(record.engine_tests[0].available);
    }

    #[test]
    fn test_dtc_code() {
        assert_eq!(dtc_code(0x03, 0x00), Some("P0300".to_string()));
        assert_eq!(dtc_code(0x41, 0x23), Some("C0123".to_string()));
        assert_eq!(dtc_code(0x00, 0x00), None);
    }

    #[test]
    fn test_encoded_string_strips_padding() {
        let mut bytes = vec![0x01];
        bytes.extend_from_slice(b"1G1JC5444R7252367");
        let value = Decoder::EncodedString(17)
            .decode(&Payload::new(&bytes), &units())
            .unwrap();
        assert_eq!(value, DecodedValue::Bytes(b"1G1JC5444R7252367".to_vec()));

        let value = Decoder::EncodedString(17)
            .decode(&Payload::new(&[0x00, 0x00]), &units())
            .unwrap();
        assert!(value.is_absent());
    }
}
