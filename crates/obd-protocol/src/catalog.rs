//! Command Catalog
//!
//! Static tables of every known command. The built-in table holds the
//! standard mode 01 / mode 09 PIDs and adapter commands; the custom table
//! holds the extended PIDs. Lookups try built-in first, then custom.

use crate::decoders::Decoder;
use crate::units::Unit;
use crate::{extended, standard};
use serde::Serialize;
use std::collections::HashMap;

/// ECU a request targets, or the ECU a reply came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Ecu {
    /// Any responding ECU
    All,
    Engine,
    Transmission,
    /// The ELM327 itself (AT commands)
    Adapter,
    /// Other bus address
    Other(u32),
    /// Reply without a header
    Unknown,
}

impl Ecu {
    /// Whether a reply from `source` satisfies a request targeting `self`
    pub fn accepts(&self, source: Ecu) -> bool {
        match self {
            Ecu::All => true,
            target => *target == source,
        }
    }
}

/// Immutable definition of one command
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    /// Unique key used in schedule files
    pub name: &'static str,
    pub description: &'static str,
    /// Mode + PID bytes, or ASCII text for adapter commands
    pub request: &'static [u8],
    /// Reply length in bytes, including the mode + PID echo
    pub expected_length: usize,
    pub decoder: Decoder,
    pub target_ecu: Ecu,
    /// Allow the adapter to stop waiting once enough ECUs replied
    pub fast: bool,
}

impl CommandSpec {
    /// Engine-targeted, fast-capable command
    pub const fn new(
        name: &'static str,
        description: &'static str,
        request: &'static [u8],
        expected_length: usize,
        decoder: Decoder,
    ) -> Self {
        Self {
            name,
            description,
            request,
            expected_length,
            decoder,
            target_ecu: Ecu::Engine,
            fast: true,
        }
    }

    /// Change the target ECU
    pub const fn ecu(self, target_ecu: Ecu) -> Self {
        Self { target_ecu, ..self }
    }

    /// Disable fast mode for this command
    pub const fn slow(self) -> Self {
        Self { fast: false, ..self }
    }

    /// Whether this command is answered by the adapter itself
    pub fn is_adapter(&self) -> bool {
        self.target_ecu == Ecu::Adapter
    }

    /// Length of the mode + PID echo at the front of every reply
    pub fn echo_len(&self) -> usize {
        if self.is_adapter() {
            0
        } else {
            self.request.len()
        }
    }

    /// Echo a positive reply starts with (`41 0C` for `01 0C`), empty for
    /// adapter commands
    pub fn response_echo(&self) -> Vec<u8> {
        if self.is_adapter() {
            return Vec::new();
        }
        let mut echo = self.request.to_vec();
        if let Some(mode) = echo.first_mut() {
            *mode = mode.wrapping_add(0x40);
        }
        echo
    }

    /// Text sent to the adapter, e.g. `"010C"` or `"ATRV"`
    pub fn request_text(&self) -> String {
        if self.is_adapter() {
            String::from_utf8_lossy(self.request).into_owned()
        } else {
            self.request.iter().map(|b| format!("{:02X}", b)).collect()
        }
    }

    /// OBD mode byte, `None` for adapter commands
    pub fn mode(&self) -> Option<u8> {
        if self.is_adapter() {
            None
        } else {
            self.request.first().copied()
        }
    }

    /// PID byte, `None` for adapter commands
    pub fn pid(&self) -> Option<u8> {
        if self.is_adapter() {
            None
        } else {
            self.request.get(1).copied()
        }
    }
}

/// Where a command was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommandSource {
    BuiltIn,
    Custom,
}

/// Name-indexed view over the built-in and custom tables
#[derive(Debug, Clone)]
pub struct Catalog {
    builtin: &'static [CommandSpec],
    custom: &'static [CommandSpec],
    builtin_index: HashMap<&'static str, usize>,
    custom_index: HashMap<&'static str, usize>,
}

impl Catalog {
    /// Catalog over the standard and extended tables
    pub fn new() -> Self {
        Self::with_tables(standard::COMMANDS, extended::COMMANDS)
    }

    /// Catalog over arbitrary tables
    pub fn with_tables(builtin: &'static [CommandSpec], custom: &'static [CommandSpec]) -> Self {
        let index = |table: &'static [CommandSpec]| {
            table
                .iter()
                .enumerate()
                .map(|(i, spec)| (spec.name, i))
                .collect::<HashMap<_, _>>()
        };

        Self {
            builtin,
            custom,
            builtin_index: index(builtin),
            custom_index: index(custom),
        }
    }

    /// Find a command, built-in table first
    pub fn lookup(&self, name: &str) -> Option<&'static CommandSpec> {
        self.lookup_with_source(name).map(|(spec, _)| spec)
    }

    /// Find a command and report which table it came from
    pub fn lookup_with_source(&self, name: &str) -> Option<(&'static CommandSpec, CommandSource)> {
        let builtin: &'static [CommandSpec] = self.builtin;
        let custom: &'static [CommandSpec] = self.custom;

        if let Some(&i) = self.builtin_index.get(name) {
            return Some((&builtin[i], CommandSource::BuiltIn));
        }
        self.custom_index
            .get(name)
            .map(|&i| (&custom[i], CommandSource::Custom))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builtin_index.contains_key(name) || self.custom_index.contains_key(name)
    }

    pub fn builtin(&self) -> &'static [CommandSpec] {
        self.builtin
    }

    pub fn custom(&self) -> &'static [CommandSpec] {
        self.custom
    }

    /// Every command, built-in table order followed by custom table order
    pub fn all(&self) -> impl Iterator<Item = &'static CommandSpec> {
        let builtin: &'static [CommandSpec] = self.builtin;
        let custom: &'static [CommandSpec] = self.custom;
        builtin.iter().chain(custom.iter())
    }

    pub fn len(&self) -> usize {
        self.builtin.len() + self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Custom commands shadowed by a built-in command of the same name
    pub fn duplicate_names(&self) -> Vec<&'static str> {
        self.custom
            .iter()
            .filter(|spec| self.builtin_index.contains_key(spec.name))
            .map(|spec| spec.name)
            .collect()
    }

    /// Custom commands sending the same request as a built-in command,
    /// as `(custom name, built-in name)`
    pub fn shared_requests(&self) -> Vec<(&'static str, &'static str)> {
        self.custom
            .iter()
            .filter_map(|spec| {
                self.builtin
                    .iter()
                    .find(|b| b.request == spec.request)
                    .map(|b| (spec.name, b.name))
            })
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

/// `uint * scale / divisor + offset` starting right after the echo
pub(crate) const fn linear(
    width: usize,
    scale: f64,
    divisor: f64,
    offset: f64,
    unit: Unit,
) -> Decoder {
    Decoder::Linear {
        start: 0,
        width,
        scale,
        divisor,
        offset,
        unit,
    }
}

/// Same as [`linear`] starting at byte `start`
pub(crate) const fn linear_at(
    start: usize,
    width: usize,
    scale: f64,
    divisor: f64,
    offset: f64,
    unit: Unit,
) -> Decoder {
    Decoder::Linear {
        start,
        width,
        scale,
        divisor,
        offset,
        unit,
    }
}

/// Celsius value with the conventional 40 degree offset
pub(crate) const fn celsius(width: usize, divisor: f64) -> Decoder {
    Decoder::Temperature {
        start: 0,
        width,
        scale: 1.0,
        divisor,
        offset: -40.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoders::decode;
    use crate::message::RawMessage;
    use crate::units::UnitRegistry;
    use crate::value::DecodedValue;
    use proptest::prelude::*;

    #[test]
    fn test_names_are_unique() {
        let catalog = Catalog::new();
        let mut seen = std::collections::HashSet::new();
        for spec in catalog.all() {
            assert!(seen.insert(spec.name), "duplicate command {}", spec.name);
        }
        assert!(catalog.duplicate_names().is_empty());
    }

    #[test]
    fn test_lookup_order() {
        let catalog = Catalog::new();
        let (spec, source) = catalog.lookup_with_source("RPM").unwrap();
        assert_eq!(spec.request, &[0x01, 0x0C]);
        assert_eq!(source, CommandSource::BuiltIn);

        let (spec, source) = catalog.lookup_with_source("ODOMETER").unwrap();
        assert_eq!(spec.request_text(), "01A6");
        assert_eq!(source, CommandSource::Custom);

        assert!(catalog.lookup("NOT_A_COMMAND").is_none());
    }

    #[test]
    fn test_adapter_command_request() {
        let catalog = Catalog::new();
        let spec = catalog.lookup("ELM_VOLTAGE").unwrap();
        assert!(spec.is_adapter());
        assert_eq!(spec.request_text(), "ATRV");
        assert_eq!(spec.echo_len(), 0);
        assert_eq!(spec.mode(), None);
    }

    #[test]
    fn test_vehicle_commands_use_known_modes() {
        let catalog = Catalog::new();
        for spec in catalog.all().filter(|s| !s.is_adapter()) {
            assert!(
                matches!(
                    spec.mode(),
                    Some(crate::mode::CURRENT_DATA | crate::mode::VEHICLE_INFO)
                ),
                "{} uses mode {:?}",
                spec.name,
                spec.mode()
            );
            assert!(spec.pid().is_some());
        }
    }

    #[test]
    fn test_no_data_is_absent_for_every_command() {
        let catalog = Catalog::new();
        let units = UnitRegistry::new();
        for spec in catalog.all() {
            let message = RawMessage::from_text(spec.target_ecu, "NO DATA");
            let value = decode(spec, &message, &units).unwrap();
            assert_eq!(value, DecodedValue::Absent, "{}", spec.name);
        }
    }

    #[test]
    fn test_echo_only_is_absent_for_every_command() {
        let catalog = Catalog::new();
        let units = UnitRegistry::new();
        for spec in catalog.all() {
            let message = RawMessage::from_bytes(spec.target_ecu, spec.response_echo());
            let value = decode(spec, &message, &units).unwrap();
            assert_eq!(value, DecodedValue::Absent, "{}", spec.name);
        }
    }

    #[test]
    fn test_response_echo() {
        let catalog = Catalog::new();
        assert_eq!(catalog.lookup("RPM").unwrap().response_echo(), vec![0x41, 0x0C]);
        assert_eq!(catalog.lookup("VIN").unwrap().response_echo(), vec![0x49, 0x02]);
        assert!(catalog.lookup("ELM_VERSION").unwrap().response_echo().is_empty());
    }

    #[test]
    fn test_shared_requests_are_reported() {
        static BUILTIN: [CommandSpec; 1] = [CommandSpec::new(
            "SPEED",
            "Vehicle speed",
            &[0x01, 0x0D],
            3,
            linear(1, 1.0, 1.0, 0.0, Unit::KilometersPerHour),
        )];
        static CUSTOM: [CommandSpec; 2] = [
            CommandSpec::new(
                "SPEED",
                "Shadowed",
                &[0x01, 0x0D],
                3,
                linear(1, 1.0, 1.0, 0.0, Unit::KilometersPerHour),
            ),
            CommandSpec::new(
                "VEHICLE_SPEED",
                "Same request, other name",
                &[0x01, 0x0D],
                3,
                linear(1, 1.0, 1.0, 0.0, Unit::KilometersPerHour),
            ),
        ];

        let catalog = Catalog::with_tables(&BUILTIN, &CUSTOM);
        assert_eq!(catalog.duplicate_names(), vec!["SPEED"]);
        assert_eq!(
            catalog.shared_requests(),
            vec![("SPEED", "SPEED"), ("VEHICLE_SPEED", "SPEED")]
        );
        assert_eq!(catalog.lookup("SPEED").unwrap().description, "Vehicle speed");
    }

    proptest! {
        #[test]
        fn prop_decoders_never_panic(
            index in 0usize..512,
            bytes in proptest::collection::vec(any::<u8>(), 0..40),
        ) {
            let catalog = Catalog::new();
            let units = UnitRegistry::new();
            let specs: Vec<_> = catalog.all().collect();
            let spec = specs[index % specs.len()];

            let mut data = spec.response_echo();
            data.extend_from_slice(&bytes);
            let message = RawMessage::from_bytes(spec.target_ecu, data);

            match decode(spec, &message, &units) {
                Ok(_) => {}
                Err(err) => prop_assert!(!err.is_definition(), "{}: {}", spec.name, err),
            }
        }
    }
}
