//! Built-in command table
//!
//! Standard mode 01 PIDs (0x00 - 0x60), mode 09 vehicle information and
//! the two adapter commands the logger reports at startup.

use crate::catalog::{celsius, linear, linear_at, CommandSpec, Ecu};
use crate::decoders::{
    bits_msb_first, lookup, percent_centered, quantity, DecodeResult, Decoder, Payload,
};
use crate::error::DecodeError;
use crate::units::{Unit, UnitRegistry};
use crate::value::{DecodedValue, Flag};

const FUEL_STATUS: [(u8, &str); 5] = [
    (1, "Open loop due to insufficient engine temperature"),
    (2, "Closed loop, using oxygen sensor feedback to determine fuel mix"),
    (4, "Open loop due to engine load OR fuel cut due to deceleration"),
    (8, "Open loop due to system failure"),
    (
        16,
        "Closed loop, using at least one oxygen sensor but there is a fault in the feedback system",
    ),
];

const AIR_STATUS: [(u8, &str); 4] = [
    (1, "Upstream"),
    (2, "Downstream of catalytic converter"),
    (4, "From the outside atmosphere or off"),
    (8, "Pump commanded on for diagnostics"),
];

const OBD_COMPLIANCE: [(u8, &str); 33] = [
    (1, "OBD-II as defined by the CARB"),
    (2, "OBD as defined by the EPA"),
    (3, "OBD and OBD-II"),
    (4, "OBD-I"),
    (5, "Not OBD compliant"),
    (6, "EOBD (Europe)"),
    (7, "EOBD and OBD-II"),
    (8, "EOBD and OBD"),
    (9, "EOBD, OBD and OBD II"),
    (10, "JOBD (Japan)"),
    (11, "JOBD and OBD II"),
    (12, "JOBD and EOBD"),
    (13, "JOBD, EOBD, and OBD II"),
    (14, "Reserved"),
    (15, "Reserved"),
    (16, "Reserved"),
    (17, "Engine Manufacturer Diagnostics (EMD)"),
    (18, "Engine Manufacturer Diagnostics Enhanced (EMD+)"),
    (19, "Heavy Duty On-Board Diagnostics (Child/Partial) (HD OBD-C)"),
    (20, "Heavy Duty On-Board Diagnostics (HD OBD)"),
    (21, "World Wide Harmonized OBD (WWH OBD)"),
    (22, "Reserved"),
    (23, "Heavy Duty Euro OBD Stage I without NOx control (HD EOBD-I)"),
    (24, "Heavy Duty Euro OBD Stage I with NOx control (HD EOBD-I N)"),
    (25, "Heavy Duty Euro OBD Stage II without NOx control (HD EOBD-II)"),
    (26, "Heavy Duty Euro OBD Stage II with NOx control (HD EOBD-II N)"),
    (27, "Reserved"),
    (28, "Brazil OBD Phase 1 (OBDBr-1)"),
    (29, "Brazil OBD Phase 2 (OBDBr-2)"),
    (30, "Korean OBD (KOBD)"),
    (31, "India OBD I (IOBD I)"),
    (32, "India OBD II (IOBD II)"),
    (33, "Heavy Duty Euro OBD Stage VI (HD EOBD-IV)"),
];

const FUEL_TYPE: [(u8, &str); 24] = [
    (0, "Not available"),
    (1, "Gasoline"),
    (2, "Methanol"),
    (3, "Ethanol"),
    (4, "Diesel"),
    (5, "LPG"),
    (6, "CNG"),
    (7, "Propane"),
    (8, "Electric"),
    (9, "Bifuel running Gasoline"),
    (10, "Bifuel running Methanol"),
    (11, "Bifuel running Ethanol"),
    (12, "Bifuel running LPG"),
    (13, "Bifuel running CNG"),
    (14, "Bifuel running Propane"),
    (15, "Bifuel running Electricity"),
    (16, "Bifuel running electric and combustion engine"),
    (17, "Hybrid gasoline"),
    (18, "Hybrid Ethanol"),
    (19, "Hybrid Diesel"),
    (20, "Hybrid Electric"),
    (21, "Hybrid running electric and combustion engine"),
    (22, "Hybrid Regenerative"),
    (23, "Bifuel running diesel"),
];

/// Fuel system 1 and 2; a zero code means the system is not present
fn fuel_status(payload: &Payload<'_>, _units: &UnitRegistry) -> DecodeResult {
    let system = |code: Option<u8>| -> Result<Flag, DecodeError> {
        match code {
            None | Some(0) => Ok(Flag::Absent),
            Some(code) => Ok(Flag::Category(
                lookup("fuel system status", &FUEL_STATUS, code)?.to_string(),
            )),
        }
    };

    let flags = vec![system(payload.u8(0))?, system(payload.u8(1))?];
    if flags.iter().all(|f| *f == Flag::Absent) {
        return Ok(DecodedValue::Absent);
    }
    Ok(DecodedValue::FlagList(flags))
}

fn bit_groups(byte: u8, size: usize) -> Vec<Flag> {
    let bits = bits_msb_first(&[byte]);
    // leading empty group keeps the sensor index equal to the bank number
    let mut groups = vec![Flag::Group(Vec::new())];
    groups.extend(
        bits.chunks(size)
            .map(|chunk| Flag::Group(chunk.iter().copied().map(Flag::Bool).collect())),
    );
    groups
}

fn o2_sensors(payload: &Payload<'_>, _units: &UnitRegistry) -> DecodeResult {
    Ok(payload
        .u8(0)
        .map_or(DecodedValue::Absent, |a| DecodedValue::FlagList(bit_groups(a, 4))))
}

fn o2_sensors_alt(payload: &Payload<'_>, _units: &UnitRegistry) -> DecodeResult {
    Ok(payload
        .u8(0)
        .map_or(DecodedValue::Absent, |a| DecodedValue::FlagList(bit_groups(a, 2))))
}

fn aux_input_status(payload: &Payload<'_>, _units: &UnitRegistry) -> DecodeResult {
    Ok(payload.u8(0).map_or(DecodedValue::Absent, |a| {
        DecodedValue::bits([a & 0x80 != 0])
    }))
}

/// Two's complement bytes combined, quarter pascal resolution
fn evap_pressure(payload: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    let (Some(a), Some(b)) = (payload.u8(0), payload.u8(1)) else {
        return Ok(DecodedValue::Absent);
    };
    let value = (f64::from(a as i8) * 256.0 + f64::from(b as i8)) / 4.0;
    Ok(DecodedValue::Scalar(units.quantity(value, Unit::Pascal)?))
}

fn max_values(payload: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    let value = |index: usize, scale: f64, unit: Unit| -> Result<Flag, DecodeError> {
        Ok(quantity(payload.u8(index).map(|b| f64::from(b) * scale), unit, units)?.into())
    };

    Ok(DecodedValue::FlagList(vec![
        value(0, 1.0, Unit::Ratio)?,
        value(1, 1.0, Unit::Volt)?,
        value(2, 1.0, Unit::Milliampere)?,
        value(3, 10.0, Unit::Kilopascal)?,
    ]))
}

fn short_trim_centered(payload: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    let flags = [payload.u8(0), payload.u8(1)]
        .into_iter()
        .map(|b| -> Result<Flag, DecodeError> {
            Ok(quantity(b.map(percent_centered), Unit::Percent, units)?.into())
        })
        .collect::<Result<Vec<Flag>, DecodeError>>()?;
    Ok(DecodedValue::FlagList(flags))
}

/// Mode 09 support bitmap; legacy buses put a message count before it
fn vehicle_info_pids(payload: &Payload<'_>, _units: &UnitRegistry) -> DecodeResult {
    let bytes = payload.bytes();
    if bytes.len() < 4 {
        return Ok(DecodedValue::Absent);
    }
    Ok(DecodedValue::bits(bits_msb_first(&bytes[bytes.len() - 4..])))
}

/// Calibration verification number, hex of the last four bytes
fn cvn(payload: &Payload<'_>, _units: &UnitRegistry) -> DecodeResult {
    let bytes = payload.bytes();
    if bytes.len() < 4 {
        return Ok(DecodedValue::Absent);
    }
    let text: String = bytes[bytes.len() - 4..]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();
    Ok(DecodedValue::RawText(text))
}

/// `ATRV` prints e.g. `12.6V`
fn elm_voltage(payload: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    let text = String::from_utf8_lossy(payload.bytes());
    let number = text.trim().trim_end_matches(|c: char| c == 'V' || c == 'v');
    match number.parse::<f64>() {
        Ok(volts) if volts.is_finite() => Ok(DecodedValue::Scalar(units.quantity(volts, Unit::Volt)?)),
        _ => Ok(DecodedValue::Absent),
    }
}

const fn pids(name: &'static str, description: &'static str, request: &'static [u8]) -> CommandSpec {
    CommandSpec::new(name, description, request, 6, Decoder::SupportedPids)
}

const PERCENT: Decoder = Decoder::Percent;
const CENTERED: Decoder = Decoder::PercentCentered;
const O2_VOLTAGE: Decoder = linear(1, 1.0, 200.0, 0.0, Unit::Volt);
const O2_WR_VOLTAGE: Decoder = linear_at(2, 2, 8.0, 65535.0, 0.0, Unit::Volt);
const O2_WR_CURRENT: Decoder = linear_at(2, 2, 1.0, 256.0, -128.0, Unit::Milliampere);
const CATALYST_TEMP: Decoder = celsius(2, 10.0);
const COUNT: Decoder = linear(1, 1.0, 1.0, 0.0, Unit::Count);

pub static COMMANDS: &[CommandSpec] = &[
    // mode 01, 0x00 - 0x1F
    pids("PIDS_A", "Supported PIDs [01-20]", &[0x01, 0x00]),
    CommandSpec::new("STATUS", "Status since DTCs cleared", &[0x01, 0x01], 6, Decoder::Status),
    CommandSpec::new("FREEZE_DTC", "DTC that triggered the freeze frame", &[0x01, 0x02], 4, Decoder::Dtc),
    CommandSpec::new("FUEL_STATUS", "Fuel System Status", &[0x01, 0x03], 4, Decoder::Custom(fuel_status)),
    CommandSpec::new("ENGINE_LOAD", "Calculated Engine Load", &[0x01, 0x04], 3, PERCENT),
    CommandSpec::new("COOLANT_TEMP", "Engine Coolant Temperature", &[0x01, 0x05], 3, celsius(1, 1.0)),
    CommandSpec::new("SHORT_FUEL_TRIM_1", "Short Term Fuel Trim - Bank 1", &[0x01, 0x06], 3, CENTERED),
    CommandSpec::new("LONG_FUEL_TRIM_1", "Long Term Fuel Trim - Bank 1", &[0x01, 0x07], 3, CENTERED),
    CommandSpec::new("SHORT_FUEL_TRIM_2", "Short Term Fuel Trim - Bank 2", &[0x01, 0x08], 3, CENTERED),
    CommandSpec::new("LONG_FUEL_TRIM_2", "Long Term Fuel Trim - Bank 2", &[0x01, 0x09], 3, CENTERED),
    CommandSpec::new("FUEL_PRESSURE", "Fuel Pressure", &[0x01, 0x0A], 3, linear(1, 3.0, 1.0, 0.0, Unit::Kilopascal)),
    CommandSpec::new("INTAKE_PRESSURE", "Intake Manifold Pressure", &[0x01, 0x0B], 3, linear(1, 1.0, 1.0, 0.0, Unit::Kilopascal)),
    CommandSpec::new("RPM", "Engine RPM", &[0x01, 0x0C], 4, linear(2, 1.0, 4.0, 0.0, Unit::Rpm)),
    CommandSpec::new("SPEED", "Vehicle Speed", &[0x01, 0x0D], 3, linear(1, 1.0, 1.0, 0.0, Unit::KilometersPerHour)),
    CommandSpec::new("TIMING_ADVANCE", "Timing Advance", &[0x01, 0x0E], 3, linear(1, 1.0, 2.0, -64.0, Unit::Degree)),
    CommandSpec::new("INTAKE_TEMP", "Intake Air Temp", &[0x01, 0x0F], 3, celsius(1, 1.0)),
    CommandSpec::new("MAF", "Air Flow Rate (MAF)", &[0x01, 0x10], 4, linear(2, 1.0, 100.0, 0.0, Unit::GramsPerSecond)),
    CommandSpec::new("THROTTLE_POS", "Throttle Position", &[0x01, 0x11], 3, PERCENT),
    CommandSpec::new(
        "AIR_STATUS",
        "Secondary Air Status",
        &[0x01, 0x12],
        3,
        Decoder::Lookup { field: "secondary air status", table: &AIR_STATUS },
    ),
    CommandSpec::new("O2_SENSORS", "O2 Sensors Present", &[0x01, 0x13], 3, Decoder::Custom(o2_sensors)),
    CommandSpec::new("O2_B1S1", "O2: Bank 1 - Sensor 1 Voltage", &[0x01, 0x14], 4, O2_VOLTAGE),
    CommandSpec::new("O2_B1S2", "O2: Bank 1 - Sensor 2 Voltage", &[0x01, 0x15], 4, O2_VOLTAGE),
    CommandSpec::new("O2_B1S3", "O2: Bank 1 - Sensor 3 Voltage", &[0x01, 0x16], 4, O2_VOLTAGE),
    CommandSpec::new("O2_B1S4", "O2: Bank 1 - Sensor 4 Voltage", &[0x01, 0x17], 4, O2_VOLTAGE),
    CommandSpec::new("O2_B2S1", "O2: Bank 2 - Sensor 1 Voltage", &[0x01, 0x18], 4, O2_VOLTAGE),
    CommandSpec::new("O2_B2S2", "O2: Bank 2 - Sensor 2 Voltage", &[0x01, 0x19], 4, O2_VOLTAGE),
    CommandSpec::new("O2_B2S3", "O2: Bank 2 - Sensor 3 Voltage", &[0x01, 0x1A], 4, O2_VOLTAGE),
    CommandSpec::new("O2_B2S4", "O2: Bank 2 - Sensor 4 Voltage", &[0x01, 0x1B], 4, O2_VOLTAGE),
    CommandSpec::new(
        "OBD_COMPLIANCE",
        "OBD Standards Compliance",
        &[0x01, 0x1C],
        3,
        Decoder::Lookup { field: "OBD compliance", table: &OBD_COMPLIANCE },
    ),
    CommandSpec::new("O2_SENSORS_ALT", "O2 Sensors Present (alternate)", &[0x01, 0x1D], 3, Decoder::Custom(o2_sensors_alt)),
    CommandSpec::new("AUX_INPUT_STATUS", "Auxiliary input status (power take off)", &[0x01, 0x1E], 3, Decoder::Custom(aux_input_status)),
    CommandSpec::new("RUN_TIME", "Engine Run Time", &[0x01, 0x1F], 4, linear(2, 1.0, 1.0, 0.0, Unit::Second)),
    // mode 01, 0x20 - 0x3F
    pids("PIDS_B", "Supported PIDs [21-40]", &[0x01, 0x20]),
    CommandSpec::new("DISTANCE_W_MIL", "Distance Traveled with MIL on", &[0x01, 0x21], 4, linear(2, 1.0, 1.0, 0.0, Unit::Kilometer)),
    CommandSpec::new("FUEL_RAIL_PRESSURE_VAC", "Fuel Rail Pressure (relative to vacuum)", &[0x01, 0x22], 4, linear(2, 0.079, 1.0, 0.0, Unit::Kilopascal)),
    CommandSpec::new("FUEL_RAIL_PRESSURE_DIRECT", "Fuel Rail Pressure (direct inject)", &[0x01, 0x23], 4, linear(2, 10.0, 1.0, 0.0, Unit::Kilopascal)),
    CommandSpec::new("O2_S1_WR_VOLTAGE", "02 Sensor 1 WR Lambda Voltage", &[0x01, 0x24], 6, O2_WR_VOLTAGE),
    CommandSpec::new("O2_S2_WR_VOLTAGE", "02 Sensor 2 WR Lambda Voltage", &[0x01, 0x25], 6, O2_WR_VOLTAGE),
    CommandSpec::new("O2_S3_WR_VOLTAGE", "02 Sensor 3 WR Lambda Voltage", &[0x01, 0x26], 6, O2_WR_VOLTAGE),
    CommandSpec::new("O2_S4_WR_VOLTAGE", "02 Sensor 4 WR Lambda Voltage", &[0x01, 0x27], 6, O2_WR_VOLTAGE),
    CommandSpec::new("O2_S5_WR_VOLTAGE", "02 Sensor 5 WR Lambda Voltage", &[0x01, 0x28], 6, O2_WR_VOLTAGE),
    CommandSpec::new("O2_S6_WR_VOLTAGE", "02 Sensor 6 WR Lambda Voltage", &[0x01, 0x29], 6, O2_WR_VOLTAGE),
    CommandSpec::new("O2_S7_WR_VOLTAGE", "02 Sensor 7 WR Lambda Voltage", &[0x01, 0x2A], 6, O2_WR_VOLTAGE),
    CommandSpec::new("O2_S8_WR_VOLTAGE", "02 Sensor 8 WR Lambda Voltage", &[0x01, 0x2B], 6, O2_WR_VOLTAGE),
    CommandSpec::new("COMMANDED_EGR", "Commanded EGR", &[0x01, 0x2C], 3, PERCENT),
    CommandSpec::new("EGR_ERROR", "EGR Error", &[0x01, 0x2D], 3, CENTERED),
    CommandSpec::new("EVAPORATIVE_PURGE", "Commanded Evaporative Purge", &[0x01, 0x2E], 3, PERCENT),
    CommandSpec::new("FUEL_LEVEL", "Fuel Level Input", &[0x01, 0x2F], 3, PERCENT),
    CommandSpec::new("WARMUPS_SINCE_DTC_CLEAR", "Number of warm-ups since codes cleared", &[0x01, 0x30], 3, COUNT),
    CommandSpec::new("DISTANCE_SINCE_DTC_CLEAR", "Distance traveled since codes cleared", &[0x01, 0x31], 4, linear(2, 1.0, 1.0, 0.0, Unit::Kilometer)),
    CommandSpec::new("EVAP_VAPOR_PRESSURE", "Evaporative system vapor pressure", &[0x01, 0x32], 4, Decoder::Custom(evap_pressure)),
    CommandSpec::new("BAROMETRIC_PRESSURE", "Barometric Pressure", &[0x01, 0x33], 3, linear(1, 1.0, 1.0, 0.0, Unit::Kilopascal)),
    CommandSpec::new("O2_S1_WR_CURRENT", "02 Sensor 1 WR Lambda Current", &[0x01, 0x34], 6, O2_WR_CURRENT),
    CommandSpec::new("O2_S2_WR_CURRENT", "02 Sensor 2 WR Lambda Current", &[0x01, 0x35], 6, O2_WR_CURRENT),
    CommandSpec::new("O2_S3_WR_CURRENT", "02 Sensor 3 WR Lambda Current", &[0x01, 0x36], 6, O2_WR_CURRENT),
    CommandSpec::new("O2_S4_WR_CURRENT", "02 Sensor 4 WR Lambda Current", &[0x01, 0x37], 6, O2_WR_CURRENT),
    CommandSpec::new("O2_S5_WR_CURRENT", "02 Sensor 5 WR Lambda Current", &[0x01, 0x38], 6, O2_WR_CURRENT),
    CommandSpec::new("O2_S6_WR_CURRENT", "02 Sensor 6 WR Lambda Current", &[0x01, 0x39], 6, O2_WR_CURRENT),
    CommandSpec::new("O2_S7_WR_CURRENT", "02 Sensor 7 WR Lambda Current", &[0x01, 0x3A], 6, O2_WR_CURRENT),
    CommandSpec::new("O2_S8_WR_CURRENT", "02 Sensor 8 WR Lambda Current", &[0x01, 0x3B], 6, O2_WR_CURRENT),
    CommandSpec::new("CATALYST_TEMP_B1S1", "Catalyst Temperature: Bank 1 - Sensor 1", &[0x01, 0x3C], 4, CATALYST_TEMP),
    CommandSpec::new("CATALYST_TEMP_B2S1", "Catalyst Temperature: Bank 2 - Sensor 1", &[0x01, 0x3D], 4, CATALYST_TEMP),
    CommandSpec::new("CATALYST_TEMP_B1S2", "Catalyst Temperature: Bank 1 - Sensor 2", &[0x01, 0x3E], 4, CATALYST_TEMP),
    CommandSpec::new("CATALYST_TEMP_B2S2", "Catalyst Temperature: Bank 2 - Sensor 2", &[0x01, 0x3F], 4, CATALYST_TEMP),
    // mode 01, 0x40 - 0x5F
    pids("PIDS_C", "Supported PIDs [41-60]", &[0x01, 0x40]),
    CommandSpec::new("STATUS_DRIVE_CYCLE", "Monitor status this drive cycle", &[0x01, 0x41], 6, Decoder::Status),
    CommandSpec::new("CONTROL_MODULE_VOLTAGE", "Control module voltage", &[0x01, 0x42], 4, linear(2, 1.0, 1000.0, 0.0, Unit::Volt)),
    CommandSpec::new("ABSOLUTE_LOAD", "Absolute load value", &[0x01, 0x43], 4, linear(2, 100.0, 255.0, 0.0, Unit::Percent)),
    CommandSpec::new("COMMANDED_EQUIV_RATIO", "Commanded equivalence ratio", &[0x01, 0x44], 4, linear(2, 2.0, 65536.0, 0.0, Unit::Ratio)),
    CommandSpec::new("RELATIVE_THROTTLE_POS", "Relative throttle position", &[0x01, 0x45], 3, PERCENT),
    CommandSpec::new("AMBIANT_AIR_TEMP", "Ambient air temperature", &[0x01, 0x46], 3, celsius(1, 1.0)),
    CommandSpec::new("THROTTLE_POS_B", "Absolute throttle position B", &[0x01, 0x47], 3, PERCENT),
    CommandSpec::new("THROTTLE_POS_C", "Absolute throttle position C", &[0x01, 0x48], 3, PERCENT),
    CommandSpec::new("ACCELERATOR_POS_D", "Accelerator pedal position D", &[0x01, 0x49], 3, PERCENT),
    CommandSpec::new("ACCELERATOR_POS_E", "Accelerator pedal position E", &[0x01, 0x4A], 3, PERCENT),
    CommandSpec::new("ACCELERATOR_POS_F", "Accelerator pedal position F", &[0x01, 0x4B], 3, PERCENT),
    CommandSpec::new("THROTTLE_ACTUATOR", "Commanded throttle actuator", &[0x01, 0x4C], 3, PERCENT),
    CommandSpec::new("RUN_TIME_MIL", "Time run with MIL on", &[0x01, 0x4D], 4, linear(2, 1.0, 1.0, 0.0, Unit::Minute)),
    CommandSpec::new("TIME_SINCE_DTC_CLEARED", "Time since trouble codes cleared", &[0x01, 0x4E], 4, linear(2, 1.0, 1.0, 0.0, Unit::Minute)),
    CommandSpec::new("MAX_VALUES", "Maximum value for various values", &[0x01, 0x4F], 6, Decoder::Custom(max_values)),
    CommandSpec::new("MAX_MAF", "Maximum value for air flow rate from mass air flow sensor", &[0x01, 0x50], 6, linear(1, 10.0, 1.0, 0.0, Unit::GramsPerSecond)),
    CommandSpec::new(
        "FUEL_TYPE",
        "Fuel Type",
        &[0x01, 0x51],
        3,
        Decoder::Lookup { field: "fuel type", table: &FUEL_TYPE },
    ),
    CommandSpec::new("ETHANOL_PERCENT", "Ethanol Fuel Percent", &[0x01, 0x52], 3, PERCENT),
    CommandSpec::new("EVAP_VAPOR_PRESSURE_ABS", "Absolute Evap system Vapor Pressure", &[0x01, 0x53], 4, linear(2, 1.0, 200.0, 0.0, Unit::Kilopascal)),
    CommandSpec::new("EVAP_VAPOR_PRESSURE_ALT", "Evap system vapor pressure", &[0x01, 0x54], 4, linear(2, 1.0, 1.0, -32767.0, Unit::Pascal)),
    CommandSpec::new("SHORT_O2_TRIM_B1", "Short term secondary O2 trim - Bank 1", &[0x01, 0x55], 4, Decoder::Custom(short_trim_centered)),
    CommandSpec::new("LONG_O2_TRIM_B1", "Long term secondary O2 trim - Bank 1", &[0x01, 0x56], 4, Decoder::Custom(short_trim_centered)),
    CommandSpec::new("SHORT_O2_TRIM_B2", "Short term secondary O2 trim - Bank 2", &[0x01, 0x57], 4, Decoder::Custom(short_trim_centered)),
    CommandSpec::new("LONG_O2_TRIM_B2", "Long term secondary O2 trim - Bank 2", &[0x01, 0x58], 4, Decoder::Custom(short_trim_centered)),
    CommandSpec::new("FUEL_RAIL_PRESSURE_ABS", "Fuel rail pressure (absolute)", &[0x01, 0x59], 4, linear(2, 10.0, 1.0, 0.0, Unit::Kilopascal)),
    CommandSpec::new("RELATIVE_ACCEL_POS", "Relative accelerator pedal position", &[0x01, 0x5A], 3, PERCENT),
    CommandSpec::new("HYBRID_BATTERY_REMAINING", "Hybrid battery pack remaining life", &[0x01, 0x5B], 3, PERCENT),
    CommandSpec::new("OIL_TEMP", "Engine oil temperature", &[0x01, 0x5C], 3, celsius(1, 1.0)),
    CommandSpec::new("FUEL_INJECT_TIMING", "Fuel injection timing", &[0x01, 0x5D], 4, linear(2, 1.0, 128.0, -210.0, Unit::Degree)),
    CommandSpec::new("FUEL_RATE", "Engine fuel rate", &[0x01, 0x5E], 4, linear(2, 1.0, 20.0, 0.0, Unit::LitersPerHour)),
    // support bitmaps for the extended range
    pids("PIDS_D", "Supported PIDs [61-80]", &[0x01, 0x60]),
    pids("PIDS_E", "Supported PIDs [81-A0]", &[0x01, 0x80]),
    pids("PIDS_F", "Supported PIDs [A1-C0]", &[0x01, 0xA0]),
    // mode 09
    CommandSpec::new("PIDS_9A", "Supported PIDs [01-20]", &[0x09, 0x00], 7, Decoder::Custom(vehicle_info_pids)),
    CommandSpec::new("VIN_MESSAGE_COUNT", "VIN Message Count", &[0x09, 0x01], 3, COUNT),
    CommandSpec::new("VIN", "Vehicle Identification Number", &[0x09, 0x02], 22, Decoder::EncodedString(17)).slow(),
    CommandSpec::new("CALIBRATION_ID_MESSAGE_COUNT", "Calibration ID message count for PID 04", &[0x09, 0x03], 3, COUNT),
    CommandSpec::new("CALIBRATION_ID", "Calibration ID", &[0x09, 0x04], 18, Decoder::EncodedString(16)).slow(),
    CommandSpec::new("CVN_MESSAGE_COUNT", "CVN Message Count for PID 06", &[0x09, 0x05], 3, COUNT),
    CommandSpec::new("CVN", "Calibration Verification Numbers", &[0x09, 0x06], 10, Decoder::Custom(cvn)).slow(),
    CommandSpec::new("ECU_NAME_MESSAGE_COUNT", "ECU name message count for PID 0A", &[0x09, 0x09], 3, COUNT),
    CommandSpec::new("ECU_NAME", "ECU name", &[0x09, 0x0A], 23, Decoder::EncodedString(20)).slow(),
    // adapter
    CommandSpec::new("ELM_VERSION", "ELM327 version string", b"ATI", 0, Decoder::RawString)
        .ecu(Ecu::Adapter)
        .slow(),
    CommandSpec::new("ELM_VOLTAGE", "Voltage detected by OBD-II adapter", b"ATRV", 0, Decoder::Custom(elm_voltage))
        .ecu(Ecu::Adapter)
        .slow(),
];
