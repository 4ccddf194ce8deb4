//! Extended command table
//!
//! Mode 01 PIDs 0x61 - 0xA6, mostly reported by heavy duty and diesel
//! ECUs. Most of these start with a support byte where bit k gates
//! sub-value k; the gated readers below return `Absent` for every slot
//! whose bit is clear or whose bytes are missing.

use crate::catalog::{celsius, linear, CommandSpec};
use crate::decoders::{
    lookup, percent, quantity, temperature_flag, torque_percent, DecodeResult,
    Decoder, Payload,
};
use crate::error::DecodeError;
use crate::units::{Unit, UnitRegistry};
use crate::value::{DecodedValue, Flag};

const CONTROL_STATUS: [(u8, &str); 3] = [
    (1, "open loop"),
    (2, "closed loop"),
    (3, "fault present"),
];

const CHARGING_STATE: [(u8, &str); 3] = [
    (0, "charge sustaining"),
    (1, "charge depleting"),
    (2, "charge increasing"),
];

const GEARS: [&str; 16] = [
    "neutral", "1/reverse", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13",
    "14", "15",
];

/// `u16 at index * scale / divisor + offset`
fn u16_scaled(p: &Payload<'_>, index: usize, scale: f64, divisor: f64, offset: f64) -> Option<f64> {
    p.u16(index).map(|raw| f64::from(raw) * scale / divisor + offset)
}

fn u8_celsius(p: &Payload<'_>, index: usize) -> Option<f64> {
    p.u8(index).map(|raw| f64::from(raw) - 40.0)
}

fn u16_celsius(p: &Payload<'_>, index: usize) -> Option<f64> {
    u16_scaled(p, index, 1.0, 10.0, -40.0)
}

fn scalar_flag(value: Option<f64>, unit: Unit, units: &UnitRegistry) -> Result<Flag, DecodeError> {
    Ok(quantity(value, unit, units)?.into())
}

fn category_flag(
    field: &'static str,
    table: &'static [(u8, &'static str)],
    code: Option<u8>,
) -> Result<Flag, DecodeError> {
    match code {
        Some(code) => Ok(Flag::Category(lookup(field, table, code)?.to_string())),
        None => Ok(Flag::Absent),
    }
}

/// Gated two byte values following the support byte, one per bit
fn gated_u16_list(
    p: &Payload<'_>,
    count: u8,
    divisor: f64,
    unit: Unit,
    units: &UnitRegistry,
) -> DecodeResult {
    let flags = (0..count)
        .map(|bit| {
            let index = 1 + 2 * usize::from(bit);
            scalar_flag(p.gated(bit, |p| u16_scaled(p, index, 1.0, divisor, 0.0)), unit, units)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DecodedValue::FlagList(flags))
}

/// Gated one byte Celsius values following the support byte
fn gated_u8_temperatures(p: &Payload<'_>, count: u8, units: &UnitRegistry) -> DecodeResult {
    let flags = (0..count)
        .map(|bit| temperature_flag(p.gated(bit, |p| u8_celsius(p, 1 + usize::from(bit))), units))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DecodedValue::FlagList(flags))
}

/// Gated two byte Celsius values (0.1 degree resolution)
fn gated_u16_temperatures(p: &Payload<'_>, count: u8, units: &UnitRegistry) -> DecodeResult {
    let flags = (0..count)
        .map(|bit| {
            let index = 1 + 2 * usize::from(bit);
            temperature_flag(p.gated(bit, |p| u16_celsius(p, index)), units)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DecodedValue::FlagList(flags))
}

fn percent_torque(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    // idle, then engine points 1 - 4
    let flags = (0..5)
        .map(|i| scalar_flag(p.u8(i).map(torque_percent), Unit::Percent, units))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DecodedValue::FlagList(flags))
}

fn mass_air_flow_sensor(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    gated_u16_list(p, 2, 32.0, Unit::GramsPerSecond, units)
}

fn engine_coolant_temperature(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    gated_u8_temperatures(p, 2, units)
}

/// Bank 1 sensors 1 - 3, then bank 2 sensors 1 - 3
fn intake_air_temperature_sensor(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    gated_u8_temperatures(p, 6, units)
}

/// Commanded / actual boost for turbo A and B, then the control status of each
fn boost_pressure_control(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    let mut flags = (0..4u8)
        .map(|bit| {
            let index = 1 + 2 * usize::from(bit);
            scalar_flag(
                p.gated(bit, |p| u16_scaled(p, index, 1.0, 32.0, 0.0)),
                Unit::Kilopascal,
                units,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let status = p.u8(9);
    flags.push(category_flag(
        "boost control status",
        &CONTROL_STATUS,
        p.gated(4, |_| status.map(|j| j & 0x03)),
    )?);
    flags.push(category_flag(
        "boost control status",
        &CONTROL_STATUS,
        p.gated(5, |_| status.map(|j| (j >> 2) & 0x03)),
    )?);
    Ok(DecodedValue::FlagList(flags))
}

fn vgt_control(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    let mut flags = (0..4u8)
        .map(|bit| {
            let index = 1 + usize::from(bit);
            scalar_flag(p.gated(bit, |p| p.u8(index).map(percent)), Unit::Percent, units)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let status = p.u8(5);
    flags.push(category_flag(
        "VGT control status",
        &CONTROL_STATUS,
        p.gated(4, |_| status.map(|f| f & 0x03)),
    )?);
    flags.push(category_flag(
        "VGT control status",
        &CONTROL_STATUS,
        p.gated(5, |_| status.map(|f| (f >> 2) & 0x03)),
    )?);
    Ok(DecodedValue::FlagList(flags))
}

fn wastegate_control(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    let flags = (0..4u8)
        .map(|bit| {
            let index = 1 + usize::from(bit);
            scalar_flag(p.gated(bit, |p| p.u8(index).map(percent)), Unit::Percent, units)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DecodedValue::FlagList(flags))
}

fn exhaust_pressure(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    gated_u16_list(p, 2, 100.0, Unit::Kilopascal, units)
}

fn turbo_rpm(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    let flags = (0..2u8)
        .map(|bit| {
            let index = 1 + 2 * usize::from(bit);
            scalar_flag(
                p.gated(bit, |p| u16_scaled(p, index, 10.0, 1.0, 0.0)),
                Unit::Rpm,
                units,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DecodedValue::FlagList(flags))
}

/// Compressor inlet / outlet (1 byte), turbine inlet / outlet (2 bytes)
fn turbo_temperature(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    Ok(DecodedValue::FlagList(vec![
        temperature_flag(p.gated(0, |p| u8_celsius(p, 1)), units)?,
        temperature_flag(p.gated(1, |p| u8_celsius(p, 2)), units)?,
        temperature_flag(p.gated(2, |p| u16_celsius(p, 3)), units)?,
        temperature_flag(p.gated(3, |p| u16_celsius(p, 5)), units)?,
    ]))
}

fn charge_air_cooler_temperature(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    gated_u8_temperatures(p, 4, units)
}

fn exhaust_gas_temperature(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    gated_u16_temperatures(p, 4, units)
}

/// Delta, inlet and outlet pressure; bit 7 of the support byte marks a
/// negative delta
fn diesel_particulate_filter(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    let negative = p.supported(7);
    let delta = p
        .gated(0, |p| u16_scaled(p, 1, 1.0, 100.0, 0.0))
        .map(|v| if negative { -v } else { v });

    Ok(DecodedValue::FlagList(vec![
        scalar_flag(delta, Unit::Kilopascal, units)?,
        scalar_flag(p.gated(1, |p| u16_scaled(p, 3, 1.0, 100.0, 0.0)), Unit::Kilopascal, units)?,
        scalar_flag(p.gated(2, |p| u16_scaled(p, 5, 1.0, 100.0, 0.0)), Unit::Kilopascal, units)?,
    ]))
}

fn dpf_temperature(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    gated_u16_temperatures(p, 4, units)
}

/// Not-to-exceed control area status: inside the area, outside it, inside a
/// manufacturer carve-out, deficiency active (bits 0 to 3; the rest are
/// reserved)
fn nte_status(p: &Payload<'_>, _units: &UnitRegistry) -> DecodeResult {
    Ok(p.u8(0).map_or(DecodedValue::Absent, |a| {
        DecodedValue::bits((0..4).map(|bit| a & (1 << bit) != 0))
    }))
}

/// Total, idle and PTO run time
fn engine_run_time(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    let flags = (0..3u8)
        .map(|bit| {
            let index = 1 + 4 * usize::from(bit);
            scalar_flag(p.gated(bit, |p| p.u32(index).map(f64::from)), Unit::Second, units)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DecodedValue::FlagList(flags))
}

fn nox_sensor(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    gated_u16_list(p, 2, 1.0, Unit::Ppm, units)
}

fn intake_manifold_pressure(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    gated_u16_list(p, 2, 32.0, Unit::Kilopascal, units)
}

/// Charging state, battery voltage, battery current
fn hybrid_ev_system(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    Ok(DecodedValue::FlagList(vec![
        category_flag(
            "hybrid charging state",
            &CHARGING_STATE,
            p.gated(0, |p| p.u8(1).map(|b| b & 0x03)),
        )?,
        scalar_flag(
            p.gated(1, |p| u16_scaled(p, 2, 1.0, 64.0, 0.0)),
            Unit::Volt,
            units,
        )?,
        scalar_flag(
            p.gated(2, |p| u16_scaled(p, 4, 1.0, 10.0, -3276.8)),
            Unit::Ampere,
            units,
        )?,
    ]))
}

/// Engine fuel rate, then vehicle fuel rate
fn fuel_rate_2(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    Ok(DecodedValue::FlagList(vec![
        scalar_flag(u16_scaled(p, 0, 1.0, 50.0, 0.0), Unit::GramsPerSecond, units)?,
        scalar_flag(u16_scaled(p, 2, 1.0, 50.0, 0.0), Unit::GramsPerSecond, units)?,
    ]))
}

/// Gear name and gear ratio
fn transmission_actual_gear(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    let gear = p
        .gated(0, |p| p.u8(1))
        .map_or(Flag::Absent, |b| Flag::Category(GEARS[usize::from(b >> 4)].to_string()));
    let ratio = scalar_flag(
        p.gated(1, |p| u16_scaled(p, 2, 1.0, 1000.0, 0.0)),
        Unit::Ratio,
        units,
    )?;
    Ok(DecodedValue::FlagList(vec![gear, ratio]))
}

fn def_dosing(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    let value = p.gated(0, |p| p.u8(1).map(|b| f64::from(b) / 2.0));
    Ok(match quantity(value, Unit::Percent, units)? {
        Some(q) => DecodedValue::Scalar(q),
        None => DecodedValue::Absent,
    })
}

fn odometer(p: &Payload<'_>, units: &UnitRegistry) -> DecodeResult {
    Ok(match quantity(p.u32(0).map(|raw| f64::from(raw) / 10.0), Unit::Kilometer, units)? {
        Some(q) => DecodedValue::Scalar(q),
        None => DecodedValue::Absent,
    })
}

const fn custom(
    name: &'static str,
    description: &'static str,
    request: &'static [u8],
    expected_length: usize,
    decode: crate::decoders::DecodeFn,
) -> CommandSpec {
    CommandSpec::new(name, description, request, expected_length, Decoder::Custom(decode))
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("TORQUE_DEMAND", "Driver's demand engine torque - percent", &[0x01, 0x61], 3, Decoder::TorquePercent),
    CommandSpec::new("TORQUE", "Actual engine torque - percent", &[0x01, 0x62], 3, Decoder::TorquePercent),
    CommandSpec::new(
        "REFERENCE_TORQUE",
        "Engine reference torque",
        &[0x01, 0x63],
        4,
        linear(2, 1.0, 1.0, 0.0, Unit::NewtonMeter),
    ),
    custom("PERCENT_TORQUE", "Engine percent torque", &[0x01, 0x64], 7, percent_torque),
    custom("MASS_AIR_FLOW_SENSOR", "Mass air flow sensor", &[0x01, 0x66], 7, mass_air_flow_sensor),
    custom("ENGINE_COOLANT_TEMPERATURE", "Engine coolant temperature", &[0x01, 0x67], 5, engine_coolant_temperature),
    custom("INTAKE_AIR_TEMPERATURE_SENSOR", "Intake air temperature sensor", &[0x01, 0x68], 9, intake_air_temperature_sensor),
    custom("BOOST_PRESSURE_CONTROL", "Commanded boost pressure and boost pressure sensors", &[0x01, 0x70], 12, boost_pressure_control),
    custom("VGT_CONTROL", "Variable geometry turbo control", &[0x01, 0x71], 8, vgt_control),
    custom("WASTEGATE_CONTROL", "Wastegate control", &[0x01, 0x72], 7, wastegate_control),
    custom("EXHAUST_PRESSURE", "Exhaust pressure", &[0x01, 0x73], 7, exhaust_pressure),
    custom("TURBO_RPM", "Turbocharger RPM", &[0x01, 0x74], 7, turbo_rpm),
    custom("TURBO_A_TEMPERATURE", "Turbocharger A temperature", &[0x01, 0x75], 9, turbo_temperature),
    custom("TURBO_B_TEMPERATURE", "Turbocharger B temperature", &[0x01, 0x76], 9, turbo_temperature),
    custom("CHARGE_AIR_COOLER_TEMPERATURE", "Charge air cooler temperature", &[0x01, 0x77], 7, charge_air_cooler_temperature),
    custom("EXHAUST_GAS_TEMPERATURE_BANK_1", "Exhaust gas temperature bank 1", &[0x01, 0x78], 11, exhaust_gas_temperature),
    custom("EXHAUST_GAS_TEMPERATURE_BANK_2", "Exhaust gas temperature bank 2", &[0x01, 0x79], 11, exhaust_gas_temperature),
    custom("DPF_BANK_1", "Diesel particulate filter bank 1", &[0x01, 0x7A], 9, diesel_particulate_filter),
    custom("DPF_BANK_2", "Diesel particulate filter bank 2", &[0x01, 0x7B], 9, diesel_particulate_filter),
    custom("DPF_TEMPERATURE", "Diesel particulate filter temperature", &[0x01, 0x7C], 11, dpf_temperature),
    custom("NOX_NTE_CONTROL_AREA_STATUS", "NOx NTE control area status", &[0x01, 0x7D], 3, nte_status),
    custom("PM_NTE_CONTROL_AREA_STATUS", "PM NTE control area status", &[0x01, 0x7E], 3, nte_status),
    custom("ENGINE_RUN_TIME", "Engine run time", &[0x01, 0x7F], 15, engine_run_time),
    custom("NOX_SENSOR", "NOx sensor concentration", &[0x01, 0x83], 7, nox_sensor),
    CommandSpec::new(
        "MANIFOLD_SURFACE_TEMPERATURE",
        "Manifold surface temperature",
        &[0x01, 0x84],
        3,
        celsius(1, 1.0),
    ),
    custom("INTAKE_MANIFOLD_ABSOLUTE_PRESSURE", "Intake manifold absolute pressure", &[0x01, 0x87], 7, intake_manifold_pressure),
    CommandSpec::new("THROTTLE_POSITION_G", "Throttle position G", &[0x01, 0x8D], 3, Decoder::Percent),
    CommandSpec::new("ENGINE_FRICTION_PERCENT_TORQUE", "Engine friction percent torque", &[0x01, 0x8E], 3, Decoder::TorquePercent),
    custom("HYBRID_EV_SYSTEM", "Hybrid/EV vehicle system data, battery, voltage", &[0x01, 0x9A], 8, hybrid_ev_system),
    custom("FUEL_RATE2", "Engine fuel rate", &[0x01, 0x9D], 6, fuel_rate_2),
    CommandSpec::new(
        "ENGINE_EXHAUST_FLOW_RATE",
        "Engine exhaust flow rate",
        &[0x01, 0x9E],
        4,
        linear(2, 1.0, 5.0, 0.0, Unit::KilogramsPerSecond),
    ),
    CommandSpec::new(
        "CYLENDER_FUEL_RATE",
        "Cylender fuel rate",
        &[0x01, 0xA2],
        4,
        linear(2, 1.0, 32.0, 0.0, Unit::Milligram),
    ),
    custom("TRANSMISSION_ACTUAL_GEAR", "Transmission actual gear", &[0x01, 0xA4], 6, transmission_actual_gear),
    custom("DIESEL_EXHAUST_FLUID_DOSING", "Commanded diesel exhaust fluid dosing", &[0x01, 0xA5], 4, def_dosing),
    custom("ODOMETER", "Odometer", &[0x01, 0xA6], 6, odometer),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Ecu};
    use crate::decoders::decode;
    use crate::message::RawMessage;
    use crate::units::Quantity;

    fn decode_bytes(name: &str, bytes: &[u8]) -> DecodeResult {
        let catalog = Catalog::new();
        let spec = catalog.lookup(name).unwrap();
        let message = RawMessage::from_bytes(Ecu::Engine, bytes.to_vec());
        decode(spec, &message, &UnitRegistry::new())
    }

    fn flags(value: DecodedValue) -> Vec<Flag> {
        match value {
            DecodedValue::FlagList(flags) => flags,
            other => panic!("expected flags, got {:?}", other),
        }
    }

    fn q(magnitude: f64, unit: Unit) -> Flag {
        Flag::Scalar(Quantity { magnitude, unit })
    }

    #[test]
    fn test_gated_sensor_b_only() {
        // support byte 0b10: sensor A absent even though its bytes are present
        let value = decode_bytes(
            "MASS_AIR_FLOW_SENSOR",
            &[0x41, 0x66, 0x02, 0x01, 0x00, 0x00, 0x40],
        )
        .unwrap();
        assert_eq!(flags(value), vec![Flag::Absent, q(2.0, Unit::GramsPerSecond)]);
    }

    #[test]
    fn test_gated_short_payload() {
        // sensor B is supported but its bytes never arrived
        let value = decode_bytes("MASS_AIR_FLOW_SENSOR", &[0x41, 0x66, 0x03, 0x00, 0x20]).unwrap();
        assert_eq!(flags(value), vec![q(1.0, Unit::GramsPerSecond), Flag::Absent]);
    }

    #[test]
    fn test_torque_percent() {
        let value = decode_bytes("TORQUE", &[0x41, 0x62, 0xAF]).unwrap();
        assert_eq!(
            value,
            DecodedValue::Scalar(Quantity {
                magnitude: 50.0,
                unit: Unit::Percent
            })
        );
    }

    #[test]
    fn test_intake_air_temperature_all_sensors() {
        let value = decode_bytes(
            "INTAKE_AIR_TEMPERATURE_SENSOR",
            &[0x41, 0x68, 0x21, 0x50, 0x00, 0x00, 0x00, 0x00, 0x28],
        )
        .unwrap();
        assert_eq!(
            flags(value),
            vec![
                Flag::Temperature(40.0),
                Flag::Absent,
                Flag::Absent,
                Flag::Absent,
                Flag::Absent,
                Flag::Temperature(0.0),
            ]
        );
    }

    #[test]
    fn test_boost_control_status() {
        let bytes = [
            0x41, 0x70, 0x11, 0x03, 0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02,
        ];
        let value = flags(decode_bytes("BOOST_PRESSURE_CONTROL", &bytes).unwrap());
        assert_eq!(value[0], q(25.0, Unit::Kilopascal));
        assert_eq!(value[4], Flag::Category("closed loop".to_string()));
        assert_eq!(value[5], Flag::Absent);

        // status code 0 is reserved
        let mut bytes = bytes;
        bytes[11] = 0x00;
        let err = decode_bytes("BOOST_PRESSURE_CONTROL", &bytes).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownCode { code: 0, .. }));
    }

    #[test]
    fn test_dpf_negative_delta() {
        let value = decode_bytes(
            "DPF_BANK_1",
            &[0x41, 0x7A, 0x81, 0x00, 0x64, 0x00, 0x00, 0x00, 0x00],
        )
        .unwrap();
        assert_eq!(
            flags(value),
            vec![q(-1.0, Unit::Kilopascal), Flag::Absent, Flag::Absent]
        );
    }

    #[test]
    fn test_engine_run_time() {
        let value = decode_bytes(
            "ENGINE_RUN_TIME",
            &[
                0x41, 0x7F, 0x05, 0x00, 0x01, 0x00, 0x02, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00,
                0x00, 0x0A,
            ],
        )
        .unwrap();
        assert_eq!(
            flags(value),
            vec![q(65538.0, Unit::Second), Flag::Absent, q(10.0, Unit::Second)]
        );
    }

    #[test]
    fn test_hybrid_current_offset() {
        let value = decode_bytes(
            "HYBRID_EV_SYSTEM",
            &[0x41, 0x9A, 0x07, 0x01, 0x32, 0x00, 0x80, 0x00],
        )
        .unwrap();
        let value = flags(value);
        assert_eq!(value[0], Flag::Category("charge depleting".to_string()));
        assert_eq!(value[1], q(200.0, Unit::Volt));
        let Flag::Scalar(current) = value[2] else {
            panic!("expected current");
        };
        assert!(current.magnitude.abs() < 1e-6);
    }

    #[test]
    fn test_fuel_rate_2_reports_both_rates() {
        let value = decode_bytes("FUEL_RATE2", &[0x41, 0x9D, 0x00, 0x64, 0x00, 0xC8]).unwrap();
        assert_eq!(
            flags(value),
            vec![q(2.0, Unit::GramsPerSecond), q(4.0, Unit::GramsPerSecond)]
        );
    }

    #[test]
    fn test_transmission_gear() {
        let value = decode_bytes(
            "TRANSMISSION_ACTUAL_GEAR",
            &[0x41, 0xA4, 0x03, 0x30, 0x0B, 0xB8],
        )
        .unwrap();
        assert_eq!(
            flags(value),
            vec![Flag::Category("3".to_string()), q(3.0, Unit::Ratio)]
        );
    }

    #[test]
    fn test_odometer_whole_counter() {
        let value = decode_bytes("ODOMETER", &[0x41, 0xA6, 0x00, 0x01, 0x86, 0xA0]).unwrap();
        assert_eq!(
            value,
            DecodedValue::Scalar(Quantity {
                magnitude: 10000.0,
                unit: Unit::Kilometer
            })
        );
    }

    #[test]
    fn test_nte_status_defined_bits() {
        let value = decode_bytes("NOX_NTE_CONTROL_AREA_STATUS", &[0x41, 0x7D, 0xF6]).unwrap();
        assert_eq!(
            flags(value),
            vec![
                Flag::Bool(false),
                Flag::Bool(true),
                Flag::Bool(true),
                Flag::Bool(false)
            ]
        );
    }

    #[test]
    fn test_exhaust_flow_rate() {
        let value = decode_bytes("ENGINE_EXHAUST_FLOW_RATE", &[0x41, 0x9E, 0x01, 0x2C]).unwrap();
        assert_eq!(
            value,
            DecodedValue::Scalar(Quantity {
                magnitude: 60.0,
                unit: Unit::KilogramsPerSecond
            })
        );
    }
}
