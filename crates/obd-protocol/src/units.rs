//! Physical Units and Quantities
//!
//! Decoders never format strings themselves. They build [`Quantity`] values
//! through a [`UnitRegistry`] that is created once per process and passed
//! into every decode and normalize call.

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Units produced by the PID decoders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    Percent,
    Celsius,
    Kilopascal,
    Pascal,
    Rpm,
    KilometersPerHour,
    Degree,
    GramsPerSecond,
    KilogramsPerSecond,
    Volt,
    Milliampere,
    Ampere,
    Second,
    Minute,
    Kilometer,
    Ratio,
    Count,
    NewtonMeter,
    LitersPerHour,
    Milligram,
    Ppm,
}

/// How arithmetic on a unit behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// Zero means "none of it"; scaling is meaningful
    Ratio,
    /// Zero is an arbitrary point (Celsius); only differences scale
    Offset,
}

/// Definition of a single unit inside a registry
#[derive(Debug, Clone)]
pub struct UnitDef {
    /// Canonical name used when rendering quantities
    pub name: &'static str,
    /// Arithmetic behaviour
    pub kind: UnitKind,
}

/// A magnitude tagged with a unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub magnitude: f64,
    pub unit: Unit,
}

/// Registry of every unit the decoders are allowed to produce
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    defs: HashMap<Unit, UnitDef>,
}

impl UnitRegistry {
    /// Create a registry with all units used by the command catalog
    pub fn new() -> Self {
        let mut registry = Self {
            defs: HashMap::with_capacity(24),
        };

        registry.define(Unit::Percent, "percent", UnitKind::Ratio);
        registry.define(Unit::Celsius, "degree_Celsius", UnitKind::Offset);
        registry.define(Unit::Kilopascal, "kilopascal", UnitKind::Ratio);
        registry.define(Unit::Pascal, "pascal", UnitKind::Ratio);
        registry.define(Unit::Rpm, "revolutions_per_minute", UnitKind::Ratio);
        registry.define(Unit::KilometersPerHour, "kilometer_per_hour", UnitKind::Ratio);
        registry.define(Unit::Degree, "degree", UnitKind::Ratio);
        registry.define(Unit::GramsPerSecond, "gram / second", UnitKind::Ratio);
        registry.define(Unit::KilogramsPerSecond, "kilogram / second", UnitKind::Ratio);
        registry.define(Unit::Volt, "volt", UnitKind::Ratio);
        registry.define(Unit::Milliampere, "milliampere", UnitKind::Ratio);
        registry.define(Unit::Ampere, "ampere", UnitKind::Ratio);
        registry.define(Unit::Second, "second", UnitKind::Ratio);
        registry.define(Unit::Minute, "minute", UnitKind::Ratio);
        registry.define(Unit::Kilometer, "kilometer", UnitKind::Ratio);
        registry.define(Unit::Ratio, "ratio", UnitKind::Ratio);
        registry.define(Unit::Count, "count", UnitKind::Ratio);
        registry.define(Unit::NewtonMeter, "newton * meter", UnitKind::Ratio);
        registry.define(Unit::LitersPerHour, "liter / hour", UnitKind::Ratio);
        registry.define(Unit::Milligram, "milligram", UnitKind::Ratio);
        registry.define(Unit::Ppm, "ppm", UnitKind::Ratio);

        registry
    }

    /// Create a registry with no units defined
    pub fn empty() -> Self {
        Self {
            defs: HashMap::new(),
        }
    }

    /// Define (or redefine) a unit
    pub fn define(&mut self, unit: Unit, name: &'static str, kind: UnitKind) {
        self.defs.insert(unit, UnitDef { name, kind });
    }

    /// Look up a unit definition
    pub fn def(&self, unit: Unit) -> Result<&UnitDef, DecodeError> {
        self.defs
            .get(&unit)
            .ok_or_else(|| DecodeError::Definition(format!("unit {:?} is not defined", unit)))
    }

    /// Build a ratio quantity.
    ///
    /// Offset units cannot be scaled, so asking for one here is a defect in
    /// the PID table and reported as [`DecodeError::Definition`].
    pub fn quantity(&self, magnitude: f64, unit: Unit) -> Result<Quantity, DecodeError> {
        let def = self.def(unit)?;
        if def.kind == UnitKind::Offset {
            return Err(DecodeError::Definition(format!(
                "offset unit {} used as a multiplicative quantity",
                def.name
            )));
        }
        if !magnitude.is_finite() {
            return Err(DecodeError::Definition(format!(
                "non-finite magnitude {} for {}",
                magnitude, def.name
            )));
        }
        Ok(Quantity { magnitude, unit })
    }

    /// Validate a Celsius temperature
    pub fn temperature(&self, celsius: f64) -> Result<f64, DecodeError> {
        let def = self.def(Unit::Celsius)?;
        if def.kind != UnitKind::Offset {
            return Err(DecodeError::Definition(format!(
                "{} must be an offset unit",
                def.name
            )));
        }
        Ok(celsius)
    }

    /// Render a quantity as `"<magnitude> <unit>"`
    pub fn render(&self, quantity: &Quantity) -> String {
        format!(
            "{} {}",
            format_magnitude(quantity.magnitude),
            self.name(quantity.unit)
        )
    }

    /// Render a Celsius temperature
    pub fn render_temperature(&self, celsius: f64) -> String {
        format!("{} {}", format_magnitude(celsius), self.name(Unit::Celsius))
    }

    fn name(&self, unit: Unit) -> String {
        match self.defs.get(&unit) {
            Some(def) => def.name.to_string(),
            None => format!("{:?}", unit).to_lowercase(),
        }
    }
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Whole numbers keep one decimal place so `100.0 percent` stays a float
fn format_magnitude(magnitude: f64) -> String {
    if magnitude.fract() == 0.0 && magnitude.abs() < 1e15 {
        format!("{:.1}", magnitude)
    } else {
        format!("{}", magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_quantity() {
        let units = UnitRegistry::new();
        let q = units.quantity(12.5, Unit::Percent).unwrap();
        assert_eq!(units.render(&q), "12.5 percent");

        let q = units.quantity(100.0, Unit::Percent).unwrap();
        assert_eq!(units.render(&q), "100.0 percent");

        let q = units.quantity(60.0, Unit::KilogramsPerSecond).unwrap();
        assert_eq!(units.render(&q), "60.0 kilogram / second");
    }

    #[test]
    fn test_offset_unit_is_definition_error() {
        let units = UnitRegistry::new();
        let err = units.quantity(20.0, Unit::Celsius).unwrap_err();
        assert!(matches!(err, DecodeError::Definition(_)));
        assert_eq!(units.temperature(-40.0).unwrap(), -40.0);
        assert_eq!(units.render_temperature(-40.0), "-40.0 degree_Celsius");
    }

    #[test]
    fn test_undefined_unit() {
        let units = UnitRegistry::empty();
        assert!(matches!(
            units.quantity(1.0, Unit::Volt),
            Err(DecodeError::Definition(_))
        ));
    }

    #[test]
    fn test_non_finite_magnitude() {
        let units = UnitRegistry::new();
        assert!(units.quantity(f64::NAN, Unit::Volt).is_err());
    }
}
