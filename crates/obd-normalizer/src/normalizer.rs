//! Response Normalization
//!
//! Turns decoded values into JSON that the output records can carry. Every
//! empty condition collapses to the [`NO_RESPONSE`] sentinel.

use obd_protocol::{DecodedValue, Flag, UnitRegistry, ERROR_MARKERS};
use serde_json::Value;
use tracing::debug;

/// Sentinel written when a command produced nothing usable
pub const NO_RESPONSE: &str = "no response";

/// Renders decoded values with one shared unit registry
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    units: &'a UnitRegistry,
}

impl<'a> Normalizer<'a> {
    pub fn new(units: &'a UnitRegistry) -> Self {
        Self { units }
    }

    /// Normalize the result of command `name`.
    ///
    /// Total: every variant maps to a value, nothing here can fail.
    pub fn normalize(&self, name: &str, value: Option<&DecodedValue>) -> Value {
        let normalized = match value {
            None | Some(DecodedValue::Absent) => no_response(),
            Some(DecodedValue::Scalar(quantity)) => Value::String(self.units.render(quantity)),
            Some(DecodedValue::Temperature(celsius)) => {
                Value::String(self.units.render_temperature(*celsius))
            }
            Some(DecodedValue::Category(text)) | Some(DecodedValue::RawText(text)) => text_value(text),
            Some(DecodedValue::Bytes(bytes)) => text_value(&String::from_utf8_lossy(bytes)),
            Some(DecodedValue::Status(record)) => Value::Array(
                record
                    .base_tests()
                    .iter()
                    .map(|test| Value::String(test.to_string()))
                    .collect(),
            ),
            Some(DecodedValue::FlagList(flags)) => {
                let mut out = Vec::with_capacity(flags.len());
                self.flatten(flags, &mut out);
                Value::Array(out)
            }
        };

        debug!("{} -> {}", name, normalized);
        normalized
    }

    /// Append `flags` to `out`, splicing nested groups in place
    fn flatten(&self, flags: &[Flag], out: &mut Vec<Value>) {
        for flag in flags {
            match flag {
                Flag::Bool(bit) => out.push(Value::Bool(*bit)),
                Flag::Scalar(quantity) => out.push(Value::String(self.units.render(quantity))),
                Flag::Temperature(celsius) => {
                    out.push(Value::String(self.units.render_temperature(*celsius)))
                }
                Flag::Category(text) => out.push(Value::String(text.clone())),
                Flag::Group(group) => self.flatten(group, out),
                Flag::Absent => out.push(Value::Null),
            }
        }
    }
}

fn no_response() -> Value {
    Value::String(NO_RESPONSE.to_string())
}

/// Text, or the sentinel when it is empty or adapter error output
fn text_value(text: &str) -> Value {
    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    if text.is_empty() || is_adapter_error(text) {
        no_response()
    } else {
        Value::String(text.to_string())
    }
}

fn is_adapter_error(text: &str) -> bool {
    let upper = text.to_ascii_uppercase();
    ERROR_MARKERS.iter().any(|marker| upper.contains(marker))
}
