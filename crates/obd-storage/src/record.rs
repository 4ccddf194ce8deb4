//! Output Record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One executed command, bracketed by the times the query started and ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObdRecord {
    pub command_name: String,
    /// Normalized value or the `"no response"` sentinel
    pub obd_response_value: Value,
    pub iso_ts_pre: DateTime<Utc>,
    pub iso_ts_post: DateTime<Utc>,
}

impl ObdRecord {
    pub fn new(
        command_name: impl Into<String>,
        obd_response_value: Value,
        iso_ts_pre: DateTime<Utc>,
        iso_ts_post: DateTime<Utc>,
    ) -> Self {
        Self {
            command_name: command_name.into(),
            obd_response_value,
            iso_ts_pre,
            iso_ts_post,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_field_names_and_timestamps() {
        let pre = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let post = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 1).unwrap();
        let record = ObdRecord::new("RPM", Value::String("1726.0 revolutions_per_minute".into()), pre, post);

        let line = serde_json::to_string(&record).unwrap();
        assert_eq!(
            line,
            r#"{"command_name":"RPM","obd_response_value":"1726.0 revolutions_per_minute","iso_ts_pre":"2024-03-01T12:00:00Z","iso_ts_post":"2024-03-01T12:00:01Z"}"#
        );
    }
}
