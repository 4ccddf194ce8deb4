//! Command Tester
//!
//! Runs every catalog command against the vehicle to find out which ones
//! it answers, writing the results next to the regular session files.

use crate::session::record_command;
use crate::settings::LoggerSettings;
use chrono::Utc;
use obd_protocol::{ConnectionManager, LinkProvider};
use obd_storage::JsonLinesWriter;
use std::path::PathBuf;
use tracing::info;

/// Tag inserted into the tester's output file name
pub const TEST_TAG: &str = "TEST";

/// Run every built-in and custom command `settings.test_cycles` times.
///
/// Returns the path of the `<VIN>-TEST-<timestamp>-utc.json` file written.
pub async fn run_command_tester<P: LinkProvider>(
    manager: &mut ConnectionManager<P>,
    settings: &LoggerSettings,
) -> anyhow::Result<PathBuf> {
    let vin = manager.vin().await?;
    let names: Vec<&'static str> = manager.catalog().all().map(|spec| spec.name).collect();
    let mut writer =
        JsonLinesWriter::create(&settings.base_path, &vin, Some(TEST_TAG), Utc::now())?;

    for cycle in 1..=settings.test_cycles {
        info!("Test cycle {}/{}: {} commands", cycle, settings.test_cycles, names.len());
        for name in &names {
            if let Some(record) = record_command(manager, name).await? {
                writer.append(&record)?;
            }
        }
    }

    info!(
        "Command test finished: {} records in {}",
        writer.records(),
        writer.path().display()
    );
    Ok(writer.path().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use obd_protocol::{MockLinkProvider, RetryPolicy, MOCK_VIN};
    use obd_storage::read_records;
    use serde_json::json;

    #[tokio::test]
    async fn test_runs_whole_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let settings = LoggerSettings {
            base_path: dir.path().to_path_buf(),
            timeout_ms: 100,
            test_cycles: 2,
            ..LoggerSettings::default()
        };
        let mut manager = ConnectionManager::connect(
            MockLinkProvider::new(),
            settings.client_options(),
            RetryPolicy::default(),
        )
        .await
        .unwrap();
        let commands = manager.catalog().len();

        let path = run_command_tester(&mut manager, &settings).await.unwrap();
        let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file_name.starts_with(&format!("{}-TEST-", MOCK_VIN)));

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 2 * commands);

        let odometer = records
            .iter()
            .find(|r| r.command_name == "ODOMETER")
            .unwrap();
        assert_eq!(odometer.obd_response_value, json!("10000.0 kilometer"));
        assert!(records
            .iter()
            .any(|r| r.obd_response_value == json!("no response")));
    }
}
