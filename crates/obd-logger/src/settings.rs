//! Logger Settings
//!
//! Built from defaults, an optional `obd_logger.{toml,yaml,ini,json}` file
//! in the working directory, and `OBD_LOGGER__*` environment variables, in
//! increasing order of precedence.

use config::{Config, ConfigError, Environment, File};
use obd_protocol::{ClientOptions, ObdProtocol, RetryPolicy, CONNECTION_RETRY_COUNT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

/// Settings file looked up in the working directory
pub const SETTINGS_FILE: &str = "obd_logger";

const DEFAULT_BASE_PATH: &str = "data";
const DEFAULT_CONFIG_DIR: &str = "config";
const DEFAULT_FULL_CYCLES: u64 = 50;
const DEFAULT_TIMEOUT_MS: u64 = 1000;
const DEFAULT_RETRY_DELAY_SECS: u64 = 15;
const DEFAULT_TEST_CYCLES: u64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Output root; files land in `<base_path>/<VIN>/`
    pub base_path: PathBuf,
    /// Directory holding schedule files
    pub config_dir: PathBuf,
    /// Explicit schedule file inside `config_dir`
    pub config_file: Option<String>,
    /// Completed schedule cycles per output file
    pub full_cycles: u64,
    /// Append the responder count to requests
    pub fast: bool,
    pub timeout_ms: u64,
    /// Fixed baud rate; probed when unset
    pub baud_rate: Option<u32>,
    /// Wait between connection attempts
    pub retry_delay_secs: u64,
    pub verbose: bool,
    /// Talk to the built-in simulator instead of a serial adapter
    pub mock: bool,
    /// Passes over the catalog made by the command tester
    pub test_cycles: u64,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from(DEFAULT_BASE_PATH),
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: None,
            full_cycles: DEFAULT_FULL_CYCLES,
            fast: true,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            baud_rate: None,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
            verbose: false,
            mock: false,
            test_cycles: DEFAULT_TEST_CYCLES,
        }
    }
}

impl LoggerSettings {
    /// Load from the working directory settings file and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(SETTINGS_FILE))
    }

    /// Load with `file` (extension optional) as the settings file
    pub fn load_from(file: &Path) -> Result<Self, ConfigError> {
        let settings: Self = Config::builder()
            .set_default("base_path", DEFAULT_BASE_PATH)?
            .set_default("config_dir", DEFAULT_CONFIG_DIR)?
            .set_default("full_cycles", DEFAULT_FULL_CYCLES)?
            .set_default("fast", true)?
            .set_default("timeout_ms", DEFAULT_TIMEOUT_MS)?
            .set_default("retry_delay_secs", DEFAULT_RETRY_DELAY_SECS)?
            .set_default("verbose", false)?
            .set_default("mock", false)?
            .set_default("test_cycles", DEFAULT_TEST_CYCLES)?
            .add_source(File::from(file).required(false))
            .add_source(
                Environment::with_prefix("OBD_LOGGER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if settings.full_cycles == 0 {
            return Err(ConfigError::Message(
                "full_cycles must be at least 1".to_string(),
            ));
        }
        Ok(settings)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            fast: self.fast,
            timeout: Duration::from_millis(self.timeout_ms),
            baud_rate: self.baud_rate,
            protocol: ObdProtocol::Auto,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: CONNECTION_RETRY_COUNT,
            delay: Duration::from_secs(self.retry_delay_secs),
        }
    }

    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = LoggerSettings::load_from(&dir.path().join("missing")).unwrap();
        assert_eq!(settings, LoggerSettings::default());
        assert_eq!(settings.log_level(), Level::INFO);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obd_logger.toml");
        std::fs::write(
            &path,
            "base_path = \"/var/log/obd\"\nfull_cycles = 10\nfast = false\nbaud_rate = 38400\nverbose = true\n",
        )
        .unwrap();

        let settings = LoggerSettings::load_from(&path).unwrap();
        assert_eq!(settings.base_path, PathBuf::from("/var/log/obd"));
        assert_eq!(settings.full_cycles, 10);
        assert!(!settings.fast);
        assert_eq!(settings.baud_rate, Some(38400));
        assert_eq!(settings.log_level(), Level::DEBUG);
        assert_eq!(settings.config_dir, PathBuf::from(DEFAULT_CONFIG_DIR));

        let options = settings.client_options();
        assert!(!options.fast);
        assert_eq!(options.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }

    #[test]
    fn test_zero_cycles_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obd_logger.toml");
        std::fs::write(&path, "full_cycles = 0\n").unwrap();
        assert!(LoggerSettings::load_from(&path).is_err());
    }
}
