//! Schedule Configuration
//!
//! Loads the `startup`, `housekeeping` and `cycle` command name lists with
//! the `config` crate. INI files use one section per list:
//!
//! ```ini
//! [STARTUP NAMES]
//! startup = ELM_VERSION ELM_VOLTAGE VIN
//!
//! [HOUSEKEEPING NAMES]
//! housekeeping = ELM_VOLTAGE
//!
//! [CYCLE NAMES]
//! cycle =
//!     RPM
//!     SPEED
//! ```
//!
//! TOML, YAML and JSON files carry the lists at the top level, either as
//! arrays or whitespace-separated strings.

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Fallback schedule when no VIN-specific file exists
pub const DEFAULT_CONFIG_FILE: &str = "default.ini";

/// Errors while locating or loading a schedule
#[derive(Debug, Error)]
pub enum ConfigError {
    /// None of the candidate files exist
    #[error("No schedule configuration found, searched {searched:?}")]
    NotFound { searched: Vec<PathBuf> },

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid schedule configuration: {0}")]
    Parse(#[from] config::ConfigError),
}

/// The three command name lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleConfig {
    pub startup: Vec<String>,
    pub housekeeping: Vec<String>,
    pub cycle: Vec<String>,
}

/// A list given as `[a, b]` or as `"a b"`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NameList {
    Text(String),
    List(Vec<String>),
}

impl NameList {
    fn into_names(self) -> Vec<String> {
        match self {
            NameList::Text(text) => text.split_whitespace().map(str::to_string).collect(),
            NameList::List(list) => list
                .iter()
                .flat_map(|item| item.split_whitespace())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// One INI section holding one list
#[derive(Debug, Deserialize)]
struct Section {
    #[serde(alias = "startup", alias = "housekeeping", alias = "cycle")]
    names: Option<NameList>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSchedule {
    startup: Option<NameList>,
    housekeeping: Option<NameList>,
    cycle: Option<NameList>,
    #[serde(rename = "STARTUP NAMES", alias = "startup names")]
    startup_section: Option<Section>,
    #[serde(rename = "HOUSEKEEPING NAMES", alias = "housekeeping names")]
    housekeeping_section: Option<Section>,
    #[serde(rename = "CYCLE NAMES", alias = "cycle names")]
    cycle_section: Option<Section>,
}

fn pick(flat: Option<NameList>, section: Option<Section>) -> Vec<String> {
    flat.or_else(|| section.and_then(|s| s.names))
        .map(NameList::into_names)
        .unwrap_or_default()
}

impl From<RawSchedule> for ScheduleConfig {
    fn from(raw: RawSchedule) -> Self {
        Self {
            startup: pick(raw.startup, raw.startup_section),
            housekeeping: pick(raw.housekeeping, raw.housekeeping_section),
            cycle: pick(raw.cycle, raw.cycle_section),
        }
    }
}

impl ScheduleConfig {
    /// Load a schedule file; the format follows the file extension
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading schedule from {}", path.display());

        let is_ini = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("ini"));

        let builder = if is_ini {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Config::builder().add_source(File::from_str(&fold_continuations(&text), FileFormat::Ini))
        } else {
            Config::builder().add_source(File::from(path))
        };

        let raw: RawSchedule = builder.build()?.try_deserialize()?;
        let schedule = ScheduleConfig::from(raw);
        debug!("Schedule: {:?}", schedule);
        Ok(schedule)
    }

    /// Parse INI text directly
    pub fn from_ini(text: &str) -> Result<Self, ConfigError> {
        let raw: RawSchedule = Config::builder()
            .add_source(File::from_str(&fold_continuations(text), FileFormat::Ini))
            .build()?
            .try_deserialize()?;
        Ok(ScheduleConfig::from(raw))
    }

    /// Every name in the schedule, in list order
    pub fn names(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.startup
            .iter()
            .map(|n| ("startup", n.as_str()))
            .chain(self.housekeeping.iter().map(|n| ("housekeeping", n.as_str())))
            .chain(self.cycle.iter().map(|n| ("cycle", n.as_str())))
    }

    /// Keep only the names `keep` accepts, in every list
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        for list in [&mut self.startup, &mut self.housekeeping, &mut self.cycle] {
            list.retain(|name| keep(name.as_str()));
        }
    }

    /// Whether the schedule never gets past startup
    pub fn is_startup_only(&self) -> bool {
        self.cycle.is_empty() && self.housekeeping.is_empty()
    }
}

/// Join indented continuation lines onto the key line above them.
///
/// `rust-ini` reads one line per value; schedule files commonly list one
/// command per indented line.
fn fold_continuations(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        let continues = line.starts_with(|c: char| c == ' ' || c == '\t')
            && !trimmed.is_empty()
            && !trimmed.starts_with(|c: char| c == '#' || c == ';')
            && out.last().is_some_and(|prev| prev.contains('=') && !prev.trim_start().starts_with('['));

        match out.last_mut() {
            Some(prev) if continues => {
                prev.push(' ');
                prev.push_str(trimmed);
            }
            _ => out.push(line.to_string()),
        }
    }
    out.join("\n")
}

/// Find the schedule file for `vin`.
///
/// An explicit `config_file` is looked up in `config_dir` only. Otherwise
/// `<vin>.ini` then `default.ini` are tried, each first in the working
/// directory and then in `config_dir`.
pub fn locate(
    vin: &str,
    config_dir: &Path,
    config_file: Option<&str>,
) -> Result<PathBuf, ConfigError> {
    let candidates: Vec<PathBuf> = match config_file {
        Some(file) => vec![config_dir.join(file)],
        None => {
            let vin_file = format!("{}.ini", vin);
            vec![
                PathBuf::from(&vin_file),
                config_dir.join(&vin_file),
                PathBuf::from(DEFAULT_CONFIG_FILE),
                config_dir.join(DEFAULT_CONFIG_FILE),
            ]
        }
    };

    match candidates.iter().find(|path| path.is_file()) {
        Some(path) => {
            info!("Using schedule file {}", path.display());
            Ok(path.clone())
        }
        None => Err(ConfigError::NotFound {
            searched: candidates,
        }),
    }
}
