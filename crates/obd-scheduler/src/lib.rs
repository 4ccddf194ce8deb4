//! OBD-II Command Scheduling
//!
//! Loads the startup / housekeeping / cycle command lists, checks them
//! against the command catalog, and turns them into an endless,
//! deterministic sequence of command names.

pub mod config;
mod scheduler;
mod validate;

pub use config::{locate, ConfigError, ScheduleConfig, DEFAULT_CONFIG_FILE};
pub use scheduler::{CommandScheduler, Phase};
pub use validate::{validate, UnknownName, ValidationReport};
