//! OBD-II Logging Service
//!
//! Connects to the adapter, walks the command schedule, and appends one
//! normalized record per executed command to the session's output file.

pub mod settings;
mod session;
mod tester;

pub use session::{record_command, FileOutcome, LoggingSession};
pub use settings::LoggerSettings;
pub use tester::run_command_tester;

use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging(level: Level) -> Result<(), SetGlobalDefaultError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}
