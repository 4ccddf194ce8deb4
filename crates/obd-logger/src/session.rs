//! Logging Session

use crate::settings::LoggerSettings;
use anyhow::Context;
use chrono::Utc;
use obd_normalizer::Normalizer;
use obd_protocol::{ConnectionError, ConnectionManager, LinkProvider, QueryError, UNKNOWN_VIN};
use obd_scheduler::{locate, validate, CommandScheduler, ScheduleConfig};
use obd_storage::{JsonLinesWriter, ObdRecord};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Execute `name` and build its output record.
///
/// Returns `None` when nothing is recorded: unknown names, and commands
/// whose link dropped (the connection has been replaced by then). Decoder
/// failures are recorded as `"no response"`. Only losing the adapter for
/// good is an error.
pub async fn record_command<P: LinkProvider>(
    manager: &mut ConnectionManager<P>,
    name: &str,
) -> Result<Option<ObdRecord>, ConnectionError> {
    let iso_ts_pre = Utc::now();
    let result = manager.execute(name).await;
    let iso_ts_post = Utc::now();

    let value = match result {
        Ok(Some(value)) => Some(value),
        Ok(None) => return Ok(None),
        Err(QueryError::Link { command, source }) => {
            debug!("{}: no record, link lost ({})", command, source);
            return Ok(None);
        }
        Err(QueryError::Definition { .. }) | Err(QueryError::Decode { .. }) => None,
        Err(QueryError::Connection(e)) => return Err(e),
    };

    let normalized = Normalizer::new(manager.units()).normalize(name, value.as_ref());
    Ok(Some(ObdRecord::new(name, normalized, iso_ts_pre, iso_ts_post)))
}

/// Summary of one output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub records: usize,
    /// The schedule can produce no more names
    pub finished: bool,
}

/// A connected vehicle, its schedule, and where its records go
pub struct LoggingSession<P: LinkProvider> {
    manager: ConnectionManager<P>,
    scheduler: CommandScheduler,
    vin: String,
    base_path: PathBuf,
    full_cycles: u64,
}

impl<P: LinkProvider> LoggingSession<P> {
    /// Connect, identify the vehicle, and load its schedule
    pub async fn start(provider: P, settings: &LoggerSettings) -> anyhow::Result<Self> {
        let mut manager = ConnectionManager::connect(
            provider,
            settings.client_options(),
            settings.retry_policy(),
        )
        .await?;

        match manager.elm_info().await {
            Ok((version, voltage)) => info!("ELM version {}, battery {}", version, voltage),
            Err(QueryError::Connection(e)) => return Err(e.into()),
            Err(e) => warn!("Could not read adapter information: {}", e),
        }

        let vin = match manager.vin().await {
            Ok(vin) => vin,
            Err(QueryError::Connection(e)) => return Err(e.into()),
            Err(e) => {
                warn!("Could not read VIN: {}", e);
                UNKNOWN_VIN.to_string()
            }
        };

        let path = locate(&vin, &settings.config_dir, settings.config_file.as_deref())?;
        let mut schedule = ScheduleConfig::load(&path)
            .with_context(|| format!("loading schedule {}", path.display()))?;
        let report = validate(&schedule, manager.catalog());
        if !report.unknown.is_empty() {
            warn!(
                "{} unknown command names in {} will be skipped",
                report.unknown.len(),
                path.display()
            );
            schedule.retain(|name| manager.catalog().contains(name));
        }
        if schedule.is_startup_only() {
            warn!(
                "{} has no known cycle or housekeeping commands, the session ends after startup",
                path.display()
            );
        }

        Ok(Self {
            manager,
            scheduler: CommandScheduler::new(schedule),
            vin,
            base_path: settings.base_path.clone(),
            full_cycles: settings.full_cycles.max(1),
        })
    }

    pub fn vin(&self) -> &str {
        &self.vin
    }

    /// Schedule being run, unknown names already removed
    pub fn schedule(&self) -> &ScheduleConfig {
        self.scheduler.schedule()
    }

    pub fn completed_cycles(&self) -> u64 {
        self.scheduler.completed_cycles()
    }

    /// Write output files until the schedule runs out
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let outcome = self.write_file().await?;
            info!("Closed {} with {} records", outcome.path.display(), outcome.records);
            if outcome.finished {
                info!("Schedule has no more commands");
                return Ok(());
            }
        }
    }

    /// Fill one output file, stopping after `full_cycles` completed cycles
    pub async fn write_file(&mut self) -> anyhow::Result<FileOutcome> {
        let mut writer = JsonLinesWriter::create(&self.base_path, &self.vin, None, Utc::now())?;
        let first_cycle = self.scheduler.completed_cycles();

        loop {
            // one command per turn, so shutdown signals get polled
            tokio::task::yield_now().await;

            let Some(name) = self.scheduler.next() else {
                return Ok(FileOutcome {
                    path: writer.path().to_path_buf(),
                    records: writer.records(),
                    finished: true,
                });
            };

            if let Some(record) = record_command(&mut self.manager, &name).await? {
                writer.append(&record)?;
            }

            if self.scheduler.completed_cycles() - first_cycle >= self.full_cycles {
                return Ok(FileOutcome {
                    path: writer.path().to_path_buf(),
                    records: writer.records(),
                    finished: false,
                });
            }
        }
    }

    /// Release the adapter
    pub async fn close(&mut self) {
        self.manager.close().await;
    }
}
