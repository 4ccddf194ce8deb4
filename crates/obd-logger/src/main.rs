//! OBD Logger - Main Entry Point

use anyhow::Context;
use obd_logger::{init_logging, LoggerSettings, LoggingSession};
use obd_protocol::{LinkProvider, MockLinkProvider, SerialLinkProvider};
use std::process::ExitCode;
use tracing::{error, info};

async fn run<P: LinkProvider>(provider: P, settings: &LoggerSettings) -> anyhow::Result<()> {
    let mut session = LoggingSession::start(provider, settings).await?;
    info!("Logging vehicle {}", session.vin());

    let result = tokio::select! {
        result = session.run() => result,
        signal = tokio::signal::ctrl_c() => {
            signal.context("waiting for Ctrl-C")?;
            info!("Shutdown requested");
            Ok(())
        }
    };

    session.close().await;
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match LoggerSettings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Invalid settings: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(settings.log_level()) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    info!("=== OBD Logger v{} ===", env!("CARGO_PKG_VERSION"));

    let result = if settings.mock {
        info!("Using simulated adapter");
        run(MockLinkProvider::new(), &settings).await
    } else {
        run(SerialLinkProvider::new(), &settings).await
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
