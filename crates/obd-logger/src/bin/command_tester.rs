//! OBD Command Tester - runs every known command against the vehicle

use obd_logger::{init_logging, run_command_tester, LoggerSettings};
use obd_protocol::{ConnectionManager, LinkProvider, MockLinkProvider, SerialLinkProvider};
use std::process::ExitCode;
use tracing::{error, info};

async fn run<P: LinkProvider>(provider: P, settings: &LoggerSettings) -> anyhow::Result<()> {
    let mut manager =
        ConnectionManager::connect(provider, settings.client_options(), settings.retry_policy())
            .await?;

    let result = tokio::select! {
        result = run_command_tester(&mut manager, settings) => result.map(|path| {
            info!("Results written to {}", path.display());
        }),
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
            Ok(())
        }
    };

    manager.close().await;
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

    info!("=== OBD Command Tester v{} ===", env!("CARGO_PKG_VERSION"));

    let result = if settings.mock {
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
