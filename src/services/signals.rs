use std::process::ExitCode;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

use crate::services::ServiceResult;
use crate::services::manager::ServiceManager;
use crate::utils::fmt_duration;

/// Run until a termination signal arrives or a service stops, then shut everything down.
///
/// A service that fails, or any service still running after `shutdown_timeout`,
/// produces a failure exit code so a supervisor restarts the process.
pub async fn handle_shutdown_signals(
    mut service_manager: ServiceManager,
    shutdown_timeout: Duration,
) -> ExitCode {
    let mut exit_code = tokio::select! {
        (name, result) = service_manager.run() => match result {
            ServiceResult::Error(e) => {
                error!(service = name, error = ?e, "Service failed, shutting down");
                ExitCode::FAILURE
            }
            ServiceResult::NormalCompletion | ServiceResult::GracefulShutdown => {
                warn!(service = name, "Service stopped, shutting down");
                ExitCode::SUCCESS
            }
        },
        _ = ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            ExitCode::SUCCESS
        }
        _ = terminate() => {
            info!("Received SIGTERM, shutting down");
            ExitCode::SUCCESS
        }
    };

    match service_manager.shutdown(shutdown_timeout).await {
        Ok(elapsed) => info!(
            duration = fmt_duration(elapsed),
            "Graceful shutdown complete"
        ),
        Err(pending) => {
            warn!(
                pending = ?pending,
                timeout = fmt_duration(shutdown_timeout),
                "Shutdown timed out with services still running"
            );
            exit_code = ExitCode::FAILURE;
        }
    }

    exit_code
}

async fn ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = ?e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            error!(error = ?e, "Failed to listen for SIGTERM");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
