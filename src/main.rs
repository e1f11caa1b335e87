use clap::Parser;
use crowdpulse::app::App;
use crowdpulse::cli::Args;
use crowdpulse::config::Config;
use crowdpulse::logging::setup_logging;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let enabled_services = args.enabled_services();

    // Logging needs the config, so a config error can only go to stderr.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&config, args.tracing);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT_SHORT"),
        environment = if cfg!(debug_assertions) {
            "development"
        } else {
            "production"
        },
        enabled_services = ?enabled_services,
        "starting crowdpulse"
    );

    let mut app = match App::new(config).await {
        Ok(app) => app,
        Err(e) => {
            error!(error = format!("{e:#}"), "failed to initialize application");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = app.setup_services(&enabled_services) {
        error!(error = format!("{e:#}"), "failed to set up services");
        return ExitCode::FAILURE;
    }

    app.start_services();
    app.run().await
}
