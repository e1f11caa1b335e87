use crate::citydata::CityDataClient;
use crate::cli::ServiceName;
use crate::config::Config;
use crate::data::store::PgSampleStore;
use crate::ingest::IngestService;
use crate::services::manager::ServiceManager;
use crate::services::web::WebService;
use crate::state::{AppState, ServiceStatus, ServiceStatusRegistry};
use crate::utils::fmt_duration;
use crate::zones;
use anyhow::Context;
use sqlx::ConnectOptions;
use sqlx::postgres::PgPoolOptions;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

/// Main application struct containing all necessary components
pub struct App {
    config: Config,
    db_pool: sqlx::PgPool,
    app_state: AppState,
    cycle_reports: watch::Sender<Option<crate::ingest::cycle::CycleReport>>,
    service_manager: ServiceManager,
}

impl App {
    /// Connect to the database, apply migrations, and build shared state.
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        let slow_threshold = Duration::from_millis(500);

        let connect_options = sqlx::postgres::PgConnectOptions::from_str(&config.database_url)
            .context("Failed to parse database URL")?
            .log_statements(tracing::log::LevelFilter::Debug)
            .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(1));

        let max_connections = pool_size(config.ingest_batch_size);
        let db_pool = PgPoolOptions::new()
            .min_connections(0)
            .max_connections(max_connections)
            .acquire_slow_threshold(slow_threshold)
            .acquire_timeout(Duration::from_secs(4))
            .idle_timeout(Duration::from_secs(60 * 2))
            .max_lifetime(Duration::from_secs(60 * 30))
            .connect_with(connect_options)
            .await
            .context("Failed to create database pool")?;

        info!(
            min_connections = 0,
            max_connections,
            acquire_timeout = "4s",
            idle_timeout = "2m",
            max_lifetime = "30m",
            acquire_slow_threshold = fmt_duration(slow_threshold),
            "database pool established"
        );

        info!("running database migrations");
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run database migrations")?;
        info!("database migrations completed");

        let (cycle_reports, last_cycle) = watch::channel(None);
        let app_state = AppState::new(db_pool.clone(), ServiceStatusRegistry::new(), last_cycle);

        Ok(App {
            config,
            db_pool,
            app_state,
            cycle_reports,
            service_manager: ServiceManager::new(),
        })
    }

    /// Setup and register services based on enabled service list
    pub fn setup_services(&mut self, services: &[ServiceName]) -> Result<(), anyhow::Error> {
        if services.contains(&ServiceName::Web) {
            let web_service = Box::new(WebService::new(
                self.config.port,
                self.config.public_origin.clone(),
                self.app_state.clone(),
            ));
            self.service_manager
                .register_service(ServiceName::Web.as_str(), web_service);
            self.app_state
                .service_statuses
                .set(ServiceName::Web.as_str(), ServiceStatus::Starting);
        }

        if services.contains(&ServiceName::Ingest) {
            let client = CityDataClient::new(self.config.citydata())
                .context("Failed to create citydata client")?;
            let ingest_service = Box::new(IngestService::new(
                Arc::new(client),
                Arc::new(PgSampleStore::new(self.db_pool.clone())),
                zones::all(),
                self.config.ingest(),
                self.cycle_reports.clone(),
                self.app_state.service_statuses.clone(),
            ));
            self.service_manager
                .register_service(ServiceName::Ingest.as_str(), ingest_service);
            self.app_state
                .service_statuses
                .set(ServiceName::Ingest.as_str(), ServiceStatus::Starting);
        }

        if !self.service_manager.has_services() {
            error!("No services enabled. Cannot start application.");
            return Err(anyhow::anyhow!("No services enabled"));
        }

        Ok(())
    }

    /// Start all registered services
    pub fn start_services(&mut self) {
        self.service_manager.spawn_all();
    }

    /// Run the application and handle shutdown signals
    pub async fn run(self) -> ExitCode {
        use crate::services::signals::handle_shutdown_signals;
        handle_shutdown_signals(self.service_manager, self.config.shutdown_timeout).await
    }
}

/// Connections reserved for API queries on top of ingestion writes.
const WEB_CONNECTIONS: u32 = 2;

/// Upper bound on connections held for concurrent zone writes.
const MAX_WRITE_CONNECTIONS: u32 = 32;

/// Pool size for a given batch size.
///
/// Every zone in a batch may be writing at once, each in its own transaction,
/// so the pool holds one connection per batch slot plus the API's share.
fn pool_size(batch_size: usize) -> u32 {
    u32::try_from(batch_size)
        .unwrap_or(u32::MAX)
        .clamp(1, MAX_WRITE_CONNECTIONS)
        + WEB_CONNECTIONS
}
