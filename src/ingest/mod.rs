//! Periodic ingestion of zone telemetry into the sample store.
//!
//! The [`scheduler::Scheduler`] walks the zone registry in batches every
//! interval. Each zone is fetched through the shared [`governor::Governor`]
//! and written by the deduplicating [`writer::SampleWriter`].

pub mod cadence;
pub mod cycle;
pub mod governor;
pub mod scheduler;
#[cfg(test)]
pub mod test_support;
pub mod worker;
pub mod writer;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

use crate::citydata::TelemetrySource;
use crate::config::IngestSettings;
use crate::data::store::SampleStore;
use crate::services::Service;
use crate::state::{ServiceStatus, ServiceStatusRegistry};
use crate::zones::Zone;

use cycle::CycleReport;
use governor::{Governor, GovernorClosed};
use scheduler::Scheduler;
use worker::ZoneWorker;
use writer::SampleWriter;

/// Failures that stop ingestion entirely.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("ingestion scheduler failed: {0}")]
    SchedulerFatal(String),
}

impl From<GovernorClosed> for IngestError {
    fn from(e: GovernorClosed) -> Self {
        IngestError::SchedulerFatal(e.to_string())
    }
}

impl From<JoinError> for IngestError {
    fn from(e: JoinError) -> Self {
        IngestError::SchedulerFatal(format!("cycle task failed: {e}"))
    }
}

/// Hosts the ingestion scheduler as a supervised service.
pub struct IngestService {
    scheduler: Option<Scheduler>,
    handle: Option<JoinHandle<Result<(), IngestError>>>,
    shutdown_tx: Option<broadcast::Sender<()>>,
    statuses: ServiceStatusRegistry,
}

impl IngestService {
    pub fn new(
        source: Arc<dyn TelemetrySource>,
        store: Arc<dyn SampleStore>,
        zones: &'static [Zone],
        settings: IngestSettings,
        reports: watch::Sender<Option<CycleReport>>,
        statuses: ServiceStatusRegistry,
    ) -> Self {
        let governor = Arc::new(Governor::new(settings.max_concurrency, settings.request_delay));
        let worker = Arc::new(ZoneWorker::new(source, SampleWriter::new(store), governor));
        Self {
            scheduler: Some(Scheduler::new(worker, zones, settings, reports)),
            handle: None,
            shutdown_tx: None,
            statuses,
        }
    }
}

#[async_trait]
impl Service for IngestService {
    fn name(&self) -> &'static str {
        "ingest"
    }

    async fn run(&mut self) -> Result<()> {
        if let Some(scheduler) = self.scheduler.take() {
            let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
            self.shutdown_tx = Some(shutdown_tx);
            self.handle = Some(tokio::spawn(async move { scheduler.run(shutdown_rx).await }));
            self.statuses.set(self.name(), ServiceStatus::Active);
            info!("Ingestion service started");
        }

        let Some(handle) = self.handle.as_mut() else {
            return Ok(());
        };
        let result = handle.await;
        self.handle = None;

        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!(error = %e, "Ingestion scheduler stopped");
                self.statuses.set(self.name(), ServiceStatus::Error);
                Err(e.into())
            }
            Err(e) => {
                error!(error = ?e, "Ingestion scheduler task panicked");
                self.statuses.set(self.name(), ServiceStatus::Error);
                Err(IngestError::from(e).into())
            }
        }
    }

    async fn shutdown(&mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            // The scheduler's own grace period is 5s; allow a little beyond it.
            match tokio::time::timeout(Duration::from_secs(6), handle).await {
                Ok(Ok(Ok(()))) => info!("Ingestion service stopped"),
                Ok(Ok(Err(e))) => warn!(error = %e, "Ingestion scheduler failed during shutdown"),
                Ok(Err(e)) => warn!(error = ?e, "Ingestion scheduler task panicked during shutdown"),
                Err(_) => warn!("Ingestion scheduler did not stop in time"),
            }
        }
        self.statuses.set(self.name(), ServiceStatus::Disabled);
        Ok(())
    }
}
