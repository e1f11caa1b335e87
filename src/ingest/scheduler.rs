use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};

use crate::config::IngestSettings;
use crate::ingest::IngestError;
use crate::ingest::cadence::{next_cycle_start, sleep_for};
use crate::ingest::cycle::{CycleReport, run_cycle};
use crate::ingest::worker::ZoneWorker;
use crate::utils::fmt_duration;
use crate::zones::Zone;

/// How long an in-flight batch may keep running after shutdown is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Drives ingestion cycles on a fixed cadence until shutdown.
pub struct Scheduler {
    worker: Arc<ZoneWorker>,
    zones: &'static [Zone],
    settings: IngestSettings,
    reports: watch::Sender<Option<CycleReport>>,
}

impl Scheduler {
    pub fn new(
        worker: Arc<ZoneWorker>,
        zones: &'static [Zone],
        settings: IngestSettings,
        reports: watch::Sender<Option<CycleReport>>,
    ) -> Self {
        Self {
            worker,
            zones,
            settings,
            reports,
        }
    }

    /// Runs cycles back to back, sleeping between them, until `shutdown_rx` fires.
    ///
    /// Each cycle runs in its own task. On shutdown the cycle is cancelled at the
    /// next batch boundary and given [`SHUTDOWN_GRACE`] to finish; after that it
    /// is aborted, which drops (and so rolls back) any open transaction.
    ///
    /// Returns an error only when a cycle panics or the governor closes.
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<(), IngestError> {
        info!(
            zones = self.zones.len(),
            batch_size = self.settings.batch_size,
            interval = fmt_duration(self.settings.interval),
            "Ingestion scheduler started"
        );

        loop {
            let started_at = Utc::now();
            let started = time::Instant::now();
            let next_start_at =
                next_cycle_start(started_at, self.settings.interval, self.settings.align_to_minute);
            let deadline = started + sleep_for(next_start_at, started_at);

            let cancel_token = CancellationToken::new();
            let mut handle = tokio::spawn({
                let worker = self.worker.clone();
                let zones = self.zones;
                let batch_size = self.settings.batch_size;
                let cancel_token = cancel_token.clone();
                async move {
                    let report = CycleReport::new(started_at, next_start_at);
                    run_cycle(&worker, zones, batch_size, &cancel_token, report).await
                }
            });

            let report = tokio::select! {
                joined = &mut handle => joined??,
                _ = shutdown_rx.recv() => {
                    info!("Ingestion scheduler received shutdown signal");
                    cancel_token.cancel();

                    let abort = handle.abort_handle();
                    match time::timeout(SHUTDOWN_GRACE, handle).await {
                        Err(_) => {
                            abort.abort();
                            warn!("Ingestion cycle did not complete within 5s, abandoning");
                        }
                        Ok(Ok(Ok(report))) => {
                            trace!("Ingestion cycle completed gracefully");
                            self.publish(report);
                        }
                        Ok(Ok(Err(e))) => warn!(error = %e, "Ingestion cycle ended during shutdown"),
                        Ok(Err(e)) => warn!(error = ?e, "Ingestion cycle task failed during shutdown"),
                    }

                    info!("Ingestion scheduler exiting gracefully");
                    return Ok(());
                }
            };

            let elapsed = started.elapsed();
            let totals = report.totals;
            info!(
                inserted = totals.inserted,
                skipped = totals.skipped,
                zones_ingested = totals.zones_ingested,
                fetch_failed = totals.fetch_failed,
                write_failed = totals.write_failed,
                malformed = totals.malformed,
                duration = fmt_duration(elapsed),
                "Ingestion cycle complete"
            );
            if elapsed > self.settings.interval {
                warn!(
                    duration = fmt_duration(elapsed),
                    interval = fmt_duration(self.settings.interval),
                    "Ingestion cycle overran its interval, starting next cycle immediately"
                );
            }
            self.publish(report);

            trace!(
                sleep = fmt_duration(deadline.saturating_duration_since(time::Instant::now())),
                "Ingestion scheduler idle"
            );
            tokio::select! {
                _ = time::sleep_until(deadline) => {}
                _ = shutdown_rx.recv() => {
                    info!("Ingestion scheduler received shutdown signal while idle, exiting");
                    return Ok(());
                }
            }
        }
    }

    fn publish(&self, report: CycleReport) {
        self.reports.send_replace(Some(report));
    }
}
