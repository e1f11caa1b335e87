//! One ingestion cycle: every zone, in fixed-size sequential batches.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::ingest::governor::GovernorClosed;
use crate::ingest::worker::{ZoneOutcome, ZoneWorker};
use crate::zones::Zone;

#[derive(Debug, Clone, Serialize)]
pub struct ZoneReport {
    pub zone: &'static str,
    #[serde(flatten)]
    pub outcome: ZoneOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleTotals {
    pub zones_ingested: usize,
    pub fetch_failed: usize,
    pub write_failed: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub malformed: usize,
    /// Zones never attempted because the cycle was cancelled.
    pub not_attempted: usize,
}

/// Summary of a finished (or cancelled) cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub next_start_at: DateTime<Utc>,
    pub cancelled: bool,
    pub totals: CycleTotals,
    pub zones: Vec<ZoneReport>,
}

impl CycleReport {
    pub fn new(started_at: DateTime<Utc>, next_start_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: None,
            next_start_at,
            cancelled: false,
            totals: CycleTotals::default(),
            zones: Vec::new(),
        }
    }

    fn record(&mut self, zone: &'static str, outcome: ZoneOutcome) {
        let totals = &mut self.totals;
        match &outcome {
            ZoneOutcome::Ingested {
                inserted,
                skipped,
                malformed,
            } => {
                totals.zones_ingested += 1;
                totals.inserted += inserted;
                totals.skipped += skipped;
                totals.malformed += malformed;
            }
            ZoneOutcome::FetchFailed { .. } => totals.fetch_failed += 1,
            ZoneOutcome::WriteFailed { .. } => totals.write_failed += 1,
        }
        self.zones.push(ZoneReport { zone, outcome });
    }
}

/// Run every zone through `worker`, `batch_size` zones at a time.
///
/// Zones within a batch run concurrently; batches run one after another.
/// Cancellation is checked before each batch, so a batch already started
/// always runs to completion.
pub async fn run_cycle(
    worker: &ZoneWorker,
    zones: &'static [Zone],
    batch_size: usize,
    cancel: &CancellationToken,
    mut report: CycleReport,
) -> Result<CycleReport, GovernorClosed> {
    let batch_size = batch_size.max(1);
    let mut attempted = 0;

    for (index, batch) in zones.chunks(batch_size).enumerate() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            report.totals.not_attempted = zones.len() - attempted;
            info!(
                batch = index,
                remaining = report.totals.not_attempted,
                "Cycle cancelled between batches"
            );
            break;
        }

        debug!(batch = index, zones = batch.len(), "Starting batch");
        let outcomes = join_all(batch.iter().map(|zone| worker.process(zone))).await;
        for (zone, outcome) in batch.iter().zip(outcomes) {
            report.record(zone.code, outcome?);
        }
        attempted += batch.len();
    }

    report.finished_at = Some(Utc::now());
    Ok(report)
}
