//! Per-zone pipeline: governed fetch, then deduplicated write.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::citydata::TelemetrySource;
use crate::ingest::governor::{Governor, GovernorClosed};
use crate::ingest::writer::SampleWriter;
use crate::utils::fmt_duration;
use crate::zones::Zone;

/// What happened to one zone during a cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ZoneOutcome {
    Ingested {
        inserted: usize,
        skipped: usize,
        /// Records dropped during normalization.
        malformed: usize,
    },
    FetchFailed {
        kind: &'static str,
        cause: String,
    },
    WriteFailed {
        cause: String,
    },
}

pub struct ZoneWorker {
    source: Arc<dyn TelemetrySource>,
    writer: SampleWriter,
    governor: Arc<Governor>,
}

impl ZoneWorker {
    pub fn new(
        source: Arc<dyn TelemetrySource>,
        writer: SampleWriter,
        governor: Arc<Governor>,
    ) -> Self {
        Self {
            source,
            writer,
            governor,
        }
    }

    /// Fetch one zone and store its new samples.
    ///
    /// Only a closed governor escapes as an error; every other failure is
    /// folded into the returned [`ZoneOutcome`].
    pub async fn process(&self, zone: &Zone) -> Result<ZoneOutcome, GovernorClosed> {
        let start = Instant::now();
        let fetched = self.governor.admit(self.source.fetch(zone)).await?;

        let parsed = match fetched {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(
                    zone = zone.code,
                    kind = e.kind(),
                    error = %e,
                    "Fetch failed"
                );
                return Ok(ZoneOutcome::FetchFailed {
                    kind: e.kind(),
                    cause: e.to_string(),
                });
            }
        };

        for rejected in &parsed.rejected {
            warn!(zone = zone.code, error = %rejected, "Skipping malformed record");
        }
        let malformed = parsed.rejected.len();

        match self.writer.write(zone, &parsed.samples).await {
            Ok(counts) => {
                let duration = fmt_duration(start.elapsed());
                if counts.inserted > 0 {
                    info!(
                        zone = zone.code,
                        inserted = counts.inserted,
                        skipped = counts.skipped,
                        malformed,
                        duration,
                        "Zone ingested"
                    );
                } else {
                    debug!(
                        zone = zone.code,
                        skipped = counts.skipped,
                        malformed,
                        duration,
                        "Zone ingested, no new samples"
                    );
                }
                Ok(ZoneOutcome::Ingested {
                    inserted: counts.inserted,
                    skipped: counts.skipped,
                    malformed,
                })
            }
            Err(e) => {
                error!(zone = zone.code, error = ?e, "Write failed, batch rolled back");
                Ok(ZoneOutcome::WriteFailed {
                    cause: format!("{:#}", anyhow::Error::new(e)),
                })
            }
        }
    }
}
