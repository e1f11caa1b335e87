//! Deduplicating sample writer.
//!
//! Existing rows are immutable: a sample whose `(timestamp, zone_id)` already
//! exists is skipped, never updated. Each call runs in its own transaction and
//! either commits every new row or none of them.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::data::samples::Sample;
use crate::data::store::{SampleSession, SampleStore, StoreError};
use crate::zones::Zone;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertCounts {
    pub inserted: usize,
    pub skipped: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("could not open transaction")]
    Begin(#[source] StoreError),
    #[error("could not write sample at {timestamp}")]
    Sample {
        timestamp: NaiveDateTime,
        #[source]
        source: StoreError,
    },
    #[error("could not commit transaction")]
    Commit(#[source] StoreError),
}

#[derive(Clone)]
pub struct SampleWriter {
    store: Arc<dyn SampleStore>,
}

impl SampleWriter {
    pub fn new(store: Arc<dyn SampleStore>) -> Self {
        Self { store }
    }

    /// Insert every sample not already stored, as one unit.
    pub async fn write(&self, zone: &Zone, samples: &[Sample]) -> Result<UpsertCounts, WriteError> {
        if samples.is_empty() {
            return Ok(UpsertCounts::default());
        }

        let mut session = self.store.begin().await.map_err(WriteError::Begin)?;
        match Self::stage(session.as_mut(), samples).await {
            Ok(counts) => {
                session.commit().await.map_err(WriteError::Commit)?;
                Ok(counts)
            }
            Err(e) => {
                if let Err(rollback_err) = session.rollback().await {
                    warn!(zone = zone.code, error = ?rollback_err, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn stage(
        session: &mut dyn SampleSession,
        samples: &[Sample],
    ) -> Result<UpsertCounts, WriteError> {
        let mut counts = UpsertCounts::default();
        for sample in samples {
            let failed = |source| WriteError::Sample {
                timestamp: sample.timestamp,
                source,
            };
            if session.exists(&sample.key()).await.map_err(failed)? {
                counts.skipped += 1;
                continue;
            }
            if session.add(sample).await.map_err(failed)? {
                counts.inserted += 1;
            } else {
                counts.skipped += 1;
            }
        }
        Ok(counts)
    }
}
