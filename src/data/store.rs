//! Transactional storage boundary used by the ingestion writer.
//!
//! The writer only needs four operations: look up a sample by its natural key,
//! stage a new sample, commit, and roll back. [`PgSampleStore`] backs them with
//! a sqlx transaction; dropping a session without committing rolls it back.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::data::samples::{Sample, SampleKey};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Opens independent transactional sessions.
#[async_trait]
pub trait SampleStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn SampleSession>, StoreError>;
}

/// One open transaction. Never shared between concurrent zone pipelines.
#[async_trait]
pub trait SampleSession: Send {
    /// Whether a row with this key is visible to the session, including rows
    /// staged earlier in the same session.
    async fn exists(&mut self, key: &SampleKey) -> Result<bool, StoreError>;

    /// Stage a new row. Returns `false` when a row with the same key appeared
    /// concurrently and nothing was written.
    async fn add(&mut self, sample: &Sample) -> Result<bool, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgSampleStore {
    pool: PgPool,
}

impl PgSampleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SampleStore for PgSampleStore {
    async fn begin(&self) -> Result<Box<dyn SampleSession>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSampleSession { tx }))
    }
}

struct PgSampleSession {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SampleSession for PgSampleSession {
    async fn exists(&mut self, key: &SampleKey) -> Result<bool, StoreError> {
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM population_samples WHERE sampled_at = $1 AND zone_id = $2)",
        )
        .bind(key.timestamp)
        .bind(&key.zone_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(found)
    }

    async fn add(&mut self, sample: &Sample) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO population_samples (
                sampled_at, zone_id, congestion_level, congestion_message,
                male_rate, female_rate,
                age_rate_10, age_rate_20, age_rate_30, age_rate_40,
                age_rate_50, age_rate_60, age_rate_70,
                min_population, max_population
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (sampled_at, zone_id) DO NOTHING
            "#,
        )
        .bind(sample.timestamp)
        .bind(&sample.zone_id)
        .bind(&sample.congestion_level)
        .bind(&sample.congestion_message)
        .bind(sample.male_rate)
        .bind(sample.female_rate)
        .bind(sample.age_rate_10)
        .bind(sample.age_rate_20)
        .bind(sample.age_rate_30)
        .bind(sample.age_rate_40)
        .bind(sample.age_rate_50)
        .bind(sample.age_rate_60)
        .bind(sample.age_rate_70)
        .bind(sample.min_population)
        .bind(sample.max_population)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
