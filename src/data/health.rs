//! Database liveness probe used by the health endpoint.

use anyhow::{Context, Result};
use sqlx::PgPool;

/// Round-trip a trivial query through the pool.
pub async fn ping(pool: &PgPool) -> Result<()> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .context("database ping failed")?;
    Ok(())
}

/// Total number of stored samples across all zones.
pub async fn sample_count(pool: &PgPool) -> Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM population_samples")
        .fetch_one(pool)
        .await
        .context("failed to count samples")
}
