//! The `population_samples` table: one row per zone per reported minute.

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, NaiveTime};
use serde::Serialize;
use sqlx::PgPool;

/// One normalized crowding reading for a zone at an upstream-reported minute.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Sample {
    /// Upstream `PPLTN_TIME`, Seoul local time, minute precision.
    #[sqlx(rename = "sampled_at")]
    pub timestamp: NaiveDateTime,
    pub zone_id: String,
    pub congestion_level: String,
    pub congestion_message: Option<String>,
    pub male_rate: Option<f64>,
    pub female_rate: Option<f64>,
    pub age_rate_10: Option<f64>,
    pub age_rate_20: Option<f64>,
    pub age_rate_30: Option<f64>,
    pub age_rate_40: Option<f64>,
    pub age_rate_50: Option<f64>,
    pub age_rate_60: Option<f64>,
    pub age_rate_70: Option<f64>,
    pub min_population: Option<i32>,
    pub max_population: Option<i32>,
}

/// Natural key of a [`Sample`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleKey {
    pub timestamp: NaiveDateTime,
    pub zone_id: String,
}

impl Sample {
    pub fn key(&self) -> SampleKey {
        SampleKey {
            timestamp: self.timestamp,
            zone_id: self.zone_id.clone(),
        }
    }

    /// Age-band rates paired with the band's lower bound, youngest first.
    pub fn age_rates(&self) -> [(u8, Option<f64>); 7] {
        [
            (10, self.age_rate_10),
            (20, self.age_rate_20),
            (30, self.age_rate_30),
            (40, self.age_rate_40),
            (50, self.age_rate_50),
            (60, self.age_rate_60),
            (70, self.age_rate_70),
        ]
    }
}

const SAMPLE_COLUMNS: &str = "sampled_at, zone_id, congestion_level, congestion_message, \
     male_rate, female_rate, \
     age_rate_10, age_rate_20, age_rate_30, age_rate_40, age_rate_50, age_rate_60, age_rate_70, \
     min_population, max_population";

/// Samples for one zone, newest first.
pub async fn list_by_zone(
    pool: &PgPool,
    zone_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Sample>> {
    let rows = sqlx::query_as::<_, Sample>(&format!(
        "SELECT {SAMPLE_COLUMNS} FROM population_samples \
         WHERE zone_id = $1 \
         ORDER BY sampled_at DESC \
         LIMIT $2 OFFSET $3"
    ))
    .bind(zone_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("failed to list samples by zone")?;
    Ok(rows)
}

/// Samples for one zone whose time of day falls in `[start, end]`, on any day.
///
/// A window with `start > end` wraps past midnight.
pub async fn list_by_time_of_day(
    pool: &PgPool,
    zone_id: &str,
    start: NaiveTime,
    end: NaiveTime,
    limit: i64,
) -> Result<Vec<Sample>> {
    let rows = sqlx::query_as::<_, Sample>(&format!(
        "SELECT {SAMPLE_COLUMNS} FROM population_samples \
         WHERE zone_id = $1 \
           AND CASE WHEN $2::time <= $3::time \
                    THEN sampled_at::time BETWEEN $2::time AND $3::time \
                    ELSE sampled_at::time >= $2::time OR sampled_at::time <= $3::time \
               END \
         ORDER BY sampled_at DESC \
         LIMIT $4"
    ))
    .bind(zone_id)
    .bind(start)
    .bind(end)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to list samples by time of day")?;
    Ok(rows)
}

/// Number of stored samples for one zone.
pub async fn count_by_zone(pool: &PgPool, zone_id: &str) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM population_samples WHERE zone_id = $1")
            .bind(zone_id)
            .fetch_one(pool)
            .await
            .context("failed to count samples")?;
    Ok(count)
}
