//! Sample and projection query handlers.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use chrono::{NaiveTime, TimeDelta, Utc};
use chrono_tz::Asia::Seoul;
use serde::Deserialize;
use std::time::{Duration, Instant};

use crate::data::projections::{AgeProjection, Bound, GenderProjection};
use crate::data::samples;
use crate::state::AppState;
use crate::utils::log_if_slow;
use crate::web::error::{ApiError, db_error};
use crate::web::routes::{cache, with_cache_control};

const MAX_LIMIT: i64 = 200;

const SLOW_QUERY_THRESHOLD: Duration = Duration::from_millis(500);

/// Minutes covered by the gender window when no bounds are given.
const DEFAULT_WINDOW_MINUTES: i64 = 60;

fn default_limit() -> i64 {
    40
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn clamp_page(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_LIMIT), offset.max(0))
}

#[derive(Debug, Deserialize)]
pub struct AgeParams {
    pub zone_id: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct GenderParams {
    pub zone_id: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default = "default_window_limit")]
    pub limit: i64,
}

fn default_window_limit() -> i64 {
    MAX_LIMIT
}

/// `GET /api/populations/region/{zone_id}`
pub async fn list_by_region(
    State(state): State<AppState>,
    Path(zone_id): Path<String>,
    Query(page): Query<PageParams>,
) -> Result<Response, ApiError> {
    let (limit, offset) = clamp_page(page.limit, page.offset);
    let rows = samples::list_by_zone(&state.db_pool, &zone_id, limit, offset)
        .await
        .map_err(|e| db_error("List samples", e))?;
    Ok(with_cache_control(rows, cache::SAMPLES))
}

/// `GET /api/populations/gender`
pub async fn gender_projections(
    State(state): State<AppState>,
    Query(params): Query<GenderParams>,
) -> Result<Response, ApiError> {
    let (start, end) = time_window(
        params.start_time.as_deref(),
        params.end_time.as_deref(),
        Utc::now().with_timezone(&Seoul).time(),
    )?;
    let start_query = Instant::now();
    let rows = samples::list_by_time_of_day(
        &state.db_pool,
        &params.zone_id,
        start,
        end,
        params.limit.clamp(1, MAX_LIMIT),
    )
    .await
    .map_err(|e| db_error("Gender projections", e))?;
    log_if_slow(start_query, SLOW_QUERY_THRESHOLD, "gender_projections");

    let projections: Vec<GenderProjection> = rows.iter().map(GenderProjection::from).collect();
    Ok(with_cache_control(projections, cache::SAMPLES))
}

/// `GET /api/populations/age/{min|max}`
pub async fn age_projections(
    State(state): State<AppState>,
    Path(bound): Path<Bound>,
    Query(params): Query<AgeParams>,
) -> Result<Response, ApiError> {
    let (limit, offset) = clamp_page(params.limit, params.offset);
    let rows = samples::list_by_zone(&state.db_pool, &params.zone_id, limit, offset)
        .await
        .map_err(|e| db_error("Age projections", e))?;

    let projections: Vec<AgeProjection> = rows
        .iter()
        .map(|sample| AgeProjection::new(sample, bound))
        .collect();
    Ok(with_cache_control(projections, cache::SAMPLES))
}

fn parse_time_of_day(field: &str, raw: &str) -> Result<NaiveTime, ApiError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| ApiError::invalid_time(field, raw))
}

/// Resolve the requested time-of-day window.
///
/// A missing bound defaults relative to `now`: the end to `now`, the start to
/// an hour before the end.
fn time_window(
    start: Option<&str>,
    end: Option<&str>,
    now: NaiveTime,
) -> Result<(NaiveTime, NaiveTime), ApiError> {
    let end = match end {
        Some(raw) => parse_time_of_day("end_time", raw)?,
        None => now,
    };
    let start = match start {
        Some(raw) => parse_time_of_day("start_time", raw)?,
        None => end - TimeDelta::minutes(DEFAULT_WINDOW_MINUTES),
    };
    Ok((start, end))
}
