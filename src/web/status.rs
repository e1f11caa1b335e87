//! Health, status, and zone registry handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{trace, warn};

use crate::data;
use crate::ingest::cycle::{CycleReport, CycleTotals};
use crate::state::{AppState, ServiceStatus};
use crate::web::error::{ApiError, ApiErrorCode, OptionNotFoundExt};
use crate::web::routes::{cache, with_cache_control};
use crate::zones::{self, Zone};

#[derive(Serialize)]
pub struct ServiceInfo {
    name: String,
    status: ServiceStatus,
    since_secs: u64,
}

/// The last cycle without its per-zone detail.
#[derive(Serialize)]
pub struct CycleSummary {
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    next_start_at: DateTime<Utc>,
    cancelled: bool,
    totals: CycleTotals,
}

impl From<&CycleReport> for CycleSummary {
    fn from(report: &CycleReport) -> Self {
        Self {
            started_at: report.started_at,
            finished_at: report.finished_at,
            next_start_at: report.next_start_at,
            cancelled: report.cancelled,
            totals: report.totals,
        }
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    status: ServiceStatus,
    version: String,
    commit: String,
    services: BTreeMap<String, ServiceInfo>,
    last_cycle: Option<CycleSummary>,
    /// Stored sample count, `None` if the database could not be queried.
    samples: Option<i64>,
}

/// `GET /api/health`: liveness, including a database round trip.
pub(super) async fn health(State(state): State<AppState>) -> Result<Response, ApiError> {
    trace!("health check requested");
    if let Err(e) = data::health::ping(&state.db_pool).await {
        warn!(error = ?e, "health check failed");
        return Err(ApiError::new(
            ApiErrorCode::DatabaseUnavailable,
            "Database is unreachable",
        ));
    }
    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "timestamp": Utc::now().to_rfc3339()
        })),
    )
        .into_response())
}

/// `GET /api/status`
pub(super) async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let mut services = BTreeMap::new();
    for (name, status, since_secs) in state.service_statuses.all() {
        services.insert(
            name.clone(),
            ServiceInfo {
                name,
                status,
                since_secs,
            },
        );
    }

    let overall_status = if services.is_empty() {
        ServiceStatus::Disabled
    } else if services
        .values()
        .any(|s| matches!(s.status, ServiceStatus::Error))
    {
        ServiceStatus::Error
    } else {
        ServiceStatus::Active
    };

    let last_cycle = state.last_cycle.borrow().as_ref().map(CycleSummary::from);
    let samples = match data::health::sample_count(&state.db_pool).await {
        Ok(count) => Some(count),
        Err(e) => {
            warn!(error = ?e, "failed to count samples for status");
            None
        }
    };

    Json(StatusResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: env!("GIT_COMMIT_HASH").to_string(),
        services,
        last_cycle,
        samples,
    })
}

/// `GET /api/status/cycle`: the last cycle including every zone's outcome.
pub(super) async fn last_cycle(State(state): State<AppState>) -> Result<Json<CycleReport>, ApiError> {
    let report = state.last_cycle.borrow().clone();
    report
        .or_not_found("Ingestion cycle", "latest")
        .map(Json)
}

/// `GET /api/zones`
pub(super) async fn list_zones() -> Response {
    with_cache_control(zones::all(), cache::REFERENCE)
}

/// `GET /api/zones/{code}`
pub(super) async fn get_zone(Path(code): Path<String>) -> Result<Response, ApiError> {
    let zone: &Zone = zones::by_code(&code).or_not_found("Zone", &code)?;
    Ok(with_cache_control(zone, cache::REFERENCE))
}
