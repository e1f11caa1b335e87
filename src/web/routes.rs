//! Web API router construction and shared response utilities.

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;
use crate::web::{populations, status};

/// Cache-Control presets for public endpoints.
pub mod cache {
    /// Zone registry: fixed for the life of the process.
    pub const REFERENCE: &str = "public, max-age=3600";
    /// Sample queries: new rows land at most once per ingestion interval.
    pub const SAMPLES: &str = "public, max-age=30, stale-while-revalidate=60";
}

/// Wraps a JSON response with a `Cache-Control` header.
pub fn with_cache_control<T: serde::Serialize>(value: T, header: &'static str) -> Response {
    let mut response = Json(value).into_response();
    response.headers_mut().insert(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(header),
    );
    response
}

fn cors_layer(public_origin: Option<&str>) -> CorsLayer {
    let origin = public_origin.and_then(|origin| match HeaderValue::from_str(origin) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(origin, "ignoring invalid PUBLIC_ORIGIN");
            None
        }
    });
    CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(AllowOrigin::list(origin))
}

/// Creates the web server router.
pub fn create_router(app_state: AppState, public_origin: Option<&str>) -> Router {
    let api_router = Router::new()
        .route("/health", get(status::health))
        .route("/status", get(status::status))
        .route("/status/cycle", get(status::last_cycle))
        .route("/zones", get(status::list_zones))
        .route("/zones/{code}", get(status::get_zone))
        .route(
            "/populations/region/{zone_id}",
            get(populations::list_by_region),
        )
        .route("/populations/gender", get(populations::gender_projections))
        .route("/populations/age/{bound}", get(populations::age_projections))
        .with_state(app_state);

    Router::new().nest("/api", api_router).layer((
        TraceLayer::new_for_http(),
        cors_layer(public_origin),
        CompressionLayer::new(),
        TimeoutLayer::new(Duration::from_secs(30)),
    ))
}
