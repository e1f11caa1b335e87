//! Upstream telemetry: the Seoul real-time citydata open API.

pub mod client;
pub mod errors;
pub mod xml;

use async_trait::async_trait;

pub use client::CityDataClient;
pub use errors::{FetchError, RecordError};
pub use xml::ParsedResponse;

use crate::zones::Zone;

/// Source of current crowding readings for a zone.
///
/// Implementations never touch storage. A failed fetch affects only that zone.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    async fn fetch(&self, zone: &Zone) -> Result<ParsedResponse, FetchError>;
}
