//! HTTP client for the Seoul real-time citydata service.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::citydata::TelemetrySource;
use crate::citydata::errors::FetchError;
use crate::citydata::xml::{ParsedResponse, parse_response};
use crate::config::CityDataSettings;
use crate::zones::Zone;

const SERVICE: &str = "citydata";
const START_INDEX: u32 = 1;
const END_INDEX: u32 = 5;

pub struct CityDataClient {
    http: reqwest::Client,
    settings: CityDataSettings,
}

impl CityDataClient {
    pub fn new(settings: CityDataSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build citydata HTTP client")?;
        Ok(Self { http, settings })
    }

    /// Full request URL for a zone. The zone name is a single encoded path segment.
    fn zone_url(&self, zone: &Zone) -> String {
        format!(
            "{base}/{key}/xml/{SERVICE}/{START_INDEX}/{END_INDEX}/{name}",
            base = self.settings.base_url,
            key = urlencoding::encode(&self.settings.api_key),
            name = urlencoding::encode(zone.name),
        )
    }

    /// Fetch and normalize the current readings for one zone.
    pub async fn fetch_zone(&self, zone: &Zone) -> Result<ParsedResponse, FetchError> {
        let response = self
            .http
            .get(self.zone_url(zone))
            .send()
            .await
            .map_err(FetchError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(FetchError::Request)?;
        let parsed = parse_response(&body)?;
        debug!(
            zone = zone.code,
            samples = parsed.samples.len(),
            rejected = parsed.rejected.len(),
            "Fetched citydata"
        );
        Ok(parsed)
    }
}

#[async_trait]
impl TelemetrySource for CityDataClient {
    async fn fetch(&self, zone: &Zone) -> Result<ParsedResponse, FetchError> {
        self.fetch_zone(zone).await
    }
}
