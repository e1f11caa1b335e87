//! Process configuration, extracted once at startup from the environment.
//!
//! Every component receives the slice of settings it needs by value or
//! reference; nothing reads ambient environment state after startup.

use figment::Figment;
use figment::providers::Env;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Root configuration, deserialized from raw environment variables.
#[derive(custom_debug_derive::Debug, Clone, Deserialize)]
pub struct Config {
    /// Postgres connection string.
    pub database_url: String,
    /// Credential for the Seoul open data API. Never logged.
    #[debug(skip)]
    pub api_key: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long services get to stop after a shutdown signal.
    #[serde(
        default = "default_shutdown_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub shutdown_timeout: Duration,
    /// Origin allowed to call the query API from a browser, if any.
    #[serde(default)]
    pub public_origin: Option<String>,

    #[serde(default = "default_citydata_base_url")]
    pub citydata_base_url: String,
    #[serde(
        default = "default_ingest_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub ingest_interval: Duration,
    #[serde(default = "default_ingest_batch_size")]
    pub ingest_batch_size: usize,
    #[serde(default = "default_ingest_max_concurrency")]
    pub ingest_max_concurrency: usize,
    #[serde(
        default = "default_ingest_request_delay",
        deserialize_with = "deserialize_duration"
    )]
    pub ingest_request_delay: Duration,
    #[serde(
        default = "default_ingest_request_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub ingest_request_timeout: Duration,
    #[serde(default = "default_true")]
    pub ingest_align_to_minute: bool,
}

/// Settings consumed by the upstream citydata client.
#[derive(custom_debug_derive::Debug, Clone)]
pub struct CityDataSettings {
    pub base_url: String,
    #[debug(skip)]
    pub api_key: String,
    pub request_timeout: Duration,
}

/// Settings consumed by the ingestion scheduler and governor.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Target spacing between cycle starts.
    pub interval: Duration,
    /// Zones per sequential batch.
    pub batch_size: usize,
    /// Maximum simultaneous upstream requests.
    pub max_concurrency: usize,
    /// Minimum time each admitted fetch holds its slot.
    pub request_delay: Duration,
    /// Round the next cycle start up to a whole minute.
    pub align_to_minute: bool,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            interval: default_ingest_interval(),
            batch_size: default_ingest_batch_size(),
            max_concurrency: default_ingest_max_concurrency(),
            request_delay: default_ingest_request_delay(),
            align_to_minute: true,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// `.env` should already have been applied by the caller.
    pub fn from_env() -> Result<Self, figment::Error> {
        Self::from_figment(Figment::new().merge(Env::raw()))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), figment::Error> {
        if self.api_key.trim().is_empty() {
            return Err(figment::Error::from("API_KEY must not be empty".to_string()));
        }
        if self.ingest_batch_size == 0 {
            return Err(figment::Error::from(
                "INGEST_BATCH_SIZE must be at least 1".to_string(),
            ));
        }
        if self.ingest_max_concurrency == 0 {
            return Err(figment::Error::from(
                "INGEST_MAX_CONCURRENCY must be at least 1".to_string(),
            ));
        }
        if self.ingest_interval.is_zero() {
            return Err(figment::Error::from(
                "INGEST_INTERVAL must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn citydata(&self) -> CityDataSettings {
        CityDataSettings {
            base_url: self.citydata_base_url.trim_end_matches('/').to_string(),
            api_key: self.api_key.clone(),
            request_timeout: self.ingest_request_timeout,
        }
    }

    pub fn ingest(&self) -> IngestSettings {
        IngestSettings {
            interval: self.ingest_interval,
            batch_size: self.ingest_batch_size,
            max_concurrency: self.ingest_max_concurrency,
            request_delay: self.ingest_request_delay,
            align_to_minute: self.ingest_align_to_minute,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(8)
}

fn default_citydata_base_url() -> String {
    "http://openapi.seoul.go.kr:8088".to_string()
}

fn default_ingest_interval() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_ingest_batch_size() -> usize {
    5
}

fn default_ingest_max_concurrency() -> usize {
    20
}

fn default_ingest_request_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_ingest_request_timeout() -> Duration {
    Duration::from_secs(20)
}

fn default_true() -> bool {
    true
}

/// Accepts either bare seconds (`300`) or a unit-suffixed string (`"5m"`, `"500ms"`).
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DurationInput {
        Seconds(u64),
        Text(String),
    }

    match DurationInput::deserialize(deserializer)? {
        DurationInput::Seconds(secs) => Ok(Duration::from_secs(secs)),
        DurationInput::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}

fn parse_duration(text: &str) -> Result<Duration, String> {
    let parser = fundu::DurationParser::with_all_time_units();
    let parsed = parser
        .parse(text.trim())
        .map_err(|e| format!("invalid duration {text:?}: {e}"))?;
    Duration::try_from(parsed).map_err(|e| format!("invalid duration {text:?}: {e}"))
}
