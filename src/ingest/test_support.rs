//! Scripted telemetry source for pipeline and scheduler tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

use crate::citydata::{FetchError, ParsedResponse, TelemetrySource};
use crate::data::samples::Sample;
use crate::zones::Zone;

pub fn sample(zone_id: &str, hour: u32, minute: u32) -> Sample {
    Sample {
        timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap(),
        zone_id: zone_id.to_string(),
        congestion_level: "여유".to_string(),
        congestion_message: None,
        male_rate: Some(48.5),
        female_rate: Some(51.5),
        age_rate_10: Some(3.1),
        age_rate_20: Some(22.4),
        age_rate_30: Some(30.2),
        age_rate_40: Some(21.0),
        age_rate_50: Some(14.3),
        age_rate_60: Some(6.1),
        age_rate_70: Some(2.3),
        min_population: Some(1000),
        max_population: Some(1500),
    }
}

/// Returns one sample per zone at 12:00, unless told otherwise.
#[derive(Default)]
pub struct FakeSource {
    failing: HashSet<&'static str>,
    latency: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    started: Mutex<Option<mpsc::UnboundedSender<(&'static str, Instant)>>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer this zone with an HTTP 500.
    pub fn failing(mut self, code: &'static str) -> Self {
        self.failing.insert(code);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Receive `(zone code, start instant)` for every fetch.
    pub fn watch_starts(&self) -> mpsc::UnboundedReceiver<(&'static str, Instant)> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.started.lock().unwrap() = Some(tx);
        rx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TelemetrySource for FakeSource {
    async fn fetch(&self, zone: &Zone) -> Result<ParsedResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = self.started.lock().unwrap().as_ref() {
            let _ = tx.send((zone.code, Instant::now()));
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(zone.code) {
            return Err(FetchError::Status { status: 500 });
        }
        Ok(ParsedResponse {
            samples: vec![sample(zone.code, 12, 0)],
            rejected: Vec::new(),
        })
    }
}

