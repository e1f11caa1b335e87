//! Shared fixtures for database-backed integration tests.

use chrono::{NaiveDate, NaiveDateTime};
use crowdpulse::data::samples::Sample;

/// Minute on 2024-03-01, Seoul local time.
pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// A fully populated sample for `zone_id` at `timestamp`.
pub fn make_sample(zone_id: &str, timestamp: NaiveDateTime) -> Sample {
    Sample {
        timestamp,
        zone_id: zone_id.to_owned(),
        congestion_level: "보통".to_owned(),
        congestion_message: Some("사람이 몰려있을 수 있지만 크게 붐비지는 않아요.".to_owned()),
        male_rate: Some(48.5),
        female_rate: Some(51.5),
        age_rate_10: Some(5.0),
        age_rate_20: Some(30.0),
        age_rate_30: Some(25.0),
        age_rate_40: Some(18.0),
        age_rate_50: Some(12.0),
        age_rate_60: Some(6.0),
        age_rate_70: Some(4.0),
        min_population: Some(3000),
        max_population: Some(3500),
    }
}
