//! Derived head-count estimates computed from stored rates and bounds.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::data::samples::Sample;

/// `rate * bound / 100`, or `None` when either operand is missing.
pub fn project(rate: Option<f64>, bound: Option<i32>) -> Option<f64> {
    Some(rate? * f64::from(bound?) / 100.0)
}

/// Which population bound an age projection is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bound {
    Min,
    Max,
}

impl Bound {
    fn of(self, sample: &Sample) -> Option<i32> {
        match self {
            Bound::Min => sample.min_population,
            Bound::Max => sample.max_population,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenderProjection {
    pub timestamp: NaiveDateTime,
    pub zone_id: String,
    pub male_min: Option<f64>,
    pub male_max: Option<f64>,
    pub female_min: Option<f64>,
    pub female_max: Option<f64>,
}

impl From<&Sample> for GenderProjection {
    fn from(sample: &Sample) -> Self {
        Self {
            timestamp: sample.timestamp,
            zone_id: sample.zone_id.clone(),
            male_min: project(sample.male_rate, sample.min_population),
            male_max: project(sample.male_rate, sample.max_population),
            female_min: project(sample.female_rate, sample.min_population),
            female_max: project(sample.female_rate, sample.max_population),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeProjection {
    pub timestamp: NaiveDateTime,
    pub zone_id: String,
    pub bound: Bound,
    pub age_10: Option<f64>,
    pub age_20: Option<f64>,
    pub age_30: Option<f64>,
    pub age_40: Option<f64>,
    pub age_50: Option<f64>,
    pub age_60: Option<f64>,
    pub age_70: Option<f64>,
}

impl AgeProjection {
    pub fn new(sample: &Sample, bound: Bound) -> Self {
        let population = bound.of(sample);
        let [a10, a20, a30, a40, a50, a60, a70] =
            sample.age_rates().map(|(_, rate)| project(rate, population));
        Self {
            timestamp: sample.timestamp,
            zone_id: sample.zone_id.clone(),
            bound,
            age_10: a10,
            age_20: a20,
            age_30: a30,
            age_40: a40,
            age_50: a50,
            age_60: a60,
            age_70: a70,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Sample {
        Sample {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            zone_id: "POI001".to_string(),
            congestion_level: "보통".to_string(),
            congestion_message: None,
            male_rate: Some(55.0),
            female_rate: None,
            age_rate_10: Some(10.0),
            age_rate_20: Some(25.5),
            age_rate_30: None,
            age_rate_40: Some(20.0),
            age_rate_50: Some(15.0),
            age_rate_60: Some(5.0),
            age_rate_70: Some(2.0),
            min_population: Some(1000),
            max_population: Some(2000),
        }
    }

    #[test]
    fn test_project_formula() {
        assert_eq!(project(Some(55.0), Some(1000)), Some(550.0));
        assert_eq!(project(None, Some(1000)), None);
        assert_eq!(project(Some(55.0), None), None);
        assert_eq!(project(Some(0.0), Some(1000)), Some(0.0));
    }

    #[test]
    fn test_gender_projection() {
        let p = GenderProjection::from(&sample());
        assert_eq!(p.male_min, Some(550.0));
        assert_eq!(p.male_max, Some(1100.0));
        assert_eq!(p.female_min, None);
        assert_eq!(p.female_max, None);
    }

    #[test]
    fn test_age_projection_uses_requested_bound() {
        let min = AgeProjection::new(&sample(), Bound::Min);
        assert_eq!(min.age_10, Some(100.0));
        assert_eq!(min.age_20, Some(255.0));
        assert_eq!(min.age_30, None);

        let max = AgeProjection::new(&sample(), Bound::Max);
        assert_eq!(max.age_10, Some(200.0));
        assert_eq!(max.age_70, Some(40.0));
    }

    #[test]
    fn test_age_projection_without_bound_is_all_null() {
        let mut s = sample();
        s.max_population = None;
        let p = AgeProjection::new(&s, Bound::Max);
        assert!(p.age_10.is_none() && p.age_40.is_none() && p.age_70.is_none());
    }
}
