//! Calendar and time-of-day features derived from an order timestamp.

use std::f64::consts::PI;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::config::{HOURS_PER_DAY, PEAK_HOURS};
use crate::error::Result;
use crate::events::parse_timestamp;

/// Temporal features of one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeFeatures {
    pub date: NaiveDate,
    /// 0..=23
    pub hour: u32,
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: u32,
    pub is_weekend: bool,
    pub is_peak_hour: bool,
    pub sin_hour: f64,
    pub cos_hour: f64,
}

impl TimeFeatures {
    /// Features for a (date, hour) bucket. `hour` is reduced modulo 24.
    pub fn for_bucket(date: NaiveDate, hour: u32) -> Self {
        let hour = hour % HOURS_PER_DAY;
        let day_of_week = date.weekday().num_days_from_monday();
        let (sin_hour, cos_hour) = cyclical_hour(hour);
        Self {
            date,
            hour,
            day_of_week,
            is_weekend: day_of_week >= 5,
            is_peak_hour: is_peak_hour(hour),
            sin_hour,
            cos_hour,
        }
    }
}

/// Derive the temporal features of `timestamp`, in whatever timezone it is
/// already expressed.
pub fn derive_time_features(timestamp: &NaiveDateTime) -> TimeFeatures {
    TimeFeatures::for_bucket(timestamp.date(), timestamp.hour())
}

/// Parse then derive. Fails only with `InvalidTimestamp`.
pub fn derive_time_features_str(timestamp: &str) -> Result<TimeFeatures> {
    parse_timestamp(timestamp).map(|ts| derive_time_features(&ts))
}

pub fn is_peak_hour(hour: u32) -> bool {
    PEAK_HOURS.contains(&hour)
}

/// `(sin(2πh/24), cos(2πh/24))`, so hour 23 sits next to hour 0.
pub fn cyclical_hour(hour: u32) -> (f64, f64) {
    let angle = 2.0 * PI * f64::from(hour % HOURS_PER_DAY) / f64::from(HOURS_PER_DAY);
    angle.sin_cos()
}
