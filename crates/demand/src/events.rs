//! Raw geo-tagged order events and timestamp parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{DemandError, Result};

/// One delivery order as produced by the loader or the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: String,
    /// Wall-clock time of the order in the city's own timezone.
    pub timestamp: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub item_count: u32,
    pub prep_time_minutes: f64,
    pub temperature_c: f64,
    pub is_rain: bool,
    pub zone_id: Option<u32>,
}

impl RawEvent {
    pub fn location(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    pub fn with_zone(mut self, zone_id: u32) -> Self {
        self.zone_id = Some(zone_id);
        self
    }
}

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 style timestamp.
///
/// Accepts `T` or space separators, optional seconds and fractional seconds,
/// and an optional `Z` / `+HH:MM` suffix. An offset is not converted: the
/// wall-clock time as written is kept. A bare `YYYY-MM-DD` means midnight.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let s = value.trim();
    if s.is_empty() {
        return Err(invalid_timestamp(value, "empty value"));
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.naive_local());
        }
    }

    let naive = s.strip_suffix('Z').unwrap_or(s);
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Ok(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(naive, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }

    Err(invalid_timestamp(value, "not an ISO-8601 date-time"))
}

fn invalid_timestamp(value: &str, reason: &str) -> DemandError {
    DemandError::InvalidTimestamp {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
