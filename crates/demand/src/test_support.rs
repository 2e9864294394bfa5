//! Builders shared by the unit tests.

use chrono::NaiveDateTime;

use crate::events::{parse_timestamp, RawEvent};

pub(crate) fn ts(s: &str) -> NaiveDateTime {
    parse_timestamp(s).expect("test timestamp")
}

/// An event with neutral attributes at `(lat, lon)` and time `when`.
pub(crate) fn event(id: &str, when: &str, lat: f64, lon: f64) -> RawEvent {
    RawEvent {
        id: id.to_string(),
        timestamp: ts(when),
        latitude: lat,
        longitude: lon,
        item_count: 2,
        prep_time_minutes: 15.0,
        temperature_c: 30.0,
        is_rain: false,
        zone_id: None,
    }
}

pub(crate) fn zoned(id: &str, when: &str, lat: f64, lon: f64, zone_id: u32) -> RawEvent {
    event(id, when, lat, lon).with_zone(zone_id)
}
