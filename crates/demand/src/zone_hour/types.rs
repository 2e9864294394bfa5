use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::time_features::TimeFeatures;

/// `(zone_id, date, hour)`, the unit of aggregation.
pub type BucketKey = (u32, NaiveDate, u32);

/// The canonical modelling row: all orders of one zone during one hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneHourRecord {
    pub zone_id: u32,
    pub date: NaiveDate,
    pub hour: u32,
    pub order_count: u32,
    pub avg_items: f64,
    pub avg_prep_minutes: f64,
    pub temperature_c: f64,
    /// True if any order in the bucket saw rain.
    pub is_rain: bool,
    pub is_weekend: bool,
    pub is_peak_hour: bool,
    pub sin_hour: f64,
    pub cos_hour: f64,
}

impl ZoneHourRecord {
    pub fn key(&self) -> BucketKey {
        (self.zone_id, self.date, self.hour)
    }

    /// An empty bucket, used when materialising the dense grid.
    pub(crate) fn zero(zone_id: u32, features: TimeFeatures, temperature_c: f64) -> Self {
        Self {
            zone_id,
            date: features.date,
            hour: features.hour,
            order_count: 0,
            avg_items: 0.0,
            avg_prep_minutes: 0.0,
            temperature_c,
            is_rain: false,
            is_weekend: features.is_weekend,
            is_peak_hour: features.is_peak_hour,
            sin_hour: features.sin_hour,
            cos_hour: features.cos_hour,
        }
    }
}
