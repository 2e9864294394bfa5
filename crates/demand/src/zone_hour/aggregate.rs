//! Grouping of zoned events into zone-hour buckets.

use std::collections::BTreeMap;

use crate::error::{DemandError, Result};
use crate::events::RawEvent;
use crate::time_features::{derive_time_features, TimeFeatures};

use super::types::{BucketKey, ZoneHourRecord};

#[derive(Default)]
struct Accumulator {
    count: u32,
    items: f64,
    prep: f64,
    temperature: f64,
    rain: bool,
    features: Option<TimeFeatures>,
}

impl Accumulator {
    fn push(&mut self, event: &RawEvent, features: TimeFeatures) {
        self.count += 1;
        self.items += f64::from(event.item_count);
        self.prep += event.prep_time_minutes;
        self.temperature += event.temperature_c;
        self.rain |= event.is_rain;
        self.features.get_or_insert(features);
    }

    fn finish(self, zone_id: u32) -> Option<ZoneHourRecord> {
        let features = self.features?;
        let n = f64::from(self.count);
        Some(ZoneHourRecord {
            zone_id,
            date: features.date,
            hour: features.hour,
            order_count: self.count,
            avg_items: self.items / n,
            avg_prep_minutes: self.prep / n,
            temperature_c: self.temperature / n,
            is_rain: self.rain,
            is_weekend: features.is_weekend,
            is_peak_hour: features.is_peak_hour,
            sin_hour: features.sin_hour,
            cos_hour: features.cos_hour,
        })
    }
}

/// Group zoned events by `(zone_id, date, hour)`.
///
/// Output is sorted by the bucket key. Buckets without events do not
/// appear; see [`super::fill_missing_buckets`] for a dense grid.
///
/// # Errors
///
/// - `InsufficientData` if `events` is empty.
/// - `InvalidParameter` if an event has no zone id.
pub fn aggregate(events: &[RawEvent]) -> Result<Vec<ZoneHourRecord>> {
    if events.is_empty() {
        return Err(DemandError::insufficient_data("cannot aggregate an empty event set"));
    }

    let mut buckets: BTreeMap<BucketKey, Accumulator> = BTreeMap::new();
    for event in events {
        let zone_id = event.zone_id.ok_or_else(|| {
            DemandError::InvalidParameter(format!(
                "event {} has no zone id; assign zones before aggregating",
                event.id
            ))
        })?;
        let features = derive_time_features(&event.timestamp);
        buckets
            .entry((zone_id, features.date, features.hour))
            .or_default()
            .push(event, features);
    }

    let records: Vec<ZoneHourRecord> = buckets
        .into_iter()
        .filter_map(|((zone_id, _, _), acc)| acc.finish(zone_id))
        .collect();

    tracing::info!(
        "aggregated {} events into {} zone-hour buckets",
        events.len(),
        records.len()
    );
    Ok(records)
}

/// Total orders across records. Equals the input event count for the
/// output of [`aggregate`].
pub fn total_orders(records: &[ZoneHourRecord]) -> u64 {
    records.iter().map(|r| u64::from(r.order_count)).sum()
}
