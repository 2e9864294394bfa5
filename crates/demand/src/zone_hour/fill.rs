//! Optional dense zone x date x hour grid.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::config::HOURS_PER_DAY;
use crate::time_features::TimeFeatures;
use crate::zoning::Zone;

use super::types::{BucketKey, ZoneHourRecord};

/// Materialise every (zone, date, hour) over the dates present in
/// `records`, filling absent buckets with zero demand.
///
/// Filled rows carry the mean observed temperature of their date and no
/// rain. Output is sorted by bucket key.
pub fn fill_missing_buckets(records: &[ZoneHourRecord], zones: &[Zone]) -> Vec<ZoneHourRecord> {
    let mut existing: BTreeMap<BucketKey, ZoneHourRecord> =
        records.iter().map(|r| (r.key(), r.clone())).collect();

    let mut temps: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for r in records {
        let entry = temps.entry(r.date).or_insert((0.0, 0));
        entry.0 += r.temperature_c;
        entry.1 += 1;
    }

    let zone_ids: BTreeSet<u32> = zones
        .iter()
        .map(|z| z.zone_id)
        .chain(records.iter().map(|r| r.zone_id))
        .collect();

    let mut filled = 0usize;
    let mut out = Vec::with_capacity(zone_ids.len() * temps.len() * HOURS_PER_DAY as usize);
    for &zone_id in &zone_ids {
        for (&date, &(temp_sum, n)) in &temps {
            let day_temperature = if n > 0 { temp_sum / n as f64 } else { 0.0 };
            for hour in 0..HOURS_PER_DAY {
                match existing.remove(&(zone_id, date, hour)) {
                    Some(r) => out.push(r),
                    None => {
                        filled += 1;
                        out.push(ZoneHourRecord::zero(
                            zone_id,
                            TimeFeatures::for_bucket(date, hour),
                            day_temperature,
                        ));
                    }
                }
            }
        }
    }

    tracing::info!(
        "zero-filled {} empty buckets ({} rows total)",
        filled,
        out.len()
    );
    out
}
