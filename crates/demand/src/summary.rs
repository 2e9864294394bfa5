//! Read-only views over a staffing plan: the citywide hourly profile and the
//! per-zone snapshot of one hour.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::allocation::StaffingRecord;
use crate::zoning::Zone;

/// Mean citywide predicted orders for one hour of the day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourProfileRow {
    pub hour: u32,
    pub mean_pred_orders: f64,
}

/// One zone at a chosen (date, hour).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneSnapshotRow {
    pub zone_id: u32,
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub predicted_orders: f64,
    pub drivers_needed: u32,
}

/// Citywide predictions summed per (date, hour), then averaged over the
/// dates on which that hour appears. Sorted by hour.
pub fn peak_hour_profile(plan: &[StaffingRecord]) -> Vec<HourProfileRow> {
    let mut citywide: BTreeMap<(NaiveDate, u32), f64> = BTreeMap::new();
    for s in plan {
        *citywide.entry((s.date, s.hour)).or_default() += s.predicted_orders;
    }

    let mut per_hour: BTreeMap<u32, (f64, u32)> = BTreeMap::new();
    for ((_, hour), total) in citywide {
        let slot = per_hour.entry(hour).or_default();
        slot.0 += total;
        slot.1 += 1;
    }

    per_hour
        .into_iter()
        .map(|(hour, (sum, days))| HourProfileRow {
            hour,
            mean_pred_orders: sum / f64::from(days),
        })
        .collect()
}

/// Latest date present in the plan.
pub fn latest_date(plan: &[StaffingRecord]) -> Option<NaiveDate> {
    plan.iter().map(|s| s.date).max()
}

/// Every zone at `(date, hour)`, in zone order. Zones with no plan row for
/// that slot report zero demand and zero drivers.
pub fn zone_snapshot(
    plan: &[StaffingRecord],
    zones: &[Zone],
    date: NaiveDate,
    hour: u32,
) -> Vec<ZoneSnapshotRow> {
    let at_slot: BTreeMap<u32, &StaffingRecord> = plan
        .iter()
        .filter(|s| s.date == date && s.hour == hour)
        .map(|s| (s.zone_id, s))
        .collect();

    let mut seen = BTreeSet::new();
    let mut rows: Vec<ZoneSnapshotRow> = zones
        .iter()
        .filter(|z| seen.insert(z.zone_id))
        .map(|z| {
            let (predicted_orders, drivers_needed) = at_slot
                .get(&z.zone_id)
                .map_or((0.0, 0), |s| (s.predicted_orders, s.drivers_needed));
            ZoneSnapshotRow {
                zone_id: z.zone_id,
                center_latitude: z.center_latitude,
                center_longitude: z.center_longitude,
                predicted_orders,
                drivers_needed,
            }
        })
        .collect();
    rows.sort_by_key(|r| r.zone_id);
    rows
}
