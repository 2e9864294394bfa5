//! Tabular pipeline artifacts: zone centres, the zone-hour modelling table,
//! the staffing plan and the hourly profile.

use std::path::Path;

use demand::allocation::StaffingRecord;
use demand::summary::HourProfileRow;
use demand::zone_hour::ZoneHourRecord;
use demand::zoning::Zone;

use crate::csv_table::{bool_cell, open, write_rows, Header, Row};
use crate::error::Result;

pub const ZONE_COLUMNS: [&str; 3] = ["zone_id", "lat", "lon"];

pub const ZONE_HOUR_COLUMNS: [&str; 12] = [
    "zone_id",
    "date",
    "hour",
    "order_count",
    "avg_items",
    "avg_prep",
    "temperature_c",
    "is_rain",
    "is_weekend",
    "is_peak_hour",
    "sin_hour",
    "cos_hour",
];

pub const STAFFING_COLUMNS: [&str; 5] = ["zone_id", "date", "hour", "pred_orders", "drivers_needed"];

pub const PEAK_HOUR_COLUMNS: [&str; 2] = ["hour", "mean_pred_orders"];

const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Zone centres
// ---------------------------------------------------------------------------

pub fn write_zones(path: &Path, zones: &[Zone]) -> Result<()> {
    let mut sorted = zones.to_vec();
    sorted.sort_by_key(|z| z.zone_id);
    write_rows(
        path,
        &ZONE_COLUMNS,
        sorted.iter().map(|z| {
            vec![
                z.zone_id.to_string(),
                z.center_latitude.to_string(),
                z.center_longitude.to_string(),
            ]
        }),
    )
}

pub fn read_zones(path: &Path) -> Result<Vec<Zone>> {
    let mut csv = open(path)?;
    let header = Header::read("zone centres", &mut csv)?;
    let (id, lat, lon) = (
        header.require("zone_id")?,
        header.require("lat")?,
        header.require("lon")?,
    );
    let mut zones = Vec::new();
    for record in csv.records() {
        let record = record?;
        let row = Row {
            table: "zone centres",
            record: &record,
        };
        zones.push(Zone {
            zone_id: row.parse(id, "zone_id")?,
            center_latitude: row.parse(lat, "lat")?,
            center_longitude: row.parse(lon, "lon")?,
        });
    }
    Ok(zones)
}

// ---------------------------------------------------------------------------
// Zone-hour table
// ---------------------------------------------------------------------------

pub fn write_zone_hours(path: &Path, records: &[ZoneHourRecord]) -> Result<()> {
    write_rows(
        path,
        &ZONE_HOUR_COLUMNS,
        records.iter().map(|r| {
            vec![
                r.zone_id.to_string(),
                r.date.format(DATE_FORMAT).to_string(),
                r.hour.to_string(),
                r.order_count.to_string(),
                r.avg_items.to_string(),
                r.avg_prep_minutes.to_string(),
                r.temperature_c.to_string(),
                bool_cell(r.is_rain).to_string(),
                bool_cell(r.is_weekend).to_string(),
                bool_cell(r.is_peak_hour).to_string(),
                r.sin_hour.to_string(),
                r.cos_hour.to_string(),
            ]
        }),
    )
}

pub fn read_zone_hours(path: &Path) -> Result<Vec<ZoneHourRecord>> {
    const TABLE: &str = "zone-hour table";
    let mut csv = open(path)?;
    let header = Header::read(TABLE, &mut csv)?;
    let idx = ZONE_HOUR_COLUMNS
        .iter()
        .map(|c| header.require(c))
        .collect::<Result<Vec<usize>>>()?;

    let mut records = Vec::new();
    for record in csv.records() {
        let record = record?;
        let row = Row {
            table: TABLE,
            record: &record,
        };
        let hour: u32 = row.parse(idx[2], "hour")?;
        if hour >= demand::config::HOURS_PER_DAY {
            return Err(row.bad("hour", format_args!("{hour} is not in 0..24")));
        }
        records.push(ZoneHourRecord {
            zone_id: row.parse(idx[0], "zone_id")?,
            date: row.date(idx[1], "date")?,
            hour,
            order_count: row.parse(idx[3], "order_count")?,
            avg_items: row.parse(idx[4], "avg_items")?,
            avg_prep_minutes: row.parse(idx[5], "avg_prep")?,
            temperature_c: row.parse(idx[6], "temperature_c")?,
            is_rain: row.flag(idx[7], "is_rain")?,
            is_weekend: row.flag(idx[8], "is_weekend")?,
            is_peak_hour: row.flag(idx[9], "is_peak_hour")?,
            sin_hour: row.parse(idx[10], "sin_hour")?,
            cos_hour: row.parse(idx[11], "cos_hour")?,
        });
    }
    tracing::info!("read {} zone-hour rows from {}", records.len(), path.display());
    Ok(records)
}

// ---------------------------------------------------------------------------
// Staffing plan and hourly profile
// ---------------------------------------------------------------------------

pub fn write_staffing_plan(path: &Path, plan: &[StaffingRecord]) -> Result<()> {
    write_rows(
        path,
        &STAFFING_COLUMNS,
        plan.iter().map(|s| {
            vec![
                s.zone_id.to_string(),
                s.date.format(DATE_FORMAT).to_string(),
                s.hour.to_string(),
                s.predicted_orders.to_string(),
                s.drivers_needed.to_string(),
            ]
        }),
    )
}

pub fn read_staffing_plan(path: &Path) -> Result<Vec<StaffingRecord>> {
    const TABLE: &str = "staffing plan";
    let mut csv = open(path)?;
    let header = Header::read(TABLE, &mut csv)?;
    let idx = STAFFING_COLUMNS
        .iter()
        .map(|c| header.require(c))
        .collect::<Result<Vec<usize>>>()?;

    let mut plan = Vec::new();
    for record in csv.records() {
        let record = record?;
        let row = Row {
            table: TABLE,
            record: &record,
        };
        plan.push(StaffingRecord {
            zone_id: row.parse(idx[0], "zone_id")?,
            date: row.date(idx[1], "date")?,
            hour: row.parse(idx[2], "hour")?,
            predicted_orders: row.parse(idx[3], "pred_orders")?,
            drivers_needed: row.parse(idx[4], "drivers_needed")?,
        });
    }
    Ok(plan)
}

pub fn write_peak_hours(path: &Path, profile: &[HourProfileRow]) -> Result<()> {
    write_rows(
        path,
        &PEAK_HOUR_COLUMNS,
        profile
            .iter()
            .map(|p| vec![p.hour.to_string(), format!("{:.4}", p.mean_pred_orders)]),
    )
}
