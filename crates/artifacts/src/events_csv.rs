//! The events table: `order_id, order_ts, lat, lon, items, prep_time_min,
//! temperature_c, is_rain[, zone_id]`.

use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use demand::{parse_timestamp, DemandError, RawEvent};

use crate::csv_table::{bool_cell, open, write_rows, Header, Row};
use crate::error::Result;

const TABLE: &str = "events";

pub const EVENT_COLUMNS: [&str; 9] = [
    "order_id",
    "order_ts",
    "lat",
    "lon",
    "items",
    "prep_time_min",
    "temperature_c",
    "is_rain",
    "zone_id",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

struct EventColumns {
    id: usize,
    ts: usize,
    lat: usize,
    lon: usize,
    items: usize,
    prep: usize,
    temperature: usize,
    rain: usize,
    zone: Option<usize>,
}

impl EventColumns {
    fn resolve(header: &Header) -> Result<Self> {
        Ok(Self {
            id: header.require("order_id")?,
            ts: header.require("order_ts")?,
            lat: header.require("lat")?,
            lon: header.require("lon")?,
            items: header.require("items")?,
            prep: header.require("prep_time_min")?,
            temperature: header.require("temperature_c")?,
            rain: header.require("is_rain")?,
            zone: header.optional("zone_id"),
        })
    }

    fn event(&self, record: &StringRecord) -> Result<RawEvent> {
        let row = Row {
            table: TABLE,
            record,
        };
        let id = row.text(self.id).to_string();
        let timestamp = parse_timestamp(row.text(self.ts))?;

        let item_count: u32 = row.parse(self.items, "items")?;
        if item_count < 1 {
            return Err(DemandError::InvalidParameter(format!("order {id}: items must be >= 1")).into());
        }
        let prep_time_minutes: f64 = row.parse(self.prep, "prep_time_min")?;
        if !(prep_time_minutes >= 0.0 && prep_time_minutes.is_finite()) {
            return Err(DemandError::InvalidParameter(format!(
                "order {id}: prep_time_min must be a finite value >= 0"
            ))
            .into());
        }

        let zone_id = match self.zone {
            Some(i) if !row.text(i).is_empty() => Some(row.parse::<u32>(i, "zone_id")?),
            _ => None,
        };

        Ok(RawEvent {
            id,
            timestamp,
            latitude: row.parse(self.lat, "lat")?,
            longitude: row.parse(self.lon, "lon")?,
            item_count,
            prep_time_minutes,
            temperature_c: row.parse(self.temperature, "temperature_c")?,
            is_rain: row.flag(self.rain, "is_rain")?,
            zone_id,
        })
    }
}

/// Parse events from any CSV source. Extra columns are ignored.
pub fn read_events_from<R: Read>(reader: R) -> Result<Vec<RawEvent>> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    collect_events(&mut csv)
}

pub fn read_events(path: &Path) -> Result<Vec<RawEvent>> {
    let mut csv = open(path)?;
    let events = collect_events(&mut csv)?;
    tracing::info!("read {} events from {}", events.len(), path.display());
    Ok(events)
}

fn collect_events<R: Read>(csv: &mut csv::Reader<R>) -> Result<Vec<RawEvent>> {
    let header = Header::read(TABLE, csv)?;
    let columns = EventColumns::resolve(&header)?;
    let mut events = Vec::new();
    for record in csv.records() {
        events.push(columns.event(&record?)?);
    }
    Ok(events)
}

/// Write events, with an empty `zone_id` cell for unlabelled ones.
pub fn write_events(path: &Path, events: &[RawEvent]) -> Result<()> {
    write_rows(
        path,
        &EVENT_COLUMNS,
        events.iter().map(|e| {
            vec![
                e.id.clone(),
                e.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                e.latitude.to_string(),
                e.longitude.to_string(),
                e.item_count.to_string(),
                e.prep_time_minutes.to_string(),
                e.temperature_c.to_string(),
                bool_cell(e.is_rain).to_string(),
                e.zone_id.map(|z| z.to_string()).unwrap_or_default(),
            ]
        }),
    )
}
