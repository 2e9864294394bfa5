//! Deterministic digests of pipeline outputs.
//!
//! Used to check that a fixed input and seed reproduce the same zoning and
//! the same modelling table across runs. Data is hashed in a fixed order
//! and floats are hashed by bit pattern. xxHash64 with a zero seed is not
//! randomised, unlike `DefaultHasher`.

use xxhash_rust::xxh64::Xxh64;

use crate::events::RawEvent;
use crate::zone_hour::ZoneHourRecord;
use crate::zoning::Zone;

const XXHASH_SEED: u64 = 0;

/// Streaming digest builder over the fields the pipeline cares about.
pub struct Fingerprint {
    hasher: Xxh64,
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self {
            hasher: Xxh64::new(XXHASH_SEED),
        }
    }
}

impl Fingerprint {
    fn u32(&mut self, v: u32) {
        self.hasher.update(&v.to_le_bytes());
    }

    fn f64(&mut self, v: f64) {
        self.hasher.update(&v.to_bits().to_le_bytes());
    }

    pub fn zones(mut self, zones: &[Zone]) -> Self {
        self.u32(zones.len() as u32);
        for z in zones {
            self.u32(z.zone_id);
            self.f64(z.center_latitude);
            self.f64(z.center_longitude);
        }
        self
    }

    /// Hashes each event's id and zone label, in input order.
    pub fn assignments(mut self, events: &[RawEvent]) -> Self {
        self.u32(events.len() as u32);
        for e in events {
            self.hasher.update(e.id.as_bytes());
            self.u32(e.zone_id.map_or(u32::MAX, |z| z));
        }
        self
    }

    pub fn records(mut self, records: &[ZoneHourRecord]) -> Self {
        self.u32(records.len() as u32);
        for r in records {
            self.u32(r.zone_id);
            self.hasher.update(r.date.to_string().as_bytes());
            self.u32(r.hour);
            self.u32(r.order_count);
            self.f64(r.avg_items);
            self.f64(r.avg_prep_minutes);
            self.f64(r.temperature_c);
            self.u32(u32::from(r.is_rain));
        }
        self
    }

    pub fn finish(self) -> u64 {
        self.hasher.digest()
    }
}

/// Digest of a zoning result: zone centres plus every event's label.
pub fn zoning_fingerprint(events: &[RawEvent], zones: &[Zone]) -> u64 {
    Fingerprint::default().zones(zones).assignments(events).finish()
}
