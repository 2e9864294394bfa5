use serde::{Deserialize, Serialize};

use crate::events::RawEvent;

/// A spatial partition of the service area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Dense id in `0..n_zones`.
    pub zone_id: u32,
    pub center_latitude: f64,
    pub center_longitude: f64,
}

/// How the zones of a run were obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoningMethod {
    /// Every input event already carried a zone id; centres are plain means.
    Precomputed,
    /// Zones were clustered from the event coordinates.
    KMeans {
        iterations: usize,
        converged: bool,
        inertia: f64,
    },
}

/// Output of the zoner: labelled events plus zones sorted by id.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoningOutcome {
    pub events: Vec<RawEvent>,
    pub zones: Vec<Zone>,
    pub method: ZoningMethod,
}
