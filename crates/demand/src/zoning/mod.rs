//! Zoner: partitions raw order locations into a fixed number of zones.
//!
//! Two paths:
//! - every event already carries a zone id: clustering is skipped and each
//!   zone's centre is the mean of its events' coordinates;
//! - otherwise all events are clustered with seeded k-means into exactly
//!   `n_zones` zones and labelled with their nearest centroid.

mod kmeans;
mod types;

pub use types::{Zone, ZoningMethod, ZoningOutcome};

use std::collections::BTreeMap;

use crate::config::KMeansParams;
use crate::error::{DemandError, Result};
use crate::events::RawEvent;

/// Assign every event to a zone and compute the zone centres.
///
/// Uses the default k-means parameters. See [`assign_zones_with`].
pub fn assign_zones(
    events: Vec<RawEvent>,
    n_zones: usize,
    seed: u64,
) -> Result<(Vec<RawEvent>, Vec<Zone>)> {
    let outcome = assign_zones_with(events, n_zones, seed, &KMeansParams::default())?;
    Ok((outcome.events, outcome.zones))
}

/// Assign every event to a zone with explicit clustering parameters.
///
/// # Errors
///
/// - `InsufficientData` if `events` is empty.
/// - `InvalidParameter` if `n_zones < 1`, if `n_zones` exceeds the number of
///   distinct locations, if a coordinate is not finite, or if precomputed
///   zone ids are not dense `0..k`.
pub fn assign_zones_with(
    events: Vec<RawEvent>,
    n_zones: usize,
    seed: u64,
    params: &KMeansParams,
) -> Result<ZoningOutcome> {
    if events.is_empty() {
        return Err(DemandError::insufficient_data("cannot zone an empty event set"));
    }
    if n_zones < 1 {
        return Err(DemandError::invalid_parameter("n_zones must be >= 1"));
    }

    if events.iter().all(|e| e.zone_id.is_some()) {
        let zones = precomputed_centers(&events)?;
        if zones.len() != n_zones {
            tracing::debug!(
                "input carries {} zones; requested n_zones={} is ignored",
                zones.len(),
                n_zones
            );
        }
        tracing::info!(
            "zoning skipped: {} events already carry {} zone ids",
            events.len(),
            zones.len()
        );
        return Ok(ZoningOutcome {
            events,
            zones,
            method: ZoningMethod::Precomputed,
        });
    }

    let points = coordinates(&events)?;
    let distinct = count_distinct(&points);
    if n_zones > distinct {
        return Err(DemandError::InvalidParameter(format!(
            "n_zones={n_zones} exceeds the {distinct} distinct locations"
        )));
    }

    let fit = kmeans::fit(&points, n_zones, seed, params);
    tracing::info!(
        "zoning: {} events -> {} zones ({} iterations, converged={}, inertia {:.6})",
        events.len(),
        n_zones,
        fit.iterations,
        fit.converged,
        fit.inertia
    );

    let zones = fit
        .centroids
        .iter()
        .enumerate()
        .map(|(id, c)| Zone {
            zone_id: id as u32,
            center_latitude: c[0],
            center_longitude: c[1],
        })
        .collect();
    let events = events
        .into_iter()
        .zip(fit.labels)
        .map(|(e, label)| e.with_zone(label))
        .collect();

    Ok(ZoningOutcome {
        events,
        zones,
        method: ZoningMethod::KMeans {
            iterations: fit.iterations,
            converged: fit.converged,
            inertia: fit.inertia,
        },
    })
}

/// Mean location per precomputed zone id, sorted by id.
///
/// Coordinates are sorted before summation so the result does not depend
/// on the order of `events`.
pub fn precomputed_centers(events: &[RawEvent]) -> Result<Vec<Zone>> {
    let mut by_zone: BTreeMap<u32, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for e in events {
        let Some(zone_id) = e.zone_id else {
            return Err(DemandError::InvalidParameter(format!(
                "event {} has no zone id",
                e.id
            )));
        };
        check_finite(e)?;
        let entry = by_zone.entry(zone_id).or_default();
        entry.0.push(e.latitude);
        entry.1.push(e.longitude);
    }

    let mut zones = Vec::with_capacity(by_zone.len());
    for (expected, (zone_id, (mut lats, mut lons))) in by_zone.into_iter().enumerate() {
        if zone_id as usize != expected {
            return Err(DemandError::InvalidParameter(format!(
                "zone ids must be dense from 0; missing zone {expected}"
            )));
        }
        zones.push(Zone {
            zone_id,
            center_latitude: ordered_mean(&mut lats),
            center_longitude: ordered_mean(&mut lons),
        });
    }
    Ok(zones)
}

fn ordered_mean(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    values.iter().sum::<f64>() / values.len() as f64
}

fn check_finite(e: &RawEvent) -> Result<()> {
    if e.latitude.is_finite() && e.longitude.is_finite() {
        Ok(())
    } else {
        Err(DemandError::InvalidParameter(format!(
            "event {} has a non-finite location ({}, {})",
            e.id, e.latitude, e.longitude
        )))
    }
}

fn coordinates(events: &[RawEvent]) -> Result<Vec<kmeans::Point>> {
    events
        .iter()
        .map(|e| {
            check_finite(e)?;
            Ok([e.latitude, e.longitude])
        })
        .collect()
}

fn count_distinct(points: &[kmeans::Point]) -> usize {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
    sorted.dedup();
    sorted.len()
}
