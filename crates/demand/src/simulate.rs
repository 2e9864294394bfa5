//! Synthetic order generator for a single city.
//!
//! Orders cluster around lunch (13:00) and dinner (20:00), are scattered
//! uniformly in radius around the city centre, and share one weather draw
//! per day. Deterministic for a given seed.

use std::f64::consts::PI;

use chrono::{Duration, NaiveDate};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{DemandError, Result};
use crate::events::RawEvent;
use crate::zone_rng::ZoneRng;

/// Kilometres per degree of latitude.
const KM_PER_DEGREE: f64 = 111.0;
const RAIN_DAY_PROBABILITY: f64 = 0.25;
const RAIN_ORDER_PROBABILITY: f64 = 0.6;
const MIN_PREP_MINUTES: f64 = 8.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub n_days: u32,
    pub start_date: NaiveDate,
    pub city_center: (f64, f64),
    pub city_radius_km: f64,
    /// Candidate orders per day, before the hour-of-day thinning.
    pub orders_per_day: u32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            n_days: 14,
            start_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap_or_default(),
            city_center: (17.441, 78.389),
            city_radius_km: 12.0,
            orders_per_day: 3000,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> Result<()> {
        if self.n_days == 0 {
            return Err(DemandError::invalid_parameter("simulation.n_days must be >= 1"));
        }
        if self.orders_per_day == 0 {
            return Err(DemandError::invalid_parameter(
                "simulation.orders_per_day must be >= 1",
            ));
        }
        if !(self.city_radius_km.is_finite() && self.city_radius_km > 0.0) {
            return Err(DemandError::invalid_parameter(
                "simulation.city_radius_km must be > 0",
            ));
        }
        let (lat, lon) = self.city_center;
        if !(lat.is_finite() && lon.is_finite() && lat.abs() < 90.0) {
            return Err(DemandError::invalid_parameter(
                "simulation.city_center must be a finite (lat, lon) off the poles",
            ));
        }
        Ok(())
    }
}

/// Probability that a candidate order in `hour` is kept: two Gaussian bumps
/// at 13:00 and 20:00 over a 0.15 floor, capped at 1.
pub fn hourly_intensity(hour: u32) -> f64 {
    let h = f64::from(hour);
    let bump = |centre: f64| (-(h - centre).powi(2) / (2.0 * 2.5f64.powi(2))).exp();
    (0.6 * bump(13.0) + 0.9 * bump(20.0) + 0.15).min(1.0)
}

fn normal(mean: f64, sd: f64) -> Result<Normal<f64>> {
    Normal::new(mean, sd).map_err(|e| DemandError::InvalidParameter(format!("normal({mean}, {sd}): {e}")))
}

/// Generate orders for `params.n_days` days starting at `params.start_date`.
pub fn simulate(params: &SimulationParams, seed: u64) -> Result<Vec<RawEvent>> {
    params.validate()?;

    let mut rng = ZoneRng::from_seed_u64(seed);
    let day_temperature = normal(30.0, 2.0)?;
    let jitter_temperature = normal(0.0, 1.5)?;
    let items = normal(2.2, 0.9)?;
    let prep = normal(18.0, 5.0)?;

    let (lat0, lon0) = params.city_center;
    let lon_km_per_degree = KM_PER_DEGREE * lat0.to_radians().cos();
    let midnight = params
        .start_date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| DemandError::invalid_parameter("simulation.start_date has no midnight"))?;

    let mut events = Vec::new();
    for day in 0..params.n_days {
        let base_temperature = day_temperature.sample(&mut rng.0);
        let is_rain_day = rng.0.gen::<f64>() < RAIN_DAY_PROBABILITY;

        for i in 0..params.orders_per_day {
            let hour: u32 = rng.0.gen_range(0..24);
            if rng.0.gen::<f64>() > hourly_intensity(hour) {
                continue;
            }
            let minute: i64 = rng.0.gen_range(0..60);
            let timestamp = midnight
                + Duration::days(i64::from(day))
                + Duration::hours(i64::from(hour))
                + Duration::minutes(minute);

            let r_km = rng.0.gen_range(0.0..params.city_radius_km);
            let theta = rng.0.gen_range(0.0..2.0 * PI);
            let latitude = lat0 + (r_km / KM_PER_DEGREE) * theta.cos();
            let longitude = lon0 + (r_km / lon_km_per_degree) * theta.sin();

            let item_count = items.sample(&mut rng.0).trunc().max(1.0) as u32;
            let prep_time_minutes = prep.sample(&mut rng.0).max(MIN_PREP_MINUTES);
            let temperature_c = base_temperature + jitter_temperature.sample(&mut rng.0);
            let is_rain = is_rain_day && rng.0.gen::<f64>() < RAIN_ORDER_PROBABILITY;

            events.push(RawEvent {
                id: format!("O{day:02}-{i:05}"),
                timestamp,
                latitude,
                longitude,
                item_count,
                prep_time_minutes,
                temperature_c,
                is_rain,
                zone_id: None,
            });
        }
    }

    tracing::info!(
        "simulated {} orders over {} days (seed {})",
        events.len(),
        params.n_days,
        seed
    );
    Ok(events)
}
