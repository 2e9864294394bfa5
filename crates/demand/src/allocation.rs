//! Allocator: turns predicted demand into a driver count.
//!
//! Formula:
//!   drivers = ceil(predicted_orders * avg_service_time_minutes / 60)
//!
//! i.e. person-minutes of work in the hour bucket divided into 60-minute
//! driver shifts, rounded up so capacity is never under-provisioned.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{validate_service_time, NegativePredictionPolicy};
use crate::error::{DemandError, Result};
use crate::predictor::{DemandPredictor, FeatureRow};
use crate::zone_hour::ZoneHourRecord;

const MINUTES_PER_SHIFT: f64 = 60.0;

/// Staffing requirement for one zone-hour bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffingRecord {
    pub zone_id: u32,
    pub date: NaiveDate,
    pub hour: u32,
    pub predicted_orders: f64,
    pub drivers_needed: u32,
}

/// Drivers needed to serve `predicted_orders` in one hour.
///
/// # Errors
///
/// - `InvalidPrediction` if `predicted_orders` is negative or not finite.
/// - `InvalidParameter` if `avg_service_time_minutes` is not a positive
///   finite number.
pub fn allocate(predicted_orders: f64, avg_service_time_minutes: f64) -> Result<u32> {
    validate_service_time(avg_service_time_minutes)?;
    if !predicted_orders.is_finite() || predicted_orders < 0.0 {
        return Err(DemandError::InvalidPrediction {
            value: predicted_orders,
            context: "predicted orders must be finite and >= 0".to_string(),
        });
    }
    let drivers = (predicted_orders * avg_service_time_minutes / MINUTES_PER_SHIFT).ceil();
    if drivers > f64::from(u32::MAX) {
        return Err(DemandError::InvalidPrediction {
            value: predicted_orders,
            context: format!("requires {drivers} drivers, beyond the representable range"),
        });
    }
    Ok(drivers as u32)
}

/// Apply the negative-prediction policy to one raw prediction.
pub fn apply_policy(prediction: f64, policy: NegativePredictionPolicy) -> f64 {
    match policy {
        NegativePredictionPolicy::Clamp if prediction.is_finite() && prediction < 0.0 => 0.0,
        _ => prediction,
    }
}

/// Predict and allocate every record, preserving record order.
pub fn build_staffing_plan<P: DemandPredictor + ?Sized>(
    records: &[ZoneHourRecord],
    predictor: &P,
    avg_service_time_minutes: f64,
    policy: NegativePredictionPolicy,
) -> Result<Vec<StaffingRecord>> {
    validate_service_time(avg_service_time_minutes)?;

    let mut clamped = 0usize;
    let mut plan = Vec::with_capacity(records.len());
    for r in records {
        let raw = predictor.predict(&FeatureRow::from(r));
        let predicted_orders = apply_policy(raw, policy);
        if predicted_orders.to_bits() != raw.to_bits() {
            clamped += 1;
        }
        let drivers_needed = allocate(predicted_orders, avg_service_time_minutes).map_err(|e| match e {
            DemandError::InvalidPrediction { value, context } => DemandError::InvalidPrediction {
                value,
                context: format!("zone {} at {} {:02}:00: {}", r.zone_id, r.date, r.hour, context),
            },
            other => other,
        })?;
        plan.push(StaffingRecord {
            zone_id: r.zone_id,
            date: r.date,
            hour: r.hour,
            predicted_orders,
            drivers_needed,
        });
    }

    if clamped > 0 {
        tracing::warn!("clamped {} negative predictions to zero", clamped);
    }
    tracing::info!(
        "staffing plan: {} rows, {} driver-hours",
        plan.len(),
        plan.iter().map(|s| u64::from(s.drivers_needed)).sum::<u64>()
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_features::TimeFeatures;

    fn record(zone_id: u32, hour: u32) -> ZoneHourRecord {
        let date = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let f = TimeFeatures::for_bucket(date, hour);
        ZoneHourRecord {
            zone_id,
            date,
            hour,
            order_count: 3,
            avg_items: 2.0,
            avg_prep_minutes: 15.0,
            temperature_c: 30.0,
            is_rain: false,
            is_weekend: f.is_weekend,
            is_peak_hour: f.is_peak_hour,
            sin_hour: f.sin_hour,
            cos_hour: f.cos_hour,
        }
    }

    #[test]
    fn test_allocate_exact_multiple() {
        assert_eq!(allocate(30.0, 20.0).unwrap(), 10);
    }

    #[test]
    fn test_allocate_rounds_up() {
        assert_eq!(allocate(31.0, 20.0).unwrap(), 11);
        assert_eq!(allocate(0.01, 20.0).unwrap(), 1);
    }

    #[test]
    fn test_allocate_zero_demand() {
        assert_eq!(allocate(0.0, 20.0).unwrap(), 0);
    }

    #[test]
    fn test_allocate_monotone_in_demand() {
        let mut last = 0;
        for i in 0..2_000 {
            let demand = f64::from(i) * 0.037;
            let drivers = allocate(demand, 17.5).unwrap();
            assert!(drivers >= last, "demand {demand}");
            last = drivers;
        }
    }

    #[test]
    fn test_allocate_rejects_bad_predictions() {
        for bad in [-0.5, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(
                matches!(allocate(bad, 20.0), Err(DemandError::InvalidPrediction { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_allocate_rejects_bad_service_time() {
        for bad in [0.0, -1.0, f64::NAN] {
            assert!(matches!(allocate(10.0, bad), Err(DemandError::InvalidParameter(_))));
        }
    }

    #[test]
    fn test_policy_clamp_only_finite_negatives() {
        assert_eq!(apply_policy(-2.0, NegativePredictionPolicy::Clamp), 0.0);
        assert_eq!(apply_policy(-2.0, NegativePredictionPolicy::Reject), -2.0);
        assert_eq!(apply_policy(3.0, NegativePredictionPolicy::Clamp), 3.0);
        assert!(apply_policy(f64::NAN, NegativePredictionPolicy::Clamp).is_nan());
    }

    #[test]
    fn test_plan_uses_predictor_per_row() {
        let records = vec![record(0, 12), record(1, 3)];
        let predictor = |row: &FeatureRow| if row.is_peak_hour > 0.5 { 31.0 } else { 3.0 };
        let plan = build_staffing_plan(&records, &predictor, 20.0, NegativePredictionPolicy::Reject)
            .unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].zone_id, 0);
        assert_eq!(plan[0].drivers_needed, 11);
        assert_eq!(plan[1].zone_id, 1);
        assert_eq!(plan[1].drivers_needed, 1);
        assert!((plan[1].predicted_orders - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_plan_rejects_negative_by_default() {
        let records = vec![record(4, 9)];
        let negative = |_: &FeatureRow| -1.0;
        let err = build_staffing_plan(&records, &negative, 20.0, NegativePredictionPolicy::Reject)
            .unwrap_err();
        match err {
            DemandError::InvalidPrediction { value, context } => {
                assert_eq!(value, -1.0);
                assert!(context.contains("zone 4"), "got: {context}");
                assert!(context.contains("09:00"), "got: {context}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_plan_clamps_negative_when_asked() {
        let records = vec![record(0, 9)];
        let negative = |_: &FeatureRow| -1.0;
        let plan = build_staffing_plan(&records, &negative, 20.0, NegativePredictionPolicy::Clamp)
            .unwrap();
        assert_eq!(plan[0].predicted_orders, 0.0);
        assert_eq!(plan[0].drivers_needed, 0);
    }

    #[test]
    fn test_plan_rejects_nan_even_when_clamping() {
        let records = vec![record(0, 9)];
        let nan = |_: &FeatureRow| f64::NAN;
        assert!(build_staffing_plan(&records, &nan, 20.0, NegativePredictionPolicy::Clamp).is_err());
    }
}
