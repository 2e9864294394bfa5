//! Stage orchestration: events → zones → zone-hour table → model → plan.
//!
//! Each stage is a plain function over owned or borrowed data so the binary
//! can run them one at a time (persisting artifacts in between) or chain
//! them in a single run.

use crate::allocation::{build_staffing_plan, StaffingRecord};
use crate::config::PipelineConfig;
use crate::error::{DemandError, Result};
use crate::events::RawEvent;
use crate::fingerprint::Fingerprint;
use crate::partition::split;
use crate::predictor::{evaluate, DemandPredictor, Evaluation, ModelKind, TrainedModel};
use crate::zone_hour::{aggregate, fill_missing_buckets, total_orders, ZoneHourRecord};
use crate::zoning::{assign_zones_with, Zone, ZoningMethod};

/// Output of the preprocessing stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessed {
    pub events: Vec<RawEvent>,
    pub zones: Vec<Zone>,
    pub records: Vec<ZoneHourRecord>,
    pub method: ZoningMethod,
    /// Digest over zones, assignments and the modelling table.
    pub fingerprint: u64,
}

/// Output of the training stage.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub model: TrainedModel,
    /// `None` when the holdout is empty.
    pub evaluation: Option<Evaluation>,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Zone the events and aggregate them into the modelling table.
pub fn preprocess(events: Vec<RawEvent>, config: &PipelineConfig) -> Result<Preprocessed> {
    config.validate()?;
    let n_events = events.len();
    let outcome = assign_zones_with(events, config.n_zones, config.seed, &config.kmeans)?;

    let mut records = aggregate(&outcome.events)?;
    if config.fill_missing_buckets {
        records = fill_missing_buckets(&records, &outcome.zones);
    }
    debug_assert_eq!(total_orders(&records), n_events as u64);

    let fingerprint = Fingerprint::default()
        .zones(&outcome.zones)
        .assignments(&outcome.events)
        .records(&records)
        .finish();
    tracing::info!(
        "preprocessed {} events into {} zones and {} zone-hour rows (fingerprint {:016x})",
        n_events,
        outcome.zones.len(),
        records.len(),
        fingerprint
    );

    Ok(Preprocessed {
        events: outcome.events,
        zones: outcome.zones,
        records,
        method: outcome.method,
        fingerprint,
    })
}

/// Split on the date axis, fit `kind` on the historical side and score it
/// on the holdout.
pub fn train(
    records: &[ZoneHourRecord],
    config: &PipelineConfig,
    kind: ModelKind,
) -> Result<TrainReport> {
    let partition = split(records, config.test_days)?;
    if partition.train.is_empty() {
        return Err(DemandError::InsufficientData(format!(
            "no training rows before the holdout ({} rows total)",
            records.len()
        )));
    }

    let model = TrainedModel::fit(kind, &partition.train)?;
    let evaluation = if partition.test.is_empty() {
        None
    } else {
        Some(evaluate(&model, &partition.test)?)
    };
    if let Some(e) = &evaluation {
        tracing::info!("{:?} model: MAE {:.3}, R² {:.3} on {} rows", kind, e.mae, e.r2, e.rows);
    }

    Ok(TrainReport {
        model,
        evaluation,
        train_rows: partition.train.len(),
        test_rows: partition.test.len(),
    })
}

/// Staffing requirement for every row of `records`.
pub fn plan<P: DemandPredictor + ?Sized>(
    records: &[ZoneHourRecord],
    predictor: &P,
    config: &PipelineConfig,
) -> Result<Vec<StaffingRecord>> {
    build_staffing_plan(
        records,
        predictor,
        config.avg_service_time_minutes,
        config.negative_predictions,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::FeatureRow;
    use crate::test_support::event;

    fn events_over_days(days: u32) -> Vec<RawEvent> {
        let mut out = Vec::new();
        for d in 1..=days {
            for h in [9, 12, 20] {
                for (i, lat) in [17.40, 17.41, 17.60, 17.61].into_iter().enumerate() {
                    out.push(event(
                        &format!("{d}-{h}-{i}"),
                        &format!("2025-07-{d:02}T{h:02}:15:00"),
                        lat,
                        78.4,
                    ));
                }
            }
        }
        out
    }

    fn config(n_zones: usize) -> PipelineConfig {
        PipelineConfig {
            n_zones,
            test_days: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_preprocess_conserves_orders() {
        let events = events_over_days(3);
        let n = events.len() as u64;
        let pre = preprocess(events, &config(2)).unwrap();
        assert_eq!(pre.zones.len(), 2);
        assert_eq!(total_orders(&pre.records), n);
        assert!(matches!(pre.method, ZoningMethod::KMeans { .. }));
        // Two zones, three hours, three days, two orders each.
        assert_eq!(pre.records.len(), 18);
        assert!(pre.records.iter().all(|r| r.order_count == 2));
    }

    #[test]
    fn test_preprocess_is_deterministic() {
        let a = preprocess(events_over_days(3), &config(2)).unwrap();
        let b = preprocess(events_over_days(3), &config(2)).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a, b);
    }

    #[test]
    fn test_preprocess_with_zero_fill() {
        let cfg = PipelineConfig {
            fill_missing_buckets: true,
            ..config(2)
        };
        let pre = preprocess(events_over_days(2), &cfg).unwrap();
        assert_eq!(pre.records.len(), 2 * 2 * 24);
        assert_eq!(total_orders(&pre.records), 24);
    }

    #[test]
    fn test_train_and_plan() {
        let pre = preprocess(events_over_days(5), &config(2)).unwrap();
        let report = train(&pre.records, &config(2), ModelKind::HourlyProfile).unwrap();
        assert_eq!(report.test_rows, 2 * 3 * 2);
        assert_eq!(report.train_rows, 2 * 3 * 3);
        let eval = report.evaluation.unwrap();
        assert!(eval.mae < 1e-9, "constant demand should be exact: {}", eval.mae);

        let plan = plan(&pre.records, &report.model, &config(2)).unwrap();
        assert_eq!(plan.len(), pre.records.len());
        // Two orders at 20 minutes each fit in one driver-hour.
        assert!(plan.iter().all(|s| s.drivers_needed == 1));
    }

    #[test]
    fn test_train_on_single_date_is_insufficient() {
        let pre = preprocess(events_over_days(1), &config(2)).unwrap();
        let err = train(&pre.records, &config(2), ModelKind::Linear).unwrap_err();
        assert!(matches!(err, DemandError::InsufficientData(_)));
    }

    #[test]
    fn test_plan_with_injected_predictor() {
        let pre = preprocess(events_over_days(2), &config(2)).unwrap();
        let flat = |_: &FeatureRow| 6.0;
        let plan = plan(&pre.records, &flat, &config(2)).unwrap();
        assert!(plan.iter().all(|s| s.drivers_needed == 2));
    }
}
