use serde::{Deserialize, Serialize};

use crate::error::{DemandError, Result};
use crate::zone_hour::ZoneHourRecord;

use super::{DemandPredictor, FeatureRow};

/// Holdout accuracy of a predictor against observed `order_count`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub rows: usize,
    pub mae: f64,
    pub r2: f64,
}

/// Mean absolute error and coefficient of determination on `records`.
///
/// With constant targets R² is 1 for an exact fit and 0 otherwise.
pub fn evaluate<P: DemandPredictor + ?Sized>(
    predictor: &P,
    records: &[ZoneHourRecord],
) -> Result<Evaluation> {
    if records.is_empty() {
        return Err(DemandError::insufficient_data("cannot evaluate on zero rows"));
    }

    let n = records.len() as f64;
    let actual: Vec<f64> = records.iter().map(|r| f64::from(r.order_count)).collect();
    let predicted: Vec<f64> = records
        .iter()
        .map(|r| predictor.predict(&FeatureRow::from(r)))
        .collect();

    let mean = actual.iter().sum::<f64>() / n;
    let mut abs_err = 0.0;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (y, p) in actual.iter().zip(&predicted) {
        abs_err += (y - p).abs();
        ss_res += (y - p).powi(2);
        ss_tot += (y - mean).powi(2);
    }

    let r2 = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };

    Ok(Evaluation {
        rows: records.len(),
        mae: abs_err / n,
        r2,
    })
}
