//! Ordinary least squares over the feature contract.

use bitcode::{Decode, Encode};

use crate::error::{DemandError, Result};
use crate::zone_hour::ZoneHourRecord;

use super::{DemandPredictor, FeatureRow, N_FEATURES};

/// Ridge strength per training row. Only large enough to keep constant or
/// collinear columns (e.g. no rain in the training window) solvable.
const RIDGE_PER_ROW: f64 = 1e-6;

/// Smallest pivot accepted during elimination.
const PIVOT_EPSILON: f64 = 1e-12;

/// `orders ≈ intercept + Σ coefficients[i] · feature[i]`.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct LinearDemandModel {
    pub intercept: f64,
    /// One weight per feature, in contract order.
    pub coefficients: Vec<f64>,
}

impl LinearDemandModel {
    /// Fit by the normal equations `(XᵀX + λI')β = Xᵀy`, where `I'` leaves
    /// the intercept unpenalised.
    pub fn fit(train: &[ZoneHourRecord]) -> Result<Self> {
        if train.is_empty() {
            return Err(DemandError::insufficient_data(
                "cannot fit a linear model on zero rows",
            ));
        }

        const D: usize = N_FEATURES + 1;
        let mut xtx = [[0.0f64; D]; D];
        let mut xty = [0.0f64; D];

        for r in train {
            let f = FeatureRow::from(r).as_array();
            let mut x = [1.0f64; D];
            x[1..].copy_from_slice(&f);
            let y = f64::from(r.order_count);
            for i in 0..D {
                xty[i] += x[i] * y;
                for j in i..D {
                    xtx[i][j] += x[i] * x[j];
                }
            }
        }
        for i in 0..D {
            for j in 0..i {
                xtx[i][j] = xtx[j][i];
            }
        }

        let lambda = RIDGE_PER_ROW * train.len() as f64;
        for (i, row) in xtx.iter_mut().enumerate().skip(1) {
            row[i] += lambda;
        }

        let beta = solve(xtx, xty)?;
        tracing::debug!("linear model fitted on {} rows: {:?}", train.len(), beta);
        Ok(Self {
            intercept: beta[0],
            coefficients: beta[1..].to_vec(),
        })
    }
}

impl DemandPredictor for LinearDemandModel {
    fn predict(&self, row: &FeatureRow) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row.as_array())
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}

/// Gaussian elimination with partial pivoting.
fn solve<const D: usize>(mut a: [[f64; D]; D], mut b: [f64; D]) -> Result<[f64; D]> {
    for col in 0..D {
        let pivot = (col..D)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < PIVOT_EPSILON {
            return Err(DemandError::insufficient_data(
                "training features are degenerate (singular design matrix)",
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..D {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..D {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0f64; D];
    for row in (0..D).rev() {
        let tail: f64 = (row + 1..D).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}
