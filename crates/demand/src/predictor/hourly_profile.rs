//! Rule-based predictor: mean demand per (hour, weekend) cell.

use bitcode::{Decode, Encode};

use crate::config::HOURS_PER_DAY;
use crate::error::{DemandError, Result};
use crate::zone_hour::ZoneHourRecord;

use super::{DemandPredictor, FeatureRow};

/// Predicts the mean `order_count` seen for the same hour and weekend flag.
///
/// Falls back to the hour mean, then to the global mean, for cells that had
/// no training rows.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct HourlyProfilePredictor {
    /// `cells[hour * 2 + is_weekend]`
    cells: Vec<Option<f64>>,
    hours: Vec<Option<f64>>,
    global: f64,
}

impl HourlyProfilePredictor {
    pub fn fit(train: &[ZoneHourRecord]) -> Result<Self> {
        if train.is_empty() {
            return Err(DemandError::insufficient_data(
                "cannot fit an hourly profile on zero rows",
            ));
        }

        let hours = HOURS_PER_DAY as usize;
        let mut cell_sums = vec![(0.0f64, 0u32); hours * 2];
        let mut hour_sums = vec![(0.0f64, 0u32); hours];
        let mut total = 0.0;
        for r in train {
            let h = (r.hour % HOURS_PER_DAY) as usize;
            let y = f64::from(r.order_count);
            let cell = &mut cell_sums[h * 2 + usize::from(r.is_weekend)];
            cell.0 += y;
            cell.1 += 1;
            hour_sums[h].0 += y;
            hour_sums[h].1 += 1;
            total += y;
        }

        let mean = |(sum, n): (f64, u32)| (n > 0).then(|| sum / f64::from(n));
        Ok(Self {
            cells: cell_sums.into_iter().map(mean).collect(),
            hours: hour_sums.into_iter().map(mean).collect(),
            global: total / train.len() as f64,
        })
    }
}

impl DemandPredictor for HourlyProfilePredictor {
    fn predict(&self, row: &FeatureRow) -> f64 {
        let h = (row.hour.max(0.0) as usize) % HOURS_PER_DAY as usize;
        let weekend = usize::from(row.is_weekend >= 0.5);
        self.cells
            .get(h * 2 + weekend)
            .copied()
            .flatten()
            .or_else(|| self.hours.get(h).copied().flatten())
            .unwrap_or(self.global)
    }
}
