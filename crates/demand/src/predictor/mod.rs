//! Demand predictor seam.
//!
//! The pipeline only needs "given a feature row, return a real-valued
//! prediction". Anything implementing [`DemandPredictor`] can be injected:
//! the built-in linear model, the rule-based hourly profile, or a closure.

mod hourly_profile;
mod linear;
mod metrics;

pub use hourly_profile::HourlyProfilePredictor;
pub use linear::LinearDemandModel;
pub use metrics::{evaluate, Evaluation};

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::config::FEATURE_COLUMNS;
use crate::error::Result;
use crate::zone_hour::ZoneHourRecord;

pub const N_FEATURES: usize = FEATURE_COLUMNS.len();

/// The fixed feature contract, in [`FEATURE_COLUMNS`] order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub hour: f64,
    pub is_weekend: f64,
    pub is_peak_hour: f64,
    pub sin_hour: f64,
    pub cos_hour: f64,
    pub avg_items: f64,
    pub avg_prep: f64,
    pub temperature_c: f64,
    pub is_rain: f64,
}

impl FeatureRow {
    pub fn as_array(&self) -> [f64; N_FEATURES] {
        [
            self.hour,
            self.is_weekend,
            self.is_peak_hour,
            self.sin_hour,
            self.cos_hour,
            self.avg_items,
            self.avg_prep,
            self.temperature_c,
            self.is_rain,
        ]
    }
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

impl From<&ZoneHourRecord> for FeatureRow {
    fn from(r: &ZoneHourRecord) -> Self {
        Self {
            hour: f64::from(r.hour),
            is_weekend: flag(r.is_weekend),
            is_peak_hour: flag(r.is_peak_hour),
            sin_hour: r.sin_hour,
            cos_hour: r.cos_hour,
            avg_items: r.avg_items,
            avg_prep: r.avg_prep_minutes,
            temperature_c: r.temperature_c,
            is_rain: flag(r.is_rain),
        }
    }
}

/// A fitted demand model.
pub trait DemandPredictor {
    fn predict(&self, row: &FeatureRow) -> f64;

    fn predict_batch(&self, rows: &[FeatureRow]) -> Vec<f64> {
        rows.iter().map(|r| self.predict(r)).collect()
    }
}

impl<F> DemandPredictor for F
where
    F: Fn(&FeatureRow) -> f64,
{
    fn predict(&self, row: &FeatureRow) -> f64 {
        self(row)
    }
}

/// Which built-in model to train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    #[default]
    Linear,
    HourlyProfile,
}

/// A built-in model as persisted in the model artifact.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub enum TrainedModel {
    Linear(LinearDemandModel),
    HourlyProfile(HourlyProfilePredictor),
}

impl TrainedModel {
    /// Fit the requested model on the training rows.
    pub fn fit(kind: ModelKind, train: &[ZoneHourRecord]) -> Result<Self> {
        match kind {
            ModelKind::Linear => LinearDemandModel::fit(train).map(TrainedModel::Linear),
            ModelKind::HourlyProfile => {
                HourlyProfilePredictor::fit(train).map(TrainedModel::HourlyProfile)
            }
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            TrainedModel::Linear(_) => ModelKind::Linear,
            TrainedModel::HourlyProfile(_) => ModelKind::HourlyProfile,
        }
    }
}

impl DemandPredictor for TrainedModel {
    fn predict(&self, row: &FeatureRow) -> f64 {
        match self {
            TrainedModel::Linear(m) => m.predict(row),
            TrainedModel::HourlyProfile(m) => m.predict(row),
        }
    }
}
