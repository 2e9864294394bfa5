//! Zone-hour delivery demand: spatial zoning of order events, temporal
//! features, the zone-hour modelling table, date-axis partitioning, demand
//! predictors, and driver allocation.

pub mod allocation;
pub mod config;
pub mod error;
pub mod events;
pub mod fingerprint;
pub mod partition;
pub mod pipeline;
pub mod predictor;
pub mod simulate;
pub mod summary;
pub mod time_features;
pub mod zone_hour;
pub mod zone_rng;
pub mod zoning;

#[cfg(test)]
mod test_support;

pub use allocation::{allocate, build_staffing_plan, StaffingRecord};
pub use config::{KMeansParams, NegativePredictionPolicy, PipelineConfig};
pub use error::{DemandError, Result};
pub use events::{parse_timestamp, RawEvent};
pub use partition::{split, Partition};
pub use predictor::{
    evaluate, DemandPredictor, Evaluation, FeatureRow, ModelKind, TrainedModel,
};
pub use time_features::{derive_time_features, TimeFeatures};
pub use zone_hour::{aggregate, ZoneHourRecord};
pub use zoning::{assign_zones, Zone};
