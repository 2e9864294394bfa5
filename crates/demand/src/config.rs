use serde::{Deserialize, Serialize};

use crate::error::{DemandError, Result};
use crate::simulate::SimulationParams;

/// Hours of the day treated as peak demand. Hand-chosen, not learned.
pub const PEAK_HOURS: [u32; 5] = [12, 13, 19, 20, 21];

/// Feature columns handed to a demand predictor, in contract order.
pub const FEATURE_COLUMNS: [&str; 9] = [
    "hour",
    "is_weekend",
    "is_peak_hour",
    "sin_hour",
    "cos_hour",
    "avg_items",
    "avg_prep",
    "temperature_c",
    "is_rain",
];

pub const HOURS_PER_DAY: u32 = 24;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_N_ZONES: usize = 8;
pub const DEFAULT_TEST_DAYS: usize = 3;
pub const DEFAULT_SERVICE_TIME_MINUTES: f64 = 20.0;

/// What the staffing plan does with a negative prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativePredictionPolicy {
    /// Abort with `InvalidPrediction`.
    #[default]
    Reject,
    /// Treat negative finite predictions as zero demand. Non-finite values
    /// are still rejected.
    Clamp,
}

/// Convergence knobs for the k-means zoner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansParams {
    pub max_iterations: usize,
    /// Stop once the largest squared centroid shift falls below this
    /// fraction of the mean per-axis variance of the points.
    pub tolerance: f64,
    /// Independently seeded restarts; the lowest-inertia run wins.
    pub restarts: usize,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            max_iterations: 300,
            tolerance: 1e-4,
            restarts: 4,
        }
    }
}

/// Run-wide configuration for the batch pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub n_zones: usize,
    pub seed: u64,
    pub test_days: usize,
    pub avg_service_time_minutes: f64,
    pub negative_predictions: NegativePredictionPolicy,
    pub fill_missing_buckets: bool,
    pub kmeans: KMeansParams,
    pub simulation: SimulationParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            n_zones: DEFAULT_N_ZONES,
            seed: DEFAULT_SEED,
            test_days: DEFAULT_TEST_DAYS,
            avg_service_time_minutes: DEFAULT_SERVICE_TIME_MINUTES,
            negative_predictions: NegativePredictionPolicy::default(),
            fill_missing_buckets: false,
            kmeans: KMeansParams::default(),
            simulation: SimulationParams::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)
            .map_err(|e| DemandError::InvalidParameter(format!("config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_zones < 1 {
            return Err(DemandError::invalid_parameter("n_zones must be >= 1"));
        }
        if self.test_days < 1 {
            return Err(DemandError::invalid_parameter("test_days must be >= 1"));
        }
        validate_service_time(self.avg_service_time_minutes)?;
        if self.kmeans.max_iterations == 0 {
            return Err(DemandError::invalid_parameter(
                "kmeans.max_iterations must be >= 1",
            ));
        }
        if self.kmeans.restarts == 0 {
            return Err(DemandError::invalid_parameter("kmeans.restarts must be >= 1"));
        }
        if self.kmeans.tolerance.is_nan() || self.kmeans.tolerance < 0.0 {
            return Err(DemandError::invalid_parameter(
                "kmeans.tolerance must be a non-negative number",
            ));
        }
        self.simulation.validate()
    }
}

pub(crate) fn validate_service_time(minutes: f64) -> Result<()> {
    if minutes.is_finite() && minutes > 0.0 {
        Ok(())
    } else {
        Err(DemandError::InvalidParameter(format!(
            "avg_service_time_minutes must be > 0, got {minutes}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.n_zones, 8);
        assert_eq!(config.seed, 42);
        assert_eq!(config.test_days, 3);
        assert!((config.avg_service_time_minutes - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = PipelineConfig::from_json_str(r#"{"n_zones": 5, "kmeans": {"restarts": 2}}"#)
            .expect("valid config");
        assert_eq!(config.n_zones, 5);
        assert_eq!(config.kmeans.restarts, 2);
        assert_eq!(config.kmeans.max_iterations, 300);
        assert_eq!(config.test_days, DEFAULT_TEST_DAYS);
    }

    #[test]
    fn test_policy_parses_snake_case() {
        let config = PipelineConfig::from_json_str(r#"{"negative_predictions": "clamp"}"#)
            .expect("valid config");
        assert_eq!(config.negative_predictions, NegativePredictionPolicy::Clamp);
    }

    #[test]
    fn test_zero_zones_rejected() {
        let err = PipelineConfig::from_json_str(r#"{"n_zones": 0}"#).unwrap_err();
        assert!(matches!(err, DemandError::InvalidParameter(_)));
    }

    #[test]
    fn test_bad_service_time_rejected() {
        for minutes in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let config = PipelineConfig {
                avg_service_time_minutes: minutes,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(DemandError::InvalidParameter(_))),
                "service time {minutes} should be rejected"
            );
        }
    }

    #[test]
    fn test_malformed_json_is_parameter_error() {
        let err = PipelineConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, DemandError::InvalidParameter(_)));
    }

    #[test]
    fn test_feature_columns_order() {
        assert_eq!(FEATURE_COLUMNS[0], "hour");
        assert_eq!(FEATURE_COLUMNS[6], "avg_prep");
        assert_eq!(FEATURE_COLUMNS[8], "is_rain");
    }
}
