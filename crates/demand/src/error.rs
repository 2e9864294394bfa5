// ---------------------------------------------------------------------------
// DemandError: the failure kinds of the forecasting pipeline
// ---------------------------------------------------------------------------

use thiserror::Error;

/// Errors raised by the pipeline stages.
///
/// Every stage raises at the point of detection and the caller aborts the
/// run; nothing here is retried or recovered locally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DemandError {
    /// A configuration value is out of range (zone count, service time, ...).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// The input is empty or too degenerate for the stage to work on.
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    /// A timestamp string could not be parsed as a date-time.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
    /// A demand prediction was negative or not finite.
    #[error("invalid prediction {value}: {context}")]
    InvalidPrediction { value: f64, context: String },
}

pub type Result<T> = std::result::Result<T, DemandError>;

impl DemandError {
    pub(crate) fn invalid_parameter(msg: impl Into<String>) -> Self {
        DemandError::InvalidParameter(msg.into())
    }

    pub(crate) fn insufficient_data(msg: impl Into<String>) -> Self {
        DemandError::InsufficientData(msg.into())
    }
}
