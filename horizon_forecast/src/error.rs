//! Error types for the horizon_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the horizon_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Requested horizon outside `1..=MAX_HORIZON`
    #[error("n must be between 1 and {max}, got {requested}")]
    InvalidHorizon { requested: i64, max: usize },

    /// The model expects feature columns the data does not have
    #[error("Model requires additional features not found in data: {}", names.join(", "))]
    MissingFeatures { names: Vec<String> },

    /// A feature window starved during an iterative forecast
    #[error("Not enough rows to compute features at step {step}: {detail}")]
    InsufficientHistory { step: usize, detail: String },

    /// No row of the feature table is complete
    #[error("No valid rows found in dataset")]
    NoValidData,

    /// The model bundle was never loaded
    #[error("Model not loaded properly")]
    ModelUnavailable,

    /// Scaler or regressor failure during inference
    #[error("Computation error: {0}")]
    Computation(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error reading or writing a model bundle
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

#[cfg(feature = "indicators")]
impl From<trade_math::MathError> for ForecastError {
    fn from(err: trade_math::MathError) -> Self {
        ForecastError::Computation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ForecastError::InvalidHorizon {
            requested: 91,
            max: 90,
        };
        assert_eq!(err.to_string(), "n must be between 1 and 90, got 91");

        let err = ForecastError::MissingFeatures {
            names: vec!["MA7".to_string(), "rsi14".to_string()],
        };
        assert!(err.to_string().ends_with("MA7, rsi14"));

        let err = ForecastError::InsufficientHistory {
            step: 3,
            detail: "MA200 is missing".to_string(),
        };
        assert!(err.to_string().contains("step 3"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ForecastError = io.into();
        assert!(matches!(err, ForecastError::IoError(_)));
    }
}
