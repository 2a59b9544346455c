//! # Trade Math
//!
//! Streaming technical indicators used to derive daily price features.
//!
//! Every indicator is fed one observation at a time through `update` and
//! reports its current reading through `value`, which fails with
//! [`MathError::InsufficientData`] until the indicator has seen enough
//! history. The `*_series` helpers run an indicator over a whole slice and
//! return one optional reading per input row.

use thiserror::Error;

pub mod moving_averages;
pub mod oscillators;
pub mod volatility;

pub use moving_averages::ExponentialMovingAverage;
pub use oscillators::{macd_series, rsi_series, Macd, MacdSeries, RelativeStrengthIndex};
pub use volatility::{atr_series, AverageTrueRange};

/// Errors that can occur in indicator calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for trading math operations
pub type Result<T> = std::result::Result<T, MathError>;
