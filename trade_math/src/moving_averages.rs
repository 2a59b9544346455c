//! Moving average calculation implementations
//!
//! Contains the Exponential Moving Average (EMA) used by the trend
//! oscillators.

use crate::{MathError, Result};

/// Exponential Moving Average (EMA) implementation
///
/// The average is seeded with the first observation and smoothed with
/// `multiplier = 2 / (period + 1)`. A reading is only reported once `period`
/// observations have been seen.
#[derive(Debug, Clone)]
pub struct ExponentialMovingAverage {
    period: usize,
    multiplier: f64,
    current_ema: Option<f64>,
    values_seen: usize,
}

impl ExponentialMovingAverage {
    /// Create a new Exponential Moving Average with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        let multiplier = 2.0 / (period as f64 + 1.0);

        Ok(Self {
            period,
            multiplier,
            current_ema: None,
            values_seen: 0,
        })
    }

    /// Update the EMA with a new value
    pub fn update(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "EMA input must be finite, got {}",
                value
            )));
        }

        self.values_seen += 1;

        self.current_ema = Some(match self.current_ema {
            None => value,
            // EMA = (value - EMA(previous)) * multiplier + EMA(previous)
            Some(current) => (value - current) * self.multiplier + current,
        });

        Ok(())
    }

    /// Get the current EMA value
    pub fn value(&self) -> Result<f64> {
        match self.current_ema {
            Some(ema) if self.values_seen >= self.period => Ok(ema),
            _ => Err(MathError::InsufficientData(format!(
                "Not enough data for EMA calculation. Need {} values, have {}.",
                self.period, self.values_seen
            ))),
        }
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Number of observations fed so far
    pub fn values_seen(&self) -> usize {
        self.values_seen
    }

    /// Reset the EMA, clearing all values
    pub fn reset(&mut self) {
        self.current_ema = None;
        self.values_seen = 0;
    }
}
