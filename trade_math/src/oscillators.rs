//! Oscillator indicator implementations
//!
//! Contains implementations of various oscillator indicators:
//! - Relative Strength Index (RSI)
//! - Moving Average Convergence Divergence (MACD)

use crate::moving_averages::ExponentialMovingAverage;
use crate::{MathError, Result};

/// Relative Strength Index (RSI) implementation
///
/// Gains and losses are smoothed with Wilder's factor `1 / period`. The
/// first observation seeds both averages with zero, so a reading is
/// available after `period` prices.
#[derive(Debug, Clone)]
pub struct RelativeStrengthIndex {
    period: usize,
    alpha: f64,
    previous_price: Option<f64>,
    avg_gain: f64,
    avg_loss: f64,
    values_seen: usize,
}

impl RelativeStrengthIndex {
    /// Create a new RSI with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            alpha: 1.0 / period as f64,
            previous_price: None,
            avg_gain: 0.0,
            avg_loss: 0.0,
            values_seen: 0,
        })
    }

    /// Update the RSI with a new price value
    pub fn update(&mut self, price: f64) -> Result<()> {
        if !price.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "RSI input must be finite, got {}",
                price
            )));
        }

        self.values_seen += 1;

        if let Some(prev_price) = self.previous_price {
            let change = price - prev_price;
            let gain = change.max(0.0);
            let loss = (-change).max(0.0);

            // new_avg = prev_avg + alpha * (current - prev_avg)
            self.avg_gain += self.alpha * (gain - self.avg_gain);
            self.avg_loss += self.alpha * (loss - self.avg_loss);
        }

        self.previous_price = Some(price);

        Ok(())
    }

    /// Get the current RSI value (0-100)
    pub fn value(&self) -> Result<f64> {
        if self.values_seen < self.period {
            return Err(MathError::InsufficientData(format!(
                "Not enough data for RSI calculation. Need {} values, have {}.",
                self.period, self.values_seen
            )));
        }

        if self.avg_loss == 0.0 {
            return Ok(100.0);
        }

        let rs = self.avg_gain / self.avg_loss;
        Ok(100.0 - (100.0 / (1.0 + rs)))
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the RSI, clearing all values
    pub fn reset(&mut self) {
        self.previous_price = None;
        self.avg_gain = 0.0;
        self.avg_loss = 0.0;
        self.values_seen = 0;
    }
}

/// Moving Average Convergence Divergence (MACD) implementation
#[derive(Debug, Clone)]
pub struct Macd {
    fast_ema: ExponentialMovingAverage,
    slow_ema: ExponentialMovingAverage,
    signal_ema: ExponentialMovingAverage,
}

impl Macd {
    /// Create a new MACD with the specified parameters
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Result<Self> {
        if fast_period >= slow_period {
            return Err(MathError::InvalidInput(
                "Fast period must be smaller than slow period".to_string(),
            ));
        }

        if signal_period == 0 {
            return Err(MathError::InvalidInput(
                "Signal period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            fast_ema: ExponentialMovingAverage::new(fast_period)?,
            slow_ema: ExponentialMovingAverage::new(slow_period)?,
            signal_ema: ExponentialMovingAverage::new(signal_period)?,
        })
    }

    /// Update the MACD with a new price value
    pub fn update(&mut self, price: f64) -> Result<()> {
        self.fast_ema.update(price)?;
        self.slow_ema.update(price)?;

        // The signal line only starts once the MACD line itself exists
        if let Ok(macd_value) = self.macd_value() {
            self.signal_ema.update(macd_value)?;
        }

        Ok(())
    }

    /// Get the current MACD line value (fast EMA - slow EMA)
    pub fn macd_value(&self) -> Result<f64> {
        match (self.fast_ema.value(), self.slow_ema.value()) {
            (Ok(fast), Ok(slow)) => Ok(fast - slow),
            _ => Err(MathError::InsufficientData(
                "Not enough data to calculate MACD line".to_string(),
            )),
        }
    }

    /// Get the current signal line value (EMA of MACD)
    pub fn signal_value(&self) -> Result<f64> {
        self.signal_ema.value().map_err(|_| {
            MathError::InsufficientData("Not enough data to calculate signal line".to_string())
        })
    }

    /// Get the current histogram value (MACD line - signal line)
    pub fn histogram(&self) -> Result<f64> {
        Ok(self.macd_value()? - self.signal_value()?)
    }

    /// Get the fast period
    pub fn fast_period(&self) -> usize {
        self.fast_ema.period()
    }

    /// Get the slow period
    pub fn slow_period(&self) -> usize {
        self.slow_ema.period()
    }

    /// Get the signal period
    pub fn signal_period(&self) -> usize {
        self.signal_ema.period()
    }

    /// Reset the MACD, clearing all values
    pub fn reset(&mut self) {
        self.fast_ema.reset();
        self.slow_ema.reset();
        self.signal_ema.reset();
    }
}

/// Row-aligned MACD output: line, signal line and their difference
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub diff: Vec<Option<f64>>,
}

/// Run an RSI over `closes`, one reading per row
pub fn rsi_series(closes: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    let mut rsi = RelativeStrengthIndex::new(period)?;
    let mut out = Vec::with_capacity(closes.len());

    for &close in closes {
        rsi.update(close)?;
        out.push(rsi.value().ok());
    }

    Ok(out)
}

/// Run a MACD over `closes`, one reading per row for each output line
pub fn macd_series(
    closes: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> Result<MacdSeries> {
    let mut macd = Macd::new(fast_period, slow_period, signal_period)?;
    let mut out = MacdSeries {
        macd: Vec::with_capacity(closes.len()),
        signal: Vec::with_capacity(closes.len()),
        diff: Vec::with_capacity(closes.len()),
    };

    for &close in closes {
        macd.update(close)?;
        out.macd.push(macd.macd_value().ok());
        out.signal.push(macd.signal_value().ok());
        out.diff.push(macd.histogram().ok());
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rsi_calculation() {
        let mut rsi = RelativeStrengthIndex::new(3).unwrap();

        rsi.update(10.0).unwrap();
        rsi.update(10.5).unwrap();
        assert!(rsi.value().is_err());

        rsi.update(11.0).unwrap();
        // No losses yet
        assert_relative_eq!(rsi.value().unwrap(), 100.0);

        rsi.update(10.5).unwrap();
        let rsi_value = rsi.value().unwrap();
        assert_relative_eq!(rsi_value, 100.0 - 100.0 / (1.0 + 10.0 / 9.0), epsilon = 1e-9);

        // Test downtrend: should produce lower RSI
        rsi.update(10.0).unwrap();
        let new_rsi_value = rsi.value().unwrap();
        assert!(new_rsi_value < rsi_value);
        assert!((0.0..=100.0).contains(&new_rsi_value));
    }

    #[test]
    fn test_macd_calculation() {
        let mut macd = Macd::new(3, 6, 2).unwrap();

        for i in 0..5 {
            macd.update(100.0 + i as f64 * 2.0).unwrap();
        }
        assert!(macd.macd_value().is_err());

        macd.update(110.0).unwrap();
        // In an uptrend, MACD should be positive
        let macd_value = macd.macd_value().unwrap();
        assert!(macd_value > 0.0);

        // Signal line needs two MACD readings
        assert!(macd.signal_value().is_err());
        macd.update(112.0).unwrap();

        let histogram = macd.histogram().unwrap();
        assert_relative_eq!(
            histogram,
            macd.macd_value().unwrap() - macd.signal_value().unwrap()
        );
    }

    #[test]
    fn test_macd_rejects_inverted_periods() {
        assert!(Macd::new(26, 12, 9).is_err());
        assert!(Macd::new(12, 26, 0).is_err());
    }

    #[test]
    fn test_series_alignment() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin()).collect();

        let rsi = rsi_series(&closes, 14).unwrap();
        assert_eq!(rsi.len(), closes.len());
        assert!(rsi[12].is_none());
        assert!(rsi[13].is_some());

        let macd = macd_series(&closes, 12, 26, 9).unwrap();
        assert_eq!(macd.macd.len(), closes.len());
        assert!(macd.macd[24].is_none());
        assert!(macd.macd[25].is_some());
        assert!(macd.signal[32].is_none());
        assert!(macd.signal[33].is_some());
        assert!(macd.diff[33].is_some());
    }
}
