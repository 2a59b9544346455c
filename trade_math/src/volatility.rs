//! Volatility indicator implementations
//!
//! Contains the Average True Range (ATR).

use crate::{MathError, Result};

/// Average True Range (ATR) implementation
#[derive(Debug, Clone)]
pub struct AverageTrueRange {
    period: usize,
    tr_sum: f64,
    previous_close: Option<f64>,
    current_atr: Option<f64>,
    values_seen: usize,
}

impl AverageTrueRange {
    /// Create a new ATR with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            tr_sum: 0.0,
            previous_close: None,
            current_atr: None,
            values_seen: 0,
        })
    }

    /// True range of a bar given the previous close, if any
    pub fn true_range(high: f64, low: f64, previous_close: Option<f64>) -> f64 {
        let high_low = high - low;
        match previous_close {
            Some(prev_close) => high_low
                .max((high - prev_close).abs())
                .max((low - prev_close).abs()),
            // First data point, TR is simply High - Low
            None => high_low,
        }
    }

    /// Update the ATR with new price data
    pub fn update(&mut self, high: f64, low: f64, close: f64) -> Result<()> {
        if low > high {
            return Err(MathError::InvalidInput(format!(
                "Low price ({}) cannot be greater than high price ({})",
                low, high
            )));
        }

        self.values_seen += 1;
        let true_range = Self::true_range(high, low, self.previous_close);

        match self.current_atr {
            // After first period: ATR = ((Prior ATR * (period - 1)) + Current TR) / period
            Some(prior_atr) => {
                self.current_atr =
                    Some((prior_atr * (self.period as f64 - 1.0) + true_range) / self.period as f64);
            }
            // First period: simple average of the true ranges
            None => {
                self.tr_sum += true_range;
                if self.values_seen == self.period {
                    self.current_atr = Some(self.tr_sum / self.period as f64);
                }
            }
        }

        self.previous_close = Some(close);

        Ok(())
    }

    /// Get the current ATR value
    pub fn value(&self) -> Result<f64> {
        self.current_atr.ok_or_else(|| {
            MathError::InsufficientData(format!(
                "Not enough data for ATR calculation. Need {} values, have {}.",
                self.period, self.values_seen
            ))
        })
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the ATR, clearing all values
    pub fn reset(&mut self) {
        self.tr_sum = 0.0;
        self.previous_close = None;
        self.current_atr = None;
        self.values_seen = 0;
    }
}

/// Run an ATR over aligned high/low/close slices, one reading per row
pub fn atr_series(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
) -> Result<Vec<Option<f64>>> {
    if highs.len() != lows.len() || lows.len() != closes.len() {
        return Err(MathError::InvalidInput(format!(
            "High/low/close lengths differ: {}/{}/{}",
            highs.len(),
            lows.len(),
            closes.len()
        )));
    }

    let mut atr = AverageTrueRange::new(period)?;
    let mut out = Vec::with_capacity(closes.len());

    for ((&high, &low), &close) in highs.iter().zip(lows).zip(closes) {
        atr.update(high, low, close)?;
        out.push(atr.value().ok());
    }

    Ok(out)
}
