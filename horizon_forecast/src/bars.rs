//! Daily and minute price bars, and the working series grown during a forecast

use crate::error::{ForecastError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One day's OHLCV summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// Calendar date of the bar
    pub date: NaiveDate,
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
    /// Traded volume, if the source had a volume column
    pub volume: Option<f64>,
}

impl DailyBar {
    /// Create a new daily bar
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: Option<f64>) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Fabricate the bar that follows `prev` from a single predicted close.
    ///
    /// Open is the previous close, high and low stretch the previous extremes
    /// to include the prediction, and volume is carried forward (zero when the
    /// previous bar had none).
    pub fn synthesize_after(prev: &DailyBar, predicted_close: f64, date: NaiveDate) -> Self {
        Self {
            date,
            open: prev.close,
            high: prev.high.max(predicted_close),
            low: prev.low.min(predicted_close),
            close: predicted_close,
            volume: Some(prev.volume.unwrap_or(0.0)),
        }
    }
}

/// Minute-level bar, the raw input of the daily resampler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinuteBar {
    /// Timestamp of the bar
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

/// Sort bars by date and enforce one bar per date
pub fn normalize_history(mut bars: Vec<DailyBar>) -> Result<Vec<DailyBar>> {
    bars.sort_by_key(|bar| bar.date);

    if let Some(pair) = bars.windows(2).find(|pair| pair[0].date == pair[1].date) {
        return Err(ForecastError::DataError(format!(
            "Duplicate bar for date {}",
            pair[0].date
        )));
    }

    Ok(bars)
}

/// Append-only copy of history extended with synthesized bars.
///
/// Each horizon forecast owns one; it is never shared or persisted.
#[derive(Debug, Clone, Default)]
pub struct WorkingSeries {
    bars: Vec<DailyBar>,
}

impl WorkingSeries {
    /// Copy `history` into a new working series
    pub fn from_history(history: &[DailyBar], extra_capacity: usize) -> Self {
        let mut bars = Vec::with_capacity(history.len() + extra_capacity);
        bars.extend_from_slice(history);
        Self { bars }
    }

    /// Append a bar; dates must keep increasing
    pub fn push(&mut self, bar: DailyBar) -> Result<()> {
        if let Some(last) = self.bars.last() {
            if bar.date <= last.date {
                return Err(ForecastError::DataError(format!(
                    "Bar dated {} does not follow {}",
                    bar.date, last.date
                )));
            }
        }
        self.bars.push(bar);
        Ok(())
    }

    pub fn last(&self) -> Option<&DailyBar> {
        self.bars.last()
    }

    pub fn bars(&self) -> &[DailyBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Consume the series, returning its bars
    pub fn into_bars(self) -> Vec<DailyBar> {
        self.bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    #[test]
    fn test_synthesize_after() {
        let prev = DailyBar::new(day(1), 100.0, 110.0, 95.0, 105.0, None);

        let up = DailyBar::synthesize_after(&prev, 120.0, day(2));
        assert_eq!(up.open, 105.0);
        assert_eq!(up.high, 120.0);
        assert_eq!(up.low, 95.0);
        assert_eq!(up.close, 120.0);
        assert_eq!(up.volume, Some(0.0));

        let down = DailyBar::synthesize_after(&up, 90.0, day(3));
        assert_eq!(down.high, 120.0);
        assert_eq!(down.low, 90.0);
        assert!(down.high >= down.close && down.close >= down.low);
    }

    #[test]
    fn test_synthesize_carries_volume() {
        let prev = DailyBar::new(day(1), 1.0, 2.0, 0.5, 1.5, Some(42.0));
        let next = DailyBar::synthesize_after(&prev, 1.6, day(2));
        assert_eq!(next.volume, Some(42.0));
    }

    #[test]
    fn test_normalize_history() {
        let bars = vec![
            DailyBar::new(day(3), 1.0, 1.0, 1.0, 3.0, None),
            DailyBar::new(day(1), 1.0, 1.0, 1.0, 1.0, None),
            DailyBar::new(day(2), 1.0, 1.0, 1.0, 2.0, None),
        ];
        let sorted = normalize_history(bars).unwrap();
        let closes: Vec<f64> = sorted.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);

        let dup = vec![
            DailyBar::new(day(1), 1.0, 1.0, 1.0, 1.0, None),
            DailyBar::new(day(1), 1.0, 1.0, 1.0, 2.0, None),
        ];
        assert!(matches!(
            normalize_history(dup),
            Err(ForecastError::DataError(_))
        ));
    }

    #[test]
    fn test_working_series_rejects_out_of_order() {
        let history = vec![DailyBar::new(day(2), 1.0, 1.0, 1.0, 1.0, None)];
        let mut series = WorkingSeries::from_history(&history, 1);

        assert!(series
            .push(DailyBar::new(day(1), 1.0, 1.0, 1.0, 1.0, None))
            .is_err());
        series
            .push(DailyBar::new(day(3), 1.0, 1.0, 1.0, 1.0, None))
            .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.last().unwrap().date, day(3));
    }
}
