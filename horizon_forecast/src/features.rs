//! Feature derivation: trailing-window indicator columns over daily bars
//!
//! [`FeatureDeriver::derive`] turns a date-ordered slice of [`DailyBar`]s into
//! a [`FeatureTable`] with one row per bar. A column whose window is not yet
//! full holds `None` for that row; rows are never dropped. Filling the gaps
//! is left to the caller ([`FeatureTable::fill_forward_backward`]).
//!
//! The oscillator columns (`rsi14`, `macd`, `macd_signal`, `macd_diff`,
//! `atr14`) need the `indicators` cargo feature. Query
//! [`FeatureDeriver::supports_oscillators`] before relying on them.

use crate::bars::DailyBar;
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use polars::prelude::*;
use statrs::statistics::Statistics;
use std::fs::File;
use std::path::Path;
use tracing::warn;

/// Close moving-average windows
pub const MA_WINDOWS: [usize; 5] = [7, 30, 50, 100, 200];
/// Close rolling standard deviation windows
pub const VOLATILITY_WINDOWS: [usize; 2] = [7, 30];
/// Rate-of-change lookbacks
pub const ROC_PERIODS: [usize; 2] = [5, 10];

pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

const BASE_COLUMNS: [&str; 17] = [
    "open",
    "high",
    "low",
    "close",
    "Volume BTC",
    "volume_btc",
    "MA7",
    "MA30",
    "MA50",
    "MA100",
    "MA200",
    "volatility7",
    "volatility30",
    "lag1_close",
    "day_of_week",
    "roc5",
    "roc10",
];

const OSCILLATOR_COLUMNS: [&str; 5] = ["rsi14", "macd", "macd_signal", "macd_diff", "atr14"];

/// Derives the feature table from daily bars
#[derive(Debug, Clone, Copy)]
pub struct FeatureDeriver {
    oscillators: bool,
}

impl Default for FeatureDeriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureDeriver {
    /// Deriver producing every column this build supports
    pub fn new() -> Self {
        Self {
            oscillators: cfg!(feature = "indicators"),
        }
    }

    /// Deriver that only produces the rolling and calendar columns
    pub fn without_oscillators() -> Self {
        Self { oscillators: false }
    }

    /// Whether `derive` will attempt the RSI, MACD and ATR columns
    pub fn supports_oscillators(&self) -> bool {
        self.oscillators && cfg!(feature = "indicators")
    }

    /// Columns `derive` emits, in table order
    pub fn column_names(&self) -> Vec<&'static str> {
        let mut names = BASE_COLUMNS.to_vec();
        if self.supports_oscillators() {
            names.extend(OSCILLATOR_COLUMNS);
        }
        names
    }

    /// Compute every feature column over `bars`, which must be date-ordered
    pub fn derive(&self, bars: &[DailyBar]) -> FeatureTable {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let mut columns: IndexMap<String, Vec<Option<f64>>> = IndexMap::new();

        columns.insert("open".into(), bars.iter().map(|b| Some(b.open)).collect());
        columns.insert("high".into(), bars.iter().map(|b| Some(b.high)).collect());
        columns.insert("low".into(), bars.iter().map(|b| Some(b.low)).collect());
        columns.insert("close".into(), closes.iter().copied().map(Some).collect());

        // Both aliases carry the same values; zero when no bar had a volume
        let volume: Vec<Option<f64>> = if bars.iter().any(|b| b.volume.is_some()) {
            bars.iter().map(|b| b.volume).collect()
        } else {
            vec![Some(0.0); bars.len()]
        };
        columns.insert("Volume BTC".into(), volume.clone());
        columns.insert("volume_btc".into(), volume);

        for window in MA_WINDOWS {
            columns.insert(format!("MA{}", window), rolling_mean(&closes, window));
        }
        for window in VOLATILITY_WINDOWS {
            columns.insert(format!("volatility{}", window), rolling_std(&closes, window));
        }

        columns.insert("lag1_close".into(), lag(&closes, 1));
        columns.insert(
            "day_of_week".into(),
            bars.iter()
                .map(|b| Some(b.date.weekday().num_days_from_monday() as f64))
                .collect(),
        );

        for period in ROC_PERIODS {
            columns.insert(format!("roc{}", period), rate_of_change(&closes, period));
        }

        let mut has_oscillators = false;
        if self.supports_oscillators() {
            match oscillator_columns(bars) {
                Ok(oscillators) => {
                    columns.extend(oscillators);
                    has_oscillators = true;
                }
                Err(err) => {
                    warn!(error = %err, "oscillator columns omitted");
                }
            }
        }

        FeatureTable {
            dates: bars.iter().map(|b| b.date).collect(),
            columns,
            has_oscillators,
        }
    }
}

#[cfg(feature = "indicators")]
fn oscillator_columns(bars: &[DailyBar]) -> Result<Vec<(String, Vec<Option<f64>>)>> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

    let rsi = trade_math::rsi_series(&closes, RSI_PERIOD)?;
    let macd = trade_math::macd_series(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL)?;
    let atr = trade_math::atr_series(&highs, &lows, &closes, ATR_PERIOD)?;

    Ok(vec![
        ("rsi14".to_string(), rsi),
        ("macd".to_string(), macd.macd),
        ("macd_signal".to_string(), macd.signal),
        ("macd_diff".to_string(), macd.diff),
        ("atr14".to_string(), atr),
    ])
}

#[cfg(not(feature = "indicators"))]
fn oscillator_columns(_bars: &[DailyBar]) -> Result<Vec<(String, Vec<Option<f64>>)>> {
    Err(ForecastError::Computation(
        "built without the indicators feature".to_string(),
    ))
}

/// Trailing mean; `None` until `window` values exist
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().mean())
}

/// Trailing sample standard deviation (n - 1 denominator)
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().std_dev())
}

fn rolling(values: &[f64], window: usize, stat: impl Fn(&[f64]) -> f64) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                Some(stat(&values[i + 1 - window..=i])).filter(|v| v.is_finite())
            }
        })
        .collect()
}

/// Value `periods` rows earlier
pub fn lag(values: &[f64], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| i.checked_sub(periods).map(|j| values[j]))
        .collect()
}

/// Fractional change over `periods` rows; `None` when the base is zero
pub fn rate_of_change(values: &[f64], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            let base = values[i.checked_sub(periods)?];
            if base == 0.0 {
                None
            } else {
                Some(values[i] / base - 1.0)
            }
        })
        .collect()
}

/// Date-aligned feature columns, in derivation order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    dates: Vec<NaiveDate>,
    columns: IndexMap<String, Vec<Option<f64>>>,
    has_oscillators: bool,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    /// Whether the RSI, MACD and ATR columns are present
    pub fn has_oscillators(&self) -> bool {
        self.has_oscillators
    }

    /// Names from `required` with no column in this table, in the given order
    pub fn missing_columns<S: AsRef<str>>(&self, required: &[S]) -> Vec<String> {
        required
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| !self.columns.contains_key(*name))
            .map(str::to_string)
            .collect()
    }

    /// Forward-fill every column, then backward-fill what is still missing.
    ///
    /// A column that is missing in every row stays missing.
    pub fn fill_forward_backward(&mut self) {
        for values in self.columns.values_mut() {
            let mut last = None;
            for value in values.iter_mut() {
                match value {
                    Some(v) => last = Some(*v),
                    None => *value = last,
                }
            }

            let mut next = None;
            for value in values.iter_mut().rev() {
                match value {
                    Some(v) => next = Some(*v),
                    None => *value = next,
                }
            }
        }
    }

    /// Index of the last row with a value in every column
    pub fn last_complete_row(&self) -> Option<usize> {
        (0..self.len())
            .rev()
            .find(|&row| self.columns.values().all(|values| values[row].is_some()))
    }

    /// The values of `names` at `row`, in the order given
    pub fn project<S: AsRef<str>>(&self, row: usize, names: &[S]) -> Result<Vec<f64>> {
        let missing = self.missing_columns(names);
        if !missing.is_empty() {
            return Err(ForecastError::MissingFeatures { names: missing });
        }
        if row >= self.len() {
            return Err(ForecastError::DataError(format!(
                "Row {} out of range for a table of {} rows",
                row,
                self.len()
            )));
        }

        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.columns[name][row].ok_or_else(|| {
                    ForecastError::DataError(format!(
                        "Feature '{}' has no value on {}",
                        name, self.dates[row]
                    ))
                })
            })
            .collect()
    }

    /// Keep only the rows with a value in every column
    pub fn drop_incomplete(&self) -> FeatureTable {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&row| self.columns.values().all(|values| values[row].is_some()))
            .collect();

        FeatureTable {
            dates: keep.iter().map(|&row| self.dates[row]).collect(),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), keep.iter().map(|&row| values[row]).collect()))
                .collect(),
            has_oscillators: self.has_oscillators,
        }
    }

    /// Write the table as CSV with a leading `date` column
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut series = Vec::with_capacity(self.columns.len() + 1);
        series.push(Series::new(
            "date",
            self.dates
                .iter()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .collect::<Vec<String>>(),
        ));
        for (name, values) in &self.columns {
            series.push(Series::new(name, values.as_slice()));
        }

        let mut df = DataFrame::new(series)?;
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file).has_header(true).finish(&mut df)?;

        Ok(())
    }
}
