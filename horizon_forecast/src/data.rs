//! Price history loading and minute-to-daily resampling

use crate::bars::{DailyBar, MinuteBar};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// Volume column names in order of preference
const VOLUME_ALIASES: [&str; 3] = ["Volume BTC", "volume_btc", "volume"];

/// Rows polars inspects when inferring column types
const SCHEMA_INFERENCE_ROWS: usize = 1000;

/// Tabular price history with its detected columns
#[derive(Debug, Clone)]
pub struct TimeSeriesData {
    /// Data frame containing the raw rows
    df: DataFrame,
    /// Name of the time column
    time_column: String,
    /// Names of the price columns, in open/high/low/close order
    price_columns: [String; 4],
    /// Name of the volume column
    volume_column: Option<String>,
}

/// Data loader for price history files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load price history from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<TimeSeriesData> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(Some(SCHEMA_INFERENCE_ROWS))
            .has_header(true)
            .finish()?;

        debug!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded csv"
        );

        Self::from_dataframe(df)
    }

    /// Detect the time, price and volume columns of an existing DataFrame
    pub fn from_dataframe(df: DataFrame) -> Result<TimeSeriesData> {
        let time_column = Self::detect_time_column(&df)?;
        let price_columns = Self::detect_price_columns(&df)?;
        let volume_column = Self::detect_volume_column(&df);

        Ok(TimeSeriesData {
            df,
            time_column,
            price_columns,
            volume_column,
        })
    }

    /// Detect the time column in a DataFrame
    fn detect_time_column(df: &DataFrame) -> Result<String> {
        let column_names = df.get_column_names();

        // An exact "date" column wins over e.g. a unix "timestamp"
        if let Some(name) = column_names.iter().find(|n| n.eq_ignore_ascii_case("date")) {
            return Ok(name.to_string());
        }

        for name in &column_names {
            let lower_name = name.to_lowercase();
            if lower_name.contains("date") || lower_name.contains("time") {
                return Ok(name.to_string());
            }
        }

        if let Some(first_col) = df.get_columns().first() {
            if first_col.dtype().is_temporal() {
                return Ok(first_col.name().to_string());
            }
        }

        Err(ForecastError::DataError(
            "No time column found in data".to_string(),
        ))
    }

    /// Detect the open/high/low/close columns in a DataFrame
    fn detect_price_columns(df: &DataFrame) -> Result<[String; 4]> {
        let column_names = df.get_column_names();

        let find = |required: &str| -> Result<String> {
            column_names
                .iter()
                .find(|name| name.eq_ignore_ascii_case(required))
                .or_else(|| {
                    column_names
                        .iter()
                        .find(|name| name.to_lowercase().contains(required))
                })
                .map(|name| name.to_string())
                .ok_or_else(|| {
                    ForecastError::DataError(format!("No '{}' column found in data", required))
                })
        };

        Ok([find("open")?, find("high")?, find("low")?, find("close")?])
    }

    /// Detect the volume column in a DataFrame
    fn detect_volume_column(df: &DataFrame) -> Option<String> {
        let column_names = df.get_column_names();

        for alias in VOLUME_ALIASES {
            if let Some(name) = column_names.iter().find(|n| n.eq_ignore_ascii_case(alias)) {
                return Some(name.to_string());
            }
        }

        column_names
            .iter()
            .find(|name| name.to_lowercase().contains("volume"))
            .map(|name| name.to_string())
    }
}

impl TimeSeriesData {
    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Get the time column name
    pub fn time_column(&self) -> &str {
        &self.time_column
    }

    /// Get the open/high/low/close column names
    pub fn price_columns(&self) -> &[String; 4] {
        &self.price_columns
    }

    /// Get the volume column name
    pub fn volume_column(&self) -> Option<&str> {
        self.volume_column.as_deref()
    }

    /// Check if the time series is empty
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Get the number of rows
    pub fn len(&self) -> usize {
        self.df.height()
    }

    /// Convert rows to daily bars.
    ///
    /// Rows with a missing or non-finite price are skipped. The result keeps
    /// file order; see [`crate::bars::normalize_history`].
    pub fn to_daily_bars(&self) -> Result<Vec<DailyBar>> {
        let timestamps = self.column_as_text(&self.time_column)?;
        let rows = self.price_rows()?;

        let mut bars = Vec::with_capacity(rows.len());
        let mut skipped = 0usize;

        for (raw_time, row) in timestamps.iter().zip(rows) {
            let Some(raw_time) = raw_time else {
                skipped += 1;
                continue;
            };
            let date = parse_date(raw_time)?;
            match row {
                Some((open, high, low, close, volume)) => {
                    bars.push(DailyBar::new(date, open, high, low, close, volume))
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(skipped, "skipped rows with missing prices");
        }

        Ok(bars)
    }

    /// Convert rows to timestamped minute bars
    pub fn to_minute_bars(&self) -> Result<Vec<MinuteBar>> {
        let timestamps = self.column_as_text(&self.time_column)?;
        let rows = self.price_rows()?;

        let mut bars = Vec::with_capacity(rows.len());
        let mut skipped = 0usize;

        for (raw_time, row) in timestamps.iter().zip(rows) {
            match (raw_time, row) {
                (Some(raw_time), Some((open, high, low, close, volume))) => {
                    bars.push(MinuteBar {
                        timestamp: parse_timestamp(raw_time)?,
                        open,
                        high,
                        low,
                        close,
                        volume,
                    })
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(skipped, "skipped rows with missing prices");
        }

        Ok(bars)
    }

    /// OHLC plus volume per row, `None` where any price is unusable
    #[allow(clippy::type_complexity)]
    fn price_rows(&self) -> Result<Vec<Option<(f64, f64, f64, f64, Option<f64>)>>> {
        let [open_col, high_col, low_col, close_col] = &self.price_columns;
        let opens = self.column_as_f64(open_col)?;
        let highs = self.column_as_f64(high_col)?;
        let lows = self.column_as_f64(low_col)?;
        let closes = self.column_as_f64(close_col)?;
        let volumes = match &self.volume_column {
            Some(col) => self.column_as_f64(col)?,
            None => vec![None; self.len()],
        };

        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());

        Ok((0..self.len())
            .map(|i| {
                Some((
                    finite(opens[i])?,
                    finite(highs[i])?,
                    finite(lows[i])?,
                    finite(closes[i])?,
                    finite(volumes[i]),
                ))
            })
            .collect())
    }

    /// Helper method to get a column as f64 values, nulls kept in place
    fn column_as_f64(&self, column_name: &str) -> Result<Vec<Option<f64>>> {
        let col = self.df.column(column_name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", column_name, e))
        })?;

        let cast = col.cast(&DataType::Float64).map_err(|e| {
            ForecastError::DataError(format!(
                "Column '{}' cannot be converted to f64: {}",
                column_name, e
            ))
        })?;

        Ok(cast.f64()?.into_iter().collect())
    }

    /// Helper method to get a column rendered as text
    fn column_as_text(&self, column_name: &str) -> Result<Vec<Option<String>>> {
        let col = self.df.column(column_name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", column_name, e))
        })?;

        let cast = col.cast(&DataType::Utf8)?;
        Ok(cast
            .utf8()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect())
    }
}

/// Aggregate minute bars into one bar per calendar day (UTC).
///
/// open = first, high = max, low = min, close = last, volume = sum. Days
/// without minute bars are absent from the output.
pub fn resample_daily(minute_bars: &[MinuteBar]) -> Vec<DailyBar> {
    let mut sorted: Vec<&MinuteBar> = minute_bars.iter().collect();
    sorted.sort_by_key(|bar| bar.timestamp);

    let mut daily: Vec<DailyBar> = Vec::new();

    for bar in sorted {
        let date = bar.timestamp.date_naive();
        match daily.last_mut() {
            Some(day) if day.date == date => {
                day.high = day.high.max(bar.high);
                day.low = day.low.min(bar.low);
                day.close = bar.close;
                day.volume = match (day.volume, bar.volume) {
                    (Some(total), Some(v)) => Some(total + v),
                    (total, v) => total.or(v),
                };
            }
            _ => daily.push(DailyBar::new(
                date, bar.open, bar.high, bar.low, bar.close, bar.volume,
            )),
        }
    }

    daily
}

fn parse_naive_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a date cell: `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or RFC 3339
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    parse_naive_datetime(raw)
        .map(|dt| dt.date())
        .ok_or_else(|| ForecastError::DataError(format!("Unrecognised date '{}'", raw)))
}

/// Parse a timestamp cell, treating naive values as UTC
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    parse_naive_datetime(raw)
        .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
        .ok_or_else(|| ForecastError::DataError(format!("Unrecognised timestamp '{}'", raw)))
}
