//! Iterative multi-day forecasting
//!
//! Each step predicts one close from the last feature row, turns the
//! prediction into a synthesized bar, appends it to the working series and
//! re-derives the whole feature table. Rolling windows therefore see the
//! synthesized bars exactly the way training saw real ones.

use crate::bars::{normalize_history, DailyBar, WorkingSeries};
use crate::error::{ForecastError, Result};
use crate::features::{FeatureDeriver, FeatureTable};
use crate::model::ModelArtifact;
use crate::predictor::round2;
use crate::MAX_HORIZON;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

/// One forecast day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizonPoint {
    /// Serialised as `YYYY-MM-DD`
    pub date: NaiveDate,
    /// Predicted close, rounded to cents
    pub predicted_close: f64,
}

/// Forecast points plus the state they were produced from
#[derive(Debug, Clone)]
pub struct HorizonRun {
    pub points: Vec<HorizonPoint>,
    /// History followed by one synthesized bar per point
    pub series: WorkingSeries,
    /// Filled feature table of `series`
    pub table: FeatureTable,
}

/// Check `n` is within `1..=MAX_HORIZON`
pub fn validate_horizon(n: i64) -> Result<usize> {
    match usize::try_from(n) {
        Ok(steps) if (1..=MAX_HORIZON).contains(&steps) => Ok(steps),
        _ => Err(ForecastError::InvalidHorizon {
            requested: n,
            max: MAX_HORIZON,
        }),
    }
}

/// Drives repeated single-step predictions over a growing series
#[derive(Debug, Clone, Copy)]
pub struct HorizonForecaster<'a> {
    artifact: &'a ModelArtifact,
    deriver: FeatureDeriver,
}

impl<'a> HorizonForecaster<'a> {
    pub fn new(artifact: &'a ModelArtifact, deriver: FeatureDeriver) -> Self {
        Self { artifact, deriver }
    }

    /// Forecast the `n` days following the last date in `history`
    pub fn forecast(&self, history: &[DailyBar], n: i64) -> Result<Vec<HorizonPoint>> {
        self.run(history, n).map(|run| run.points)
    }

    /// Like [`HorizonForecaster::forecast`], also returning the extended
    /// series and its feature table
    pub fn run(&self, history: &[DailyBar], n: i64) -> Result<HorizonRun> {
        let steps = validate_horizon(n)?;
        let history = normalize_history(history.to_vec())?;
        let mut series = WorkingSeries::from_history(&history, steps);

        let mut table = self.filled_table(&series);

        let features = self.artifact.features();
        let missing = table.missing_columns(features);
        if !missing.is_empty() {
            return Err(ForecastError::MissingFeatures { names: missing });
        }

        let mut points = Vec::with_capacity(steps);

        for step in 1..=steps {
            let row = table
                .len()
                .checked_sub(1)
                .ok_or_else(|| ForecastError::InsufficientHistory {
                    step,
                    detail: "no rows to compute features from".to_string(),
                })?;

            let values = table.project(row, features).map_err(|err| match err {
                ForecastError::DataError(detail) => ForecastError::InsufficientHistory { step, detail },
                other => other,
            })?;

            let prediction = self.artifact.predict(&values)?;

            let prev = series.last().ok_or_else(|| ForecastError::InsufficientHistory {
                step,
                detail: "working series is empty".to_string(),
            })?;
            let date = prev.date.succ_opt().ok_or_else(|| {
                ForecastError::Computation(format!("No calendar day after {}", prev.date))
            })?;

            let bar = DailyBar::synthesize_after(prev, prediction, date);
            series.push(bar)?;
            table = self.filled_table(&series);

            debug!(step, %date, prediction, "horizon step");

            points.push(HorizonPoint {
                date,
                predicted_close: round2(prediction),
            });
        }

        info!(
            steps,
            history = history.len(),
            first = ?points.first().map(|p| p.date),
            "horizon forecast complete"
        );

        Ok(HorizonRun {
            points,
            series,
            table,
        })
    }

    fn filled_table(&self, series: &WorkingSeries) -> FeatureTable {
        let mut table = self.deriver.derive(series.bars());
        table.fill_forward_backward();
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_horizon() {
        assert_eq!(validate_horizon(1).unwrap(), 1);
        assert_eq!(validate_horizon(90).unwrap(), 90);
        for n in [-1, 0, 91, i64::MIN] {
            assert!(matches!(
                validate_horizon(n),
                Err(ForecastError::InvalidHorizon { requested, .. }) if requested == n
            ));
        }
    }
}
