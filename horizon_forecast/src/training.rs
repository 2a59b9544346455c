//! Offline ridge-regression training producing a [`ModelArtifact`]
//!
//! [`RidgeTrainer`] fits one penalty. [`ModelSelector`] cross-validates a set
//! of penalties over expanding time-series folds, keeps the one with the
//! lowest mean RMSE and refits it on every row.

use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use crate::metrics::RegressionMetrics;
use crate::model::{LinearRegressor, ModelArtifact, Regressor, StandardScaler};
use chrono::NaiveDate;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::ops::Range;
use tracing::{info, warn};

/// Folds used by [`ModelSelector`] unless told otherwise
pub const DEFAULT_SPLITS: usize = 5;

/// Ridge penalties compared by default
pub const DEFAULT_ALPHAS: [f64; 5] = [0.01, 0.1, 1.0, 10.0, 100.0];

/// Feature rows paired with the next day's close
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    pub features: Vec<String>,
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl TrainingSet {
    /// Build from a feature table. The last row has no target and rows with a
    /// missing feature are skipped.
    pub fn from_table<S: AsRef<str>>(table: &FeatureTable, features: &[S]) -> Result<Self> {
        let missing = table.missing_columns(features);
        if !missing.is_empty() {
            return Err(ForecastError::MissingFeatures { names: missing });
        }
        let closes = table
            .column("close")
            .ok_or_else(|| ForecastError::MissingFeatures {
                names: vec!["close".to_string()],
            })?;

        let mut set = Self {
            features: features.iter().map(|f| f.as_ref().to_string()).collect(),
            dates: Vec::new(),
            rows: Vec::new(),
            targets: Vec::new(),
        };

        for row in 0..table.len().saturating_sub(1) {
            let (Ok(values), Some(target)) = (table.project(row, features), closes[row + 1]) else {
                continue;
            };
            set.dates.push(table.dates()[row]);
            set.rows.push(values);
            set.targets.push(target);
        }

        if set.rows.is_empty() {
            return Err(ForecastError::NoValidData);
        }

        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Outcome of [`RidgeTrainer::fit`]
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// Model refit on every row
    pub artifact: ModelArtifact,
    /// Hold-out metrics of the model fit on the training split
    pub metrics: Option<RegressionMetrics>,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Features by absolute standardised coefficient, largest first
    pub importances: Vec<FeatureWeight>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureWeight {
    pub feature: String,
    pub weight: f64,
}

/// Closed-form ridge regression on standardised features
#[derive(Debug, Clone, Copy)]
pub struct RidgeTrainer {
    alpha: f64,
    test_ratio: f64,
}

impl Default for RidgeTrainer {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            test_ratio: 0.2,
        }
    }
}

impl RidgeTrainer {
    /// Create a trainer with L2 penalty `alpha` and a chronological hold-out
    /// of `test_ratio`
    pub fn new(alpha: f64, test_ratio: f64) -> Result<Self> {
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "alpha must be a non-negative number, got {}",
                alpha
            )));
        }
        if !(0.0..1.0).contains(&test_ratio) {
            return Err(ForecastError::InvalidParameter(format!(
                "test_ratio must be in [0, 1), got {}",
                test_ratio
            )));
        }
        Ok(Self { alpha, test_ratio })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn test_ratio(&self) -> f64 {
        self.test_ratio
    }

    /// Label used in selection reports
    pub fn name(&self) -> String {
        format!("ridge(alpha={})", self.alpha)
    }

    /// Mean fold metrics over `n_splits` expanding-window folds.
    ///
    /// The scaler is fitted on every row once, then each fold trains on the
    /// rows before its test block.
    pub fn cross_validate(&self, set: &TrainingSet, n_splits: usize) -> Result<CandidateScore> {
        let splits = time_series_splits(set.len(), n_splits)?;
        let (_, scaled) = scale_rows(set)?;

        let mut folds = Vec::with_capacity(splits.len());
        for (train, test) in splits {
            let model = self.solve(&scaled[train.clone()], &set.targets[train])?;
            let predictions = scaled[test.clone()]
                .iter()
                .map(|row| model.predict(row))
                .collect::<Result<Vec<_>>>()?;
            folds.push(RegressionMetrics::evaluate(&predictions, &set.targets[test])?);
        }

        Ok(CandidateScore {
            name: self.name(),
            alpha: self.alpha,
            mae_mean: folds.iter().map(|m| m.mae).mean(),
            rmse_mean: folds.iter().map(|m| m.rmse).mean(),
            r2_mean: folds.iter().map(|m| m.r2).mean(),
        })
    }

    pub fn fit(&self, set: &TrainingSet) -> Result<TrainingReport> {
        if set.len() < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Need at least 2 training rows, got {}",
                set.len()
            )));
        }

        let (scaler, scaled) = scale_rows(set)?;

        let train_rows = ((set.len() as f64) * (1.0 - self.test_ratio)) as usize;
        let train_rows = train_rows.clamp(1, set.len());
        let test_rows = set.len() - train_rows;

        let metrics = if test_rows > 0 {
            let model = self.solve(&scaled[..train_rows], &set.targets[..train_rows])?;
            let predictions = scaled[train_rows..]
                .iter()
                .map(|row| model.predict(row))
                .collect::<Result<Vec<_>>>()?;
            Some(RegressionMetrics::evaluate(
                &predictions,
                &set.targets[train_rows..],
            )?)
        } else {
            None
        };

        let model = self.solve(&scaled, &set.targets)?;

        let mut importances: Vec<FeatureWeight> = set
            .features
            .iter()
            .zip(&model.coefficients)
            .map(|(feature, &weight)| FeatureWeight {
                feature: feature.clone(),
                weight,
            })
            .collect();
        importances.sort_by(|a, b| b.weight.abs().total_cmp(&a.weight.abs()));

        if let Some(m) = &metrics {
            info!(mae = m.mae, rmse = m.rmse, r2 = m.r2, train_rows, test_rows, "ridge hold-out");
        }

        Ok(TrainingReport {
            artifact: ModelArtifact::new(model.into(), scaler, set.features.clone())?,
            metrics,
            train_rows,
            test_rows,
            importances,
        })
    }

    /// Solve `(X'X + alpha * D) b = X'y` with an unpenalised intercept
    fn solve(&self, rows: &[Vec<f64>], targets: &[f64]) -> Result<LinearRegressor> {
        let p = rows.first().map(Vec::len).unwrap_or(0) + 1;
        let mut gram = vec![vec![0.0; p]; p];
        let mut rhs = vec![0.0; p];

        for (row, &y) in rows.iter().zip(targets) {
            let x: Vec<f64> = std::iter::once(1.0).chain(row.iter().copied()).collect();
            for i in 0..p {
                rhs[i] += x[i] * y;
                for j in 0..p {
                    gram[i][j] += x[i] * x[j];
                }
            }
        }
        for (i, gram_row) in gram.iter_mut().enumerate().skip(1) {
            gram_row[i] += self.alpha;
        }

        let solution = solve_linear_system(gram, rhs)?;
        LinearRegressor::new(solution[0], solution[1..].to_vec())
    }
}

fn scale_rows(set: &TrainingSet) -> Result<(StandardScaler, Vec<Vec<f64>>)> {
    let scaler = StandardScaler::fit(&set.rows)?;
    let scaled = set
        .rows
        .iter()
        .map(|row| scaler.transform(row))
        .collect::<Result<Vec<_>>>()?;
    Ok((scaler, scaled))
}

/// Expanding-window folds over `n_rows` chronologically ordered rows.
///
/// Every test block holds `n_rows / (n_splits + 1)` rows and the last one ends
/// at `n_rows`; fold `k` trains on every row before its test block.
pub fn time_series_splits(
    n_rows: usize,
    n_splits: usize,
) -> Result<Vec<(Range<usize>, Range<usize>)>> {
    if n_splits < 2 {
        return Err(ForecastError::InvalidParameter(format!(
            "Need at least 2 folds, got {}",
            n_splits
        )));
    }
    let test_size = n_rows / (n_splits + 1);
    if test_size == 0 {
        return Err(ForecastError::InvalidParameter(format!(
            "{} folds need more than {} rows, got {}",
            n_splits, n_splits, n_rows
        )));
    }

    Ok((0..n_splits)
        .map(|k| {
            let train_end = n_rows - (n_splits - k) * test_size;
            (0..train_end, train_end..train_end + test_size)
        })
        .collect())
}

/// Cross-validated metrics of one candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    pub name: String,
    pub alpha: f64,
    pub mae_mean: f64,
    pub rmse_mean: f64,
    pub r2_mean: f64,
}

/// Outcome of [`ModelSelector::select`]
#[derive(Debug, Clone)]
pub struct SelectionReport {
    /// Scores of the candidates that could be evaluated, in candidate order
    pub candidates: Vec<CandidateScore>,
    /// Name of the winning candidate
    pub best: String,
    /// The winner refit on every row
    pub report: TrainingReport,
}

/// Picks the ridge penalty with the lowest cross-validated RMSE
#[derive(Debug, Clone)]
pub struct ModelSelector {
    candidates: Vec<RidgeTrainer>,
    n_splits: usize,
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_ALPHAS
                .iter()
                .map(|&alpha| RidgeTrainer {
                    alpha,
                    ..RidgeTrainer::default()
                })
                .collect(),
            n_splits: DEFAULT_SPLITS,
        }
    }
}

impl ModelSelector {
    /// One ridge candidate per alpha, each keeping a `test_ratio` hold-out
    /// for its final report
    pub fn new(alphas: &[f64], test_ratio: f64, n_splits: usize) -> Result<Self> {
        if alphas.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Need at least one candidate alpha".to_string(),
            ));
        }
        if n_splits < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Need at least 2 folds, got {}",
                n_splits
            )));
        }

        let candidates = alphas
            .iter()
            .map(|&alpha| RidgeTrainer::new(alpha, test_ratio))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            candidates,
            n_splits,
        })
    }

    pub fn candidates(&self) -> &[RidgeTrainer] {
        &self.candidates
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Cross-validate every candidate, then refit the winner on all rows.
    ///
    /// A candidate whose folds fail (e.g. singular normal equations) is
    /// skipped with a warning.
    pub fn select(&self, set: &TrainingSet) -> Result<SelectionReport> {
        time_series_splits(set.len(), self.n_splits)?;

        let mut scores = Vec::with_capacity(self.candidates.len());
        let mut best: Option<(RidgeTrainer, f64)> = None;

        for trainer in &self.candidates {
            match trainer.cross_validate(set, self.n_splits) {
                Ok(score) => {
                    info!(
                        candidate = %score.name,
                        mae = score.mae_mean,
                        rmse = score.rmse_mean,
                        r2 = score.r2_mean,
                        "cross-validated"
                    );
                    if best.map_or(true, |(_, rmse)| score.rmse_mean < rmse) {
                        best = Some((*trainer, score.rmse_mean));
                    }
                    scores.push(score);
                }
                Err(err) => {
                    warn!(candidate = %trainer.name(), error = %err, "candidate skipped");
                }
            }
        }

        let (winner, _) = best.ok_or_else(|| {
            ForecastError::Computation("No candidate could be cross-validated".to_string())
        })?;
        info!(best = %winner.name(), "selected");

        Ok(SelectionReport {
            candidates: scores,
            best: winner.name(),
            report: winner.fit(set)?,
        })
    }
}

/// Gaussian elimination with partial pivoting
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < 1e-12 {
            return Err(ForecastError::Computation(
                "Normal equations are singular; try a larger alpha".to_string(),
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    Ok(x)
}
