//! Per-feature standardisation

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Centres each feature on its mean and divides by its standard deviation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Per-feature mean
    pub mean: Vec<f64>,
    /// Per-feature divisor
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// A scaler that has not seen any data; `transform` fails until fitted
    pub fn unfitted() -> Self {
        Self::default()
    }

    /// Scaler that leaves `n_features` values unchanged
    pub fn identity(n_features: usize) -> Self {
        Self {
            mean: vec![0.0; n_features],
            scale: vec![1.0; n_features],
        }
    }

    /// Fit on rows of equal length.
    ///
    /// Uses the population standard deviation; a constant feature gets a
    /// scale of 1.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let first = rows.first().ok_or_else(|| {
            ForecastError::InvalidParameter("Cannot fit a scaler on zero rows".to_string())
        })?;
        let n_features = first.len();
        if rows.iter().any(|row| row.len() != n_features) {
            return Err(ForecastError::InvalidParameter(
                "Scaler rows must have equal length".to_string(),
            ));
        }

        let column = |j: usize| rows.iter().map(move |row| row[j]);

        let mean: Vec<f64> = (0..n_features).map(|j| column(j).mean()).collect();
        let scale: Vec<f64> = (0..n_features)
            .map(|j| column(j).population_std_dev())
            .map(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s })
            .collect();

        Ok(Self { mean, scale })
    }

    pub fn is_fitted(&self) -> bool {
        !self.mean.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Standardise one row
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        if !self.is_fitted() {
            return Err(ForecastError::Computation(
                "StandardScaler instance is not fitted yet".to_string(),
            ));
        }
        if row.len() != self.mean.len() || self.scale.len() != self.mean.len() {
            return Err(ForecastError::Computation(format!(
                "Scaler was fitted on {} features, got {}",
                self.mean.len(),
                row.len()
            )));
        }

        Ok(row
            .iter()
            .zip(&self.mean)
            .zip(&self.scale)
            .map(|((x, m), s)| (x - m) / s)
            .collect())
    }
}
