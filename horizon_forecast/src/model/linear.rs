//! Linear regression model

use crate::error::{ForecastError, Result};
use crate::model::Regressor;
use serde::{Deserialize, Serialize};

/// `intercept + coefficients . row`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    /// Constant term
    pub intercept: f64,
    /// One weight per feature, in feature order
    pub coefficients: Vec<f64>,
}

impl LinearRegressor {
    /// Create a new linear model
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Linear model needs at least one coefficient".to_string(),
            ));
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "Linear model parameters must be finite".to_string(),
            ));
        }

        Ok(Self {
            intercept,
            coefficients,
        })
    }

    /// Model that returns the feature at `index` unchanged
    pub fn selecting(index: usize, n_features: usize) -> Result<Self> {
        if index >= n_features {
            return Err(ForecastError::InvalidParameter(format!(
                "Feature index {} out of range for {} features",
                index, n_features
            )));
        }

        let mut coefficients = vec![0.0; n_features];
        coefficients[index] = 1.0;
        Self::new(0.0, coefficients)
    }
}

impl Regressor for LinearRegressor {
    fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.coefficients.len() {
            return Err(ForecastError::Computation(format!(
                "Linear model expects {} features, got {}",
                self.coefficients.len(),
                row.len()
            )));
        }

        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(w, x)| w * x)
                .sum::<f64>())
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn name(&self) -> &str {
        "linear"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_prediction() {
        let model = LinearRegressor::new(1.0, vec![2.0, -0.5]).unwrap();
        assert_relative_eq!(model.predict(&[3.0, 4.0]).unwrap(), 5.0);
        assert!(matches!(
            model.predict(&[1.0]),
            Err(ForecastError::Computation(_))
        ));
    }

    #[test]
    fn test_selecting() {
        let model = LinearRegressor::selecting(1, 3).unwrap();
        assert_relative_eq!(model.predict(&[9.0, 42.0, 7.0]).unwrap(), 42.0);
        assert!(LinearRegressor::selecting(3, 3).is_err());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(LinearRegressor::new(0.0, vec![]).is_err());
        assert!(LinearRegressor::new(f64::NAN, vec![1.0]).is_err());
    }
}
