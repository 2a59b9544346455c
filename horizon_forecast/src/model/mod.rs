//! Regressors, feature scaling and the loadable model bundle

pub mod artifact;
pub mod forest;
pub mod linear;
pub mod scaler;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub use artifact::ModelArtifact;
pub use forest::{ForestRegressor, RegressionTree};
pub use linear::LinearRegressor;
pub use scaler::StandardScaler;

/// A point predictor over a scaled feature vector.
///
/// Implementations are read-only after construction, so one instance can
/// serve concurrent requests without locking.
pub trait Regressor: Debug + Send + Sync {
    /// Predict one value from one scaled feature row
    fn predict(&self, row: &[f64]) -> Result<f64>;

    /// Number of features the regressor expects
    fn n_features(&self) -> usize;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// The regressors a bundle can carry, tagged by `type` on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RegressorKind {
    Linear(LinearRegressor),
    Forest(ForestRegressor),
}

impl Regressor for RegressorKind {
    fn predict(&self, row: &[f64]) -> Result<f64> {
        match self {
            RegressorKind::Linear(model) => model.predict(row),
            RegressorKind::Forest(model) => model.predict(row),
        }
    }

    fn n_features(&self) -> usize {
        match self {
            RegressorKind::Linear(model) => model.n_features(),
            RegressorKind::Forest(model) => model.n_features(),
        }
    }

    fn name(&self) -> &str {
        match self {
            RegressorKind::Linear(model) => model.name(),
            RegressorKind::Forest(model) => model.name(),
        }
    }
}

impl From<LinearRegressor> for RegressorKind {
    fn from(model: LinearRegressor) -> Self {
        RegressorKind::Linear(model)
    }
}

impl From<ForestRegressor> for RegressorKind {
    fn from(model: ForestRegressor) -> Self {
        RegressorKind::Forest(model)
    }
}
