//! The model bundle: regressor, scaler and the ordered feature names

use crate::error::{ForecastError, Result};
use crate::model::{Regressor, RegressorKind, StandardScaler};
use crate::DEFAULT_FEATURES;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{info, warn};

/// On-disk layout of a model bundle
#[derive(Debug, Serialize, Deserialize)]
struct ModelBundle {
    model: Option<RegressorKind>,
    #[serde(default)]
    scaler: Option<StandardScaler>,
    #[serde(default)]
    features: Vec<String>,
}

/// Trained regressor with its scaler and feature order.
///
/// Immutable once built. An artifact without a regressor still answers
/// `features()`, but every prediction fails with `ModelUnavailable`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    regressor: Option<RegressorKind>,
    scaler: StandardScaler,
    features: Vec<String>,
}

impl ModelArtifact {
    /// Assemble an artifact, checking the parts agree on the feature count
    pub fn new(
        regressor: RegressorKind,
        scaler: StandardScaler,
        features: Vec<String>,
    ) -> Result<Self> {
        if features.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Model needs at least one feature".to_string(),
            ));
        }
        if scaler.is_fitted() && scaler.n_features() != features.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "Scaler has {} features but the model lists {}",
                scaler.n_features(),
                features.len()
            )));
        }
        if regressor.n_features() > features.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "Regressor uses {} features but the model lists {}",
                regressor.n_features(),
                features.len()
            )));
        }

        Ok(Self {
            regressor: Some(regressor),
            scaler,
            features,
        })
    }

    /// No regressor, an unfitted scaler and the default feature list
    pub fn unloaded() -> Self {
        Self {
            regressor: None,
            scaler: StandardScaler::unfitted(),
            features: default_features(),
        }
    }

    /// Read a bundle, taking the scaler from `scaler_path` when the bundle
    /// has none
    pub fn load<P: AsRef<Path>>(model_path: P, scaler_path: Option<&Path>) -> Result<Self> {
        let model_path = model_path.as_ref();
        let bundle: ModelBundle = serde_json::from_reader(BufReader::new(File::open(model_path)?))?;

        let scaler = match bundle.scaler {
            Some(scaler) => scaler,
            None => load_scaler(scaler_path)?,
        };
        let features = if bundle.features.is_empty() {
            default_features()
        } else {
            bundle.features
        };

        let artifact = match bundle.model {
            Some(regressor) => Self::new(regressor, scaler, features)?,
            None => Self {
                regressor: None,
                scaler,
                features,
            },
        };

        info!(
            path = %model_path.display(),
            model = artifact.model_name().unwrap_or("none"),
            features = artifact.features.len(),
            "model loaded"
        );

        Ok(artifact)
    }

    /// Like [`ModelArtifact::load`], but an absent bundle file yields an
    /// unloaded artifact instead of an error
    pub fn load_or_unloaded<P: AsRef<Path>>(
        model_path: P,
        scaler_path: Option<&Path>,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        if model_path.exists() {
            return Self::load(model_path, scaler_path);
        }

        warn!(path = %model_path.display(), "model file not found; predictions disabled");
        Ok(Self {
            scaler: load_scaler(scaler_path)?,
            ..Self::unloaded()
        })
    }

    /// Write the bundle as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bundle = ModelBundle {
            model: self.regressor.clone(),
            scaler: Some(self.scaler.clone()),
            features: self.features.clone(),
        };
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &bundle)?;
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.regressor.is_some()
    }

    /// Ordered feature names the regressor was trained on
    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn regressor(&self) -> Option<&RegressorKind> {
        self.regressor.as_ref()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.regressor.as_ref().map(|r| r.name())
    }

    /// Scale `row` and run the regressor
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        let regressor = self.regressor.as_ref().ok_or(ForecastError::ModelUnavailable)?;
        let scaled = self.scaler.transform(row)?;
        let prediction = regressor.predict(&scaled)?;

        if !prediction.is_finite() {
            return Err(ForecastError::Computation(format!(
                "{} model produced a non-finite prediction",
                regressor.name()
            )));
        }

        Ok(prediction)
    }
}

fn default_features() -> Vec<String> {
    DEFAULT_FEATURES.iter().map(|s| s.to_string()).collect()
}

fn load_scaler(scaler_path: Option<&Path>) -> Result<StandardScaler> {
    match scaler_path {
        Some(path) if path.exists() => {
            let scaler = serde_json::from_reader(BufReader::new(File::open(path)?))?;
            info!(path = %path.display(), "scaler loaded");
            Ok(scaler)
        }
        _ => {
            warn!("scaler not found; using an unfitted scaler");
            Ok(StandardScaler::unfitted())
        }
    }
}
