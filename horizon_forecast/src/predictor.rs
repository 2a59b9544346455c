//! Single-step prediction from the latest complete feature row

use crate::bars::DailyBar;
use crate::error::{ForecastError, Result};
use crate::features::FeatureDeriver;
use crate::model::ModelArtifact;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Result of [`SingleStepPredictor::predict_latest`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestPrediction {
    /// Predicted close for the day after `date_used`, rounded to cents
    pub predicted_next_close: f64,
    /// Date of the feature row the prediction was made from
    pub date_used: Option<NaiveDate>,
    /// Model feature names, in the order they were fed
    pub features_used: Vec<String>,
}

/// Predicts the next close from the newest row with every feature present
#[derive(Debug, Clone, Copy)]
pub struct SingleStepPredictor<'a> {
    artifact: &'a ModelArtifact,
    deriver: FeatureDeriver,
}

impl<'a> SingleStepPredictor<'a> {
    pub fn new(artifact: &'a ModelArtifact, deriver: FeatureDeriver) -> Self {
        Self { artifact, deriver }
    }

    /// Predict from `history`, which must be date-ordered.
    ///
    /// Fails with `NoValidData` when no feature row is complete and with
    /// `MissingFeatures` when the model needs a column the table lacks.
    pub fn predict_latest(&self, history: &[DailyBar]) -> Result<LatestPrediction> {
        let table = self.deriver.derive(history);
        let row = table.last_complete_row().ok_or(ForecastError::NoValidData)?;

        let features = self.artifact.features();
        let missing = table.missing_columns(features);
        if !missing.is_empty() {
            return Err(ForecastError::MissingFeatures { names: missing });
        }

        let values = table.project(row, features)?;
        let prediction = self.artifact.predict(&values)?;
        let date_used = table.dates().get(row).copied();

        debug!(?date_used, prediction, "single-step prediction");

        Ok(LatestPrediction {
            predicted_next_close: round2(prediction),
            date_used,
            features_used: features.to_vec(),
        })
    }
}
