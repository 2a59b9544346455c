//! Read-only context shared by every request

use anyhow::{Context, Result};
use horizon_forecast::{normalize_history, DailyBar, DataLoader, FeatureDeriver, ModelArtifact};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ServiceConfig;

/// Model, history and deriver loaded once at startup and never mutated
#[derive(Debug, Clone)]
pub struct AppContext {
    pub artifact: ModelArtifact,
    pub history: Vec<DailyBar>,
    pub deriver: FeatureDeriver,
}

pub type SharedContext = Arc<AppContext>;

impl AppContext {
    pub fn new(artifact: ModelArtifact, history: Vec<DailyBar>, deriver: FeatureDeriver) -> Self {
        Self {
            artifact,
            history,
            deriver,
        }
    }

    /// Load the history and model named by `config`.
    ///
    /// A missing history file is an error; a missing model bundle only
    /// disables predictions.
    pub fn load(config: &ServiceConfig) -> Result<Self> {
        if !config.data_path.exists() {
            anyhow::bail!("Data file not found at {}", config.data_path.display());
        }

        let data = DataLoader::from_csv(&config.data_path)
            .with_context(|| format!("loading {}", config.data_path.display()))?;
        let history = normalize_history(data.to_daily_bars()?)
            .with_context(|| format!("ordering bars from {}", config.data_path.display()))?;
        info!(
            rows = history.len(),
            columns = data.dataframe().width(),
            "loaded dataset"
        );

        let artifact =
            ModelArtifact::load_or_unloaded(&config.model_path, config.scaler_path.as_deref())
                .with_context(|| format!("loading model {}", config.model_path.display()))?;

        let deriver = if config.oscillators {
            FeatureDeriver::new()
        } else {
            FeatureDeriver::without_oscillators()
        };
        if !deriver.supports_oscillators() {
            warn!("oscillator features disabled; rsi14, macd and atr14 will be absent");
        }

        Ok(Self::new(artifact, history, deriver))
    }

    pub fn into_shared(self) -> SharedContext {
        Arc::new(self)
    }
}
