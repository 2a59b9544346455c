//! Train command implementation

use anyhow::{Context, Result};
use clap::Args;
use horizon_forecast::training::{DEFAULT_ALPHAS, DEFAULT_SPLITS};
use horizon_forecast::{
    normalize_history, DataLoader, FeatureDeriver, ModelSelector, TrainingSet, DEFAULT_FEATURES,
};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

/// Cross-validate ridge penalties on daily history and write the winning
/// model bundle
///
/// # Example
///
/// ```bash
/// horizon train \
///     --data-path data/features_enhanced.csv \
///     --model-out model/crypto_model.json \
///     --metrics-out model/metrics.json
/// ```
#[derive(Args, Debug, Clone)]
pub struct TrainCommand {
    /// Daily history CSV
    #[arg(long, env = "HORIZON_DATA_PATH")]
    pub data_path: PathBuf,

    /// Where to write the model bundle
    #[arg(long, env = "HORIZON_MODEL_PATH")]
    pub model_out: PathBuf,

    /// Where to write per-candidate scores, the winner and feature weights
    #[arg(long)]
    pub metrics_out: Option<PathBuf>,

    /// Comma separated feature names (defaults to the standard set)
    #[arg(long, value_delimiter = ',')]
    pub features: Vec<String>,

    /// Comma separated L2 penalties to compare
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_ALPHAS.to_vec())]
    pub alphas: Vec<f64>,

    /// Expanding-window folds per candidate
    #[arg(long, default_value_t = DEFAULT_SPLITS)]
    pub folds: usize,

    /// Share of the newest rows held out for evaluation
    #[arg(long, default_value = "0.2")]
    pub test_ratio: f64,

    /// Skip the RSI, MACD and ATR columns
    #[arg(long)]
    pub no_oscillators: bool,
}

impl TrainCommand {
    fn feature_names(&self, deriver: &FeatureDeriver) -> Vec<String> {
        if !self.features.is_empty() {
            return self.features.clone();
        }
        let available = deriver.column_names();
        DEFAULT_FEATURES
            .iter()
            .copied()
            .filter(|name| available.contains(name))
            .map(str::to_string)
            .collect()
    }

    /// Execute the train command
    pub fn run(&self) -> Result<()> {
        let data = DataLoader::from_csv(&self.data_path)
            .with_context(|| format!("loading {}", self.data_path.display()))?;
        let history = normalize_history(data.to_daily_bars()?)?;
        info!("Loaded rows: {}", history.len());

        let deriver = if self.no_oscillators {
            FeatureDeriver::without_oscillators()
        } else {
            FeatureDeriver::new()
        };
        let features = self.feature_names(&deriver);
        info!("Using features: {:?}", features);

        let table = deriver.derive(&history);
        let set = TrainingSet::from_table(&table, &features)?;
        let selector = ModelSelector::new(&self.alphas, self.test_ratio, self.folds)?;
        let selection = selector.select(&set)?;
        for score in &selection.candidates {
            info!(
                "{}: MAE={:.2}, RMSE={:.2}, R2={:.3}",
                score.name, score.mae_mean, score.rmse_mean, score.r2_mean
            );
        }
        info!("Best: {}", selection.best);

        let report = &selection.report;

        info!(
            "Train rows: {}, Test rows: {}",
            report.train_rows, report.test_rows
        );
        if let Some(metrics) = &report.metrics {
            info!("MAE: {:.3}", metrics.mae);
            info!("RMSE: {:.3}", metrics.rmse);
            info!("R2: {:.3}", metrics.r2);
        }

        if let Some(parent) = self.model_out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        report
            .artifact
            .save(&self.model_out)
            .with_context(|| format!("writing {}", self.model_out.display()))?;
        info!("Saved model to: {}", self.model_out.display());

        if let Some(path) = &self.metrics_out {
            let summary = json!({
                "results": selection.candidates,
                "best": selection.best,
                "holdout": report.metrics,
                "train_rows": report.train_rows,
                "test_rows": report.test_rows,
                "importances": report.importances,
            });
            std::fs::write(path, serde_json::to_string_pretty(&summary)?)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("Saved metrics to: {}", path.display());
        }

        Ok(())
    }
}
