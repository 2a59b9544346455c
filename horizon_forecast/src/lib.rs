//! # Horizon Forecast
//!
//! Next-day close prediction for daily crypto price history, and iterative
//! multi-day forecasts built from it.
//!
//! ## Features
//!
//! - CSV loading and minute-to-daily resampling
//! - Trailing-window feature derivation (moving averages, volatility, lag,
//!   calendar, rate of change, and RSI/MACD/ATR behind the `indicators`
//!   feature)
//! - Model bundles holding a regressor, its scaler and its feature order
//! - Single-step and horizon forecasting
//! - A ridge-regression trainer with time-series cross-validated penalty
//!   selection
//!
//! ## Quick Start
//!
//! ```no_run
//! use horizon_forecast::{normalize_history, DataLoader, FeatureDeriver, HorizonForecaster, ModelArtifact};
//!
//! # fn main() -> horizon_forecast::Result<()> {
//! let history = normalize_history(DataLoader::from_csv("features.csv")?.to_daily_bars()?)?;
//! let artifact = ModelArtifact::load("model.json", None)?;
//!
//! let forecaster = HorizonForecaster::new(&artifact, FeatureDeriver::new());
//! for point in forecaster.forecast(&history, 7)? {
//!     println!("{} {:.2}", point.date, point.predicted_close);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bars;
pub mod data;
pub mod error;
pub mod features;
pub mod forecaster;
pub mod metrics;
pub mod model;
pub mod predictor;
pub mod training;

// Re-export commonly used types
pub use crate::bars::{normalize_history, DailyBar, MinuteBar, WorkingSeries};
pub use crate::data::{resample_daily, DataLoader, TimeSeriesData};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{FeatureDeriver, FeatureTable};
pub use crate::forecaster::{validate_horizon, HorizonForecaster, HorizonPoint, HorizonRun};
pub use crate::model::{ModelArtifact, Regressor, RegressorKind, StandardScaler};
pub use crate::predictor::{LatestPrediction, SingleStepPredictor};
pub use crate::training::{
    time_series_splits, CandidateScore, ModelSelector, RidgeTrainer, SelectionReport, TrainingReport,
    TrainingSet,
};

/// Longest horizon a forecast may request
pub const MAX_HORIZON: usize = 90;

/// Horizon used when a caller does not name one
pub const DEFAULT_HORIZON: i64 = 7;

/// Feature order assumed when a model bundle does not list its own
pub const DEFAULT_FEATURES: [&str; 21] = [
    "open",
    "high",
    "low",
    "close",
    "Volume BTC",
    "MA7",
    "MA30",
    "MA50",
    "MA100",
    "MA200",
    "volatility7",
    "volatility30",
    "lag1_close",
    "day_of_week",
    "rsi14",
    "macd",
    "macd_signal",
    "macd_diff",
    "atr14",
    "roc5",
    "roc10",
];

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
