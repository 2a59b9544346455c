//! Horizon Server
//!
//! HTTP service and command-line tools around `horizon_forecast`:
//!
//! - **Serve**: `GET /`, `GET /predict_latest`, `GET /predict_horizon?n=`
//! - **Prepare**: resample minute bars and write the feature table
//! - **Train**: cross-validate ridge penalties and save the best bundle
//!
//! # Example
//!
//! ```bash
//! horizon prepare --input data/BTC-2017min.csv --output data/features_enhanced.csv
//! horizon train --data-path data/features_enhanced.csv --model-out model/crypto_model.json
//! horizon serve --data-path data/features_enhanced.csv --model-path model/crypto_model.json
//! ```

pub mod api;
pub mod commands;
pub mod config;
pub mod logging;
pub mod state;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::{PrepareCommand, ServeCommand, TrainCommand};

use crate::config::LoggingConfig;

/// Daily crypto close forecaster
#[derive(Parser, Debug)]
#[command(name = "horizon")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory for daily-rolling JSON logs
    #[arg(long, global = true, env = "HORIZON_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log filter directives, used when RUST_LOG is unset
    #[arg(long, global = true)]
    pub log_filter: Option<String>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            log_dir: self.log_dir.clone(),
            filter: self.log_filter.clone(),
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve predictions over HTTP
    Serve(ServeCommand),

    /// Build daily bars and features from minute data
    Prepare(PrepareCommand),

    /// Train and save a model bundle
    Train(TrainCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use horizon_forecast::training::{DEFAULT_ALPHAS, DEFAULT_SPLITS};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_train_features() {
        let cli = Cli::try_parse_from([
            "horizon",
            "train",
            "--data-path",
            "d.csv",
            "--model-out",
            "m.json",
            "--features",
            "close,MA7",
        ])
        .unwrap();

        match cli.command {
            Commands::Train(cmd) => {
                assert_eq!(cmd.features, vec!["close".to_string(), "MA7".to_string()]);
                assert_eq!(cmd.test_ratio, 0.2);
                assert_eq!(cmd.alphas, DEFAULT_ALPHAS.to_vec());
                assert_eq!(cmd.folds, DEFAULT_SPLITS);
            }
            other => panic!("expected train, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_train_candidates() {
        let cli = Cli::try_parse_from([
            "horizon",
            "train",
            "--data-path",
            "d.csv",
            "--model-out",
            "m.json",
            "--alphas",
            "0.5,2",
            "--folds",
            "3",
        ])
        .unwrap();

        match cli.command {
            Commands::Train(cmd) => {
                assert_eq!(cmd.alphas, vec![0.5, 2.0]);
                assert_eq!(cmd.folds, 3);
            }
            other => panic!("expected train, got {:?}", other),
        }
    }
}
