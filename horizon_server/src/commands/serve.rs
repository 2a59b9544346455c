//! Serve command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use crate::api;
use crate::config::{ConfigOverrides, ServiceConfig};
use crate::state::AppContext;

/// Serve next-close and horizon predictions over HTTP
///
/// # Example
///
/// ```bash
/// horizon serve \
///     --data-path data/features_enhanced.csv \
///     --model-path model/crypto_model.json \
///     --bind-addr 0.0.0.0:5000
/// ```
#[derive(Args, Debug, Clone, Default)]
pub struct ServeCommand {
    /// JSON config file; flags below override its values
    #[arg(long, short = 'c', env = "HORIZON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Model bundle to load
    #[arg(long, env = "HORIZON_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Scaler used when the bundle has none
    #[arg(long, env = "HORIZON_SCALER_PATH")]
    pub scaler_path: Option<PathBuf>,

    /// Daily history CSV
    #[arg(long, env = "HORIZON_DATA_PATH")]
    pub data_path: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:5000
    #[arg(long, env = "HORIZON_BIND_ADDR")]
    pub bind_addr: Option<String>,

    /// Skip the RSI, MACD and ATR columns
    #[arg(long)]
    pub no_oscillators: bool,
}

impl ServeCommand {
    pub fn service_config(&self) -> Result<ServiceConfig> {
        let overrides = ConfigOverrides {
            model_path: self.model_path.clone(),
            scaler_path: self.scaler_path.clone(),
            data_path: self.data_path.clone(),
            bind_addr: self.bind_addr.clone(),
            no_oscillators: self.no_oscillators,
        };
        ServiceConfig::resolve(self.config.as_deref(), &overrides)
    }

    /// Execute the serve command
    pub async fn run(&self) -> Result<()> {
        let config = self.service_config()?;
        let addr = config.validate()?;

        info!("Data file: {}", config.data_path.display());
        info!("Model bundle: {}", config.model_path.display());

        let ctx = AppContext::load(&config)?;
        if !ctx.artifact.is_loaded() {
            info!("Serving without a model; prediction routes will return errors");
        }

        let app = api::router(ctx.into_shared());
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        info!("Listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
