//! Service configuration: an optional JSON file, overridden by CLI flags and
//! environment variables

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything `horizon serve` needs to start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Model bundle (JSON). Absence is not fatal.
    pub model_path: PathBuf,
    /// Standalone scaler, used when the bundle carries none
    pub scaler_path: Option<PathBuf>,
    /// Daily history CSV. Must exist.
    pub data_path: PathBuf,
    /// Address the HTTP listener binds to
    pub bind_addr: String,
    /// Compute RSI/MACD/ATR columns when the build supports them
    pub oscillators: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model/crypto_model.json"),
            scaler_path: None,
            data_path: PathBuf::from("data/features_enhanced.csv"),
            bind_addr: "127.0.0.1:5000".to_string(),
            oscillators: true,
        }
    }
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model_path: Option<PathBuf>,
    pub scaler_path: Option<PathBuf>,
    pub data_path: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub no_oscillators: bool,
}

impl ServiceConfig {
    /// Read a JSON config file; missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        info!(path = %path.display(), "config file loaded");
        Ok(config)
    }

    /// Defaults, then the optional file, then explicit overrides
    pub fn resolve(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        Ok(config)
    }

    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(path) = &overrides.model_path {
            self.model_path = path.clone();
        }
        if let Some(path) = &overrides.scaler_path {
            self.scaler_path = Some(path.clone());
        }
        if let Some(path) = &overrides.data_path {
            self.data_path = path.clone();
        }
        if let Some(addr) = &overrides.bind_addr {
            self.bind_addr = addr.clone();
        }
        if overrides.no_oscillators {
            self.oscillators = false;
        }
    }

    /// Check the bind address parses
    pub fn validate(&self) -> Result<SocketAddr> {
        self.bind_addr
            .parse()
            .with_context(|| format!("invalid bind address: {}", self.bind_addr))
    }
}

/// Where and how much to log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoggingConfig {
    /// Directory for daily-rolling JSON logs; stderr only when unset
    pub log_dir: Option<PathBuf>,
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub filter: Option<String>,
}
