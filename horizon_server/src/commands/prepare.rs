//! Prepare command implementation

use anyhow::{Context, Result};
use clap::Args;
use horizon_forecast::features::MA_WINDOWS;
use horizon_forecast::{normalize_history, resample_daily, DataLoader, FeatureDeriver};
use std::path::PathBuf;
use tracing::{info, warn};

/// Resample minute bars to daily bars and write the derived feature table
///
/// `--output` keeps every daily row, warm-up rows included; `serve` and
/// `train` re-derive the rolling windows from it.
///
/// # Example
///
/// ```bash
/// horizon prepare \
///     --input data/BTC-2017min.csv \
///     --output data/features_enhanced.csv \
///     --complete-output data/features_complete.csv
/// ```
#[derive(Args, Debug, Clone)]
pub struct PrepareCommand {
    /// Minute-level (or already daily) OHLCV CSV
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Every daily row with its features; the history `serve` and `train` read
    #[arg(long, short = 'o', env = "HORIZON_DATA_PATH")]
    pub output: PathBuf,

    /// Also write only the rows where every feature is defined
    #[arg(long)]
    pub complete_output: Option<PathBuf>,

    /// Skip the RSI, MACD and ATR columns
    #[arg(long)]
    pub no_oscillators: bool,
}

impl PrepareCommand {
    /// Execute the prepare command
    pub fn run(&self) -> Result<()> {
        info!("Loading: {}", self.input.display());
        let data = DataLoader::from_csv(&self.input)
            .with_context(|| format!("loading {}", self.input.display()))?;

        let minute = data.to_minute_bars()?;
        let daily = normalize_history(resample_daily(&minute))?;
        info!("Resampled {} rows into {} daily bars", minute.len(), daily.len());

        let deriver = if self.no_oscillators {
            FeatureDeriver::without_oscillators()
        } else {
            FeatureDeriver::new()
        };
        let table = deriver.derive(&daily);

        let complete = table.drop_incomplete();
        if complete.is_empty() {
            warn!(
                days = daily.len(),
                "no daily row has every feature; predictions need at least {} days",
                MA_WINDOWS.iter().max().copied().unwrap_or_default()
            );
        }

        table
            .write_csv(&self.output)
            .with_context(|| format!("writing {}", self.output.display()))?;
        info!("Saved: {}", self.output.display());
        info!("Rows: {} ({} complete)", table.len(), complete.len());
        info!("Columns: {:?}", table.column_names());

        if let Some(path) = &self.complete_output {
            complete
                .write_csv(path)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("Saved: {}", path.display());
        }

        Ok(())
    }
}
