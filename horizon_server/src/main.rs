//! `horizon` binary: serve, prepare and train.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use horizon_server::logging::init_tracing;
use horizon_server::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Held until exit so the file writer flushes
    let _guard = init_tracing(&cli.logging_config())?;

    info!("horizon {} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve(cmd) => cmd.run().await?,
        Commands::Prepare(cmd) => cmd.run()?,
        Commands::Train(cmd) => cmd.run()?,
    }

    Ok(())
}
