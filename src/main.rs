use anyhow::Result;
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

mod cli;
mod core;
mod config;
mod error;

use cli::{exit_code, Cli};
use crate::core::Engine;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Docweaver v{}", env!("CARGO_PKG_VERSION"));

    let engine = Engine::new(cli.config.as_deref(), cli.user_id()).await?;

    // Execute the requested command
    if let Err(e) = cli.execute(engine).await {
        error!("{:#}", e);
        std::process::exit(exit_code(&e));
    }
    Ok(())
}
