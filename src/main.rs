//! voxelstream - a deterministic streaming voxel world
//!
//! Headless driver: flies a viewer through the world, edits blocks and writes mesh metrics.

mod config;
mod headless;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use config::{AppConfig, DEFAULT_CONFIG_PATH};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Stream, mesh and edit a procedural voxel world headlessly",
    long_about = None
)]
struct Cli {
    /// World config file (TOML)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Override the world seed
    #[arg(long)]
    seed: Option<u64>,
    /// Override the number of ticks to simulate
    #[arg(long)]
    ticks: Option<u64>,
    /// Override the view radius in chunks
    #[arg(long)]
    view_radius: Option<i32>,
    /// Write the effective config to this path and exit
    #[arg(long)]
    dump_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // WARN by default; override via RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    info!("Starting voxelstream v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let mut cfg = AppConfig::load_from_path(&cli.config);
    if let Some(seed) = cli.seed {
        cfg.world.seed = seed;
    }
    if let Some(ticks) = cli.ticks {
        cfg.headless.ticks = ticks;
    }
    if let Some(radius) = cli.view_radius {
        cfg.streaming.view_radius = radius;
    }

    if let Some(path) = cli.dump_config {
        cfg.save_to_path(&path)?;
        info!(path = %path.display(), "config written");
        return Ok(());
    }

    let report = headless::run(&cfg)?;
    println!(
        "{} ticks, {} chunks generated, {} evicted, {} active, result {:?}",
        report.ticks,
        report.streaming.chunks_generated,
        report.streaming.chunks_evicted,
        report.streaming.active_chunks,
        report.result
    );
    Ok(())
}
