#![doc = include_str!("../README.md")]

mod commands;
mod config;
mod telemetry;

use clap::Parser;
use config::{Action, AppConfig, CliArgs};
use telemetry::init_telemetry;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = AppConfig::try_from(args)?;

    init_telemetry()?;
    tracing::debug!(generator = ?config.generator, "starting");

    match config.action {
        Action::Next { count } => commands::next(config.generator, count),
        Action::Decode { id } => commands::decode(config.generator, id),
        Action::Pump(pump) => commands::pump(config.generator, pump).await,
    }
}
