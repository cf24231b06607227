//! themesync - keep a remote storefront theme in sync with local sources.

mod cli;
mod config;
mod dispatch;
mod logger;
mod proxy;
mod reload;
mod remote;
mod resolve;
mod task;
mod transform;
mod utils;
mod watch;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::SyncConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = SyncConfig::load(&cli)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    match &cli.command {
        Commands::Watch { .. } => runtime.block_on(cli::watch::run_watch(&config)),
        Commands::Push { timeout } => {
            runtime.block_on(cli::push::run_push(&config, Duration::from_secs(*timeout)))
        }
        Commands::Export {
            resource_type,
            fields,
            metafields,
            output,
        } => runtime.block_on(cli::export::run_export(
            &config,
            resource_type,
            fields,
            *metafields,
            output.as_deref(),
        )),
        Commands::Import {
            resource_type,
            input,
        } => runtime.block_on(cli::import::run_import(&config, resource_type, input)),
        Commands::Pull { key, output } => {
            runtime.block_on(cli::pull::run_pull(&config, key, output.as_deref()))
        }
    }
}
