//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Theme asset sync toolchain CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: themesync.toml)
    #[arg(short = 'C', long, default_value = "themesync.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Watch local sources and sync every change to the remote theme
    #[command(visible_alias = "w")]
    Watch {
        /// Proxy port number
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not start the storefront proxy
        #[arg(long)]
        no_proxy: bool,
    },

    /// Build and upload every script, style and theme file once
    #[command(visible_alias = "p")]
    Push {
        /// Give up after this many seconds
        #[arg(short, long, default_value_t = 600)]
        timeout: u64,
    },

    /// Export remote resources as JSON
    #[command(visible_alias = "e")]
    Export {
        /// Resource type, singular (e.g. product, collection, page)
        resource_type: String,

        /// Fields to include (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Attach each item's metafields
        #[arg(short, long)]
        metafields: bool,

        /// Write output to file instead of stdout
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Create or update remote resources from a JSON array
    #[command(visible_alias = "i")]
    Import {
        /// Resource type, singular (e.g. product, collection, page)
        resource_type: String,

        /// JSON file (as written by `export`)
        #[arg(value_hint = clap::ValueHint::FilePath)]
        input: PathBuf,
    },

    /// Download one remote asset
    Pull {
        /// Asset key (e.g. snippets/card.liquid)
        key: String,

        /// Write here instead of the matching theme path
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
}
