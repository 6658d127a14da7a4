//! CLI command implementations.

pub mod config;
pub mod hints;
pub mod render;

use clap::{Args, Subcommand};

/// Arguments for the render command.
#[derive(Args)]
pub struct RenderArgs {
    /// Request URLs to render.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Render each URL this many times.
    #[arg(short, long, default_value = "1")]
    pub repeat: usize,

    /// Issue the repetitions concurrently instead of one after another.
    #[arg(long)]
    pub concurrent: bool,

    /// Give up waiting after this many milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Client manifest path (overrides the config file).
    #[arg(short, long)]
    pub manifest: Option<String>,
}

/// Arguments for the hints command.
#[derive(Args)]
pub struct HintsArgs {
    /// Client manifest path (overrides the config file).
    #[arg(short, long)]
    pub manifest: Option<String>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
