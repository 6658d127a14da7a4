//! edge-meta - Command line tool for the edge document metadata composer.
//!
//! Commands:
//! - `edge-meta render` - Render fragment records for one or more URLs
//! - `edge-meta hints` - Show the resource hints a client manifest produces
//! - `edge-meta config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::{Context as _, Result};
use clap::{ArgAction, Parser, Subcommand};
use edge_observability::{init_logging, LogFormat, LogLevel};

use commands::{ConfigArgs, HintsArgs, RenderArgs};

/// edge-meta - Compose and inspect per-page document metadata
#[derive(Parser)]
#[command(name = "edge-meta")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output; repeat for more detailed logs (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log format written to stderr (json or human)
    #[arg(long, global = true, default_value = "human")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render fragment records for URLs
    Render(RenderArgs),

    /// Show resource hints for the client manifest
    Hints(HintsArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_format, LogLevel::from_verbosity(cli.verbose))
        .context("Failed to initialize logging")?;

    // Setup output formatting
    let output = output::Output::new(cli.verbose > 0, cli.json);

    // Load config
    let ctx = match context::Context::load(cli.config.as_deref(), output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };
    tracing::debug!(config = ?ctx.config_path, "configuration loaded");

    // Execute command
    let result = match cli.command {
        Commands::Render(args) => commands::render::run(args, &ctx).await,
        Commands::Hints(args) => commands::hints::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render() {
        let cli = Cli::try_parse_from([
            "edge-meta", "render", "/a", "/b", "--repeat", "3", "--concurrent", "--json",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Render(args) => {
                assert_eq!(args.urls, vec!["/a", "/b"]);
                assert_eq!(args.repeat, 3);
                assert!(args.concurrent);
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn test_render_requires_url() {
        assert!(Cli::try_parse_from(["edge-meta", "render"]).is_err());
    }

    #[test]
    fn test_repeated_verbose_raises_log_level() {
        let quiet = Cli::try_parse_from(["edge-meta", "config", "show"]).unwrap();
        assert_eq!(LogLevel::from_verbosity(quiet.verbose), LogLevel::Warn);

        let cli = Cli::try_parse_from(["edge-meta", "-vv", "config", "show"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(LogLevel::from_verbosity(cli.verbose), LogLevel::Debug);

        let cli = Cli::try_parse_from(["edge-meta", "render", "/", "-v"]).unwrap();
        assert_eq!(LogLevel::from_verbosity(cli.verbose), LogLevel::Info);
    }

    #[test]
    fn test_log_format_flag() {
        let cli = Cli::try_parse_from(["edge-meta", "--log-format", "json", "config", "show"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
