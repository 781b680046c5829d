//! SSR CLI - inspect routes and preview prerendered documents.
//!
//! Commands:
//! - `ssr routes` - Show the route graph
//! - `ssr match` - Match a path against the routes
//! - `ssr render` - Render a request to HTML

mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ssr_sdk::ssr_core::LoggingSettings;

use commands::{MatchArgs, RenderArgs, RoutesArgs};

/// SSR CLI - Inspect and preview the prerender pipeline
#[derive(Parser)]
#[command(name = "ssr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the route graph
    Routes(RoutesArgs),

    /// Match a path and show captured params
    Match(MatchArgs),

    /// Render a request to HTML
    Render(RenderArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = output::Output::new(cli.verbose, cli.json);
    let ctx = context::Context::load(cli.config.as_deref(), output)?;

    let logging = if cli.verbose {
        LoggingSettings {
            level: "debug".to_string(),
            ..ctx.config.logging.clone()
        }
    } else {
        ctx.config.logging.clone()
    };
    if let Err(e) = ssr_sdk::ssr_observability::init(&logging) {
        ctx.output.warn(&e.to_string());
    }
    if let Some(path) = &ctx.config_path {
        ctx.output.debug(&format!("Using config {}", path.display()));
    }

    let result = match cli.command {
        Commands::Routes(args) => commands::routes::run(args, &ctx).await,
        Commands::Match(args) => commands::resolve::run(args, &ctx).await,
        Commands::Render(args) => commands::render::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
