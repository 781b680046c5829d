//! CLI command implementations.

pub mod render;
pub mod resolve;
pub mod routes;

use std::path::PathBuf;

use clap::Args;

/// Arguments for the routes command.
#[derive(Args)]
pub struct RoutesArgs {
    /// List routes in contribution order instead of as a tree.
    #[arg(long)]
    pub flat: bool,
}

/// Arguments for the match command.
#[derive(Args)]
pub struct MatchArgs {
    /// Request path, optionally with a query string.
    pub path: String,
}

/// Arguments for the render command.
#[derive(Args)]
pub struct RenderArgs {
    /// Request URI to render.
    pub uri: String,

    /// Render as this session subject.
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Write the document to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
