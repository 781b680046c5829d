//! Core abstractions for the prerender SSR pipeline.
//!
//! This crate provides the fundamental types:
//! - `RouteDescriptor` - Static metadata for one navigable path
//! - `PrerenderContext` - Per-render state threaded through the pipeline
//! - `DataCache` - Client-visible cache written by hydration
//! - `SsrConfig` - File-based configuration
//! - `TimingContext` - Render lifecycle tracking

mod config;
mod context;
mod lifecycle;
mod route;

pub use config::*;
pub use context::*;
pub use lifecycle::*;
pub use route::*;
