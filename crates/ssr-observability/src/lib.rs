//! Observability infrastructure for the prerender SSR pipeline.
//!
//! This crate provides:
//! - `init` - Global tracing subscriber with env filter and JSON or human output
//! - `RenderMetrics` - Per-render timing and cache summary

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;

// Re-export RequestId and TimingContext from ssr-core for convenience
pub use ssr_core::{RequestId, TimingContext};
