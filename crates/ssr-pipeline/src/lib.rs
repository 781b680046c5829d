//! Prerender pipeline for server-rendered routes.
//!
//! This crate provides:
//! - `RenderPipeline` - Normalize, match, hydrate, render and compose a request
//! - `SsrRenderer` / `TransientRouter` - The injected renderer boundary
//! - `RouterGuard` - Router teardown on every exit path
//! - `ExtraParamsProvider` - Additional per-route parameters
//! - `RoutePreload` - Per-route hooks between hydration and render
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ssr_cache::InMemoryStore;
//! use ssr_pipeline::{RenderPipeline, RenderRequest};
//!
//! let pipeline = RenderPipeline::from_config(&config, MyRenderer, Arc::new(InMemoryStore::new()))
//!     .with_route_contribution("/group/:id", Arc::new(GroupData));
//!
//! match pipeline.render(RenderRequest::new("/group/7")).await? {
//!     RenderOutcome::Rendered(doc) => respond(doc.html),
//!     other => serve_client_shell(other),
//! }
//! ```

mod error;
mod params;
mod pipeline;
mod preload;
mod renderer;

pub use error::*;
pub use params::*;
pub use pipeline::*;
pub use preload::*;
pub use renderer::*;
