//! Route hierarchy and request matching for the prerender SSR pipeline.
//!
//! This crate provides:
//! - `RouteGraph` - Parent/child hierarchy rebuilt from flat descriptors
//! - `RouteMatcher` - First-match-wins template matching
//! - `PathTemplate` - `:name` / `:name?` / `*` path templates
//! - `RouteRegistry` - Contributions with a lazily built graph
//! - `normalize_request` - Request target normalization
//!
//! # Example
//!
//! ```ignore
//! use ssr_core::RouteDescriptor;
//! use ssr_routes::{RouteGraph, match_route};
//!
//! let graph = RouteGraph::build(vec![
//!     RouteDescriptor::new("/").root().exact(),
//!     RouteDescriptor::new("/group/:id"),
//! ]);
//!
//! let matched = match_route(&graph, "/group/5").unwrap();
//! assert_eq!(matched.params["id"], "5");
//! ```

mod graph;
mod matcher;
mod normalize;
mod registry;
mod template;

pub use graph::*;
pub use matcher::*;
pub use normalize::*;
pub use registry::*;
pub use template::*;
