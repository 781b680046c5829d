//! Prerender data caching for the SSR pipeline.
//!
//! This crate provides:
//! - `CacheContribution` - A keyed unit of prerender data with load and hydrate steps
//! - `PrerenderCacheOrchestrator` - Cache-aside runs over contributions
//! - `CacheStore` - Storage backend interface, with `InMemoryStore`
//! - `CacheKeyBuilder` - Key composition from the prerender context
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use ssr_cache::{InMemoryStore, PrerenderCacheOrchestrator};
//!
//! let orchestrator = PrerenderCacheOrchestrator::new()
//!     .with_default_ttl(Duration::from_secs(300))
//!     .with_stampede_protection(true);
//!
//! let report = orchestrator.run(&mut ctx, &contributions, &InMemoryStore::new()).await?;
//! println!("{} hits, {} misses", report.hits(), report.misses());
//! ```

mod contribution;
mod key;
mod orchestrator;
mod payload;
mod store;

pub use contribution::*;
pub use key::*;
pub use orchestrator::*;
pub use payload::*;
pub use store::*;
