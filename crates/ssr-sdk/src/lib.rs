//! Public SDK for the prerender SSR pipeline.
//!
//! This crate re-exports all pipeline functionality:
//!
//! ```ignore
//! use ssr_sdk::prelude::*;
//!
//! struct GroupData;
//!
//! #[async_trait::async_trait]
//! impl CacheContribution for GroupData {
//!     fn name(&self) -> &str {
//!         "group"
//!     }
//!
//!     fn build_cache_key(&self, ctx: &PrerenderContext) -> Option<String> {
//!         CacheKeyBuilder::new().with_prefix("group").require_param("id").build(ctx)
//!     }
//!
//!     async fn load(&self, ctx: &PrerenderContext) -> anyhow::Result<CachePayload> {
//!         let group = fetch_group(ctx.param("id")).await?;
//!         Ok(CachePayload::new().with_entry("group", group))
//!     }
//! }
//!
//! let config = SsrConfig::load("ssr.toml")?;
//! ssr_sdk::ssr_observability::init(&config.logging)?;
//! let pipeline = RenderPipeline::from_config(&config, MyRenderer, Arc::new(InMemoryStore::new()))
//!     .with_route_contribution("/group/:id", Arc::new(GroupData));
//! ```

pub use ssr_cache;
pub use ssr_core;
pub use ssr_document;
pub use ssr_observability;
pub use ssr_pipeline;
pub use ssr_routes;

/// Prelude for convenient imports.
pub mod prelude {
    pub use ssr_cache::*;
    pub use ssr_core::*;
    pub use ssr_document::*;
    pub use ssr_observability::*;
    pub use ssr_pipeline::*;
    pub use ssr_routes::*;
}
