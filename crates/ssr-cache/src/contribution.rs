//! Prerender cache contributions.

use std::time::Duration;

use async_trait::async_trait;
use ssr_core::PrerenderContext;

use crate::payload::CachePayload;

/// A unit of cacheable prerender data.
///
/// A contribution names the key its data lives under, knows how to load the
/// data on a miss, and hydrates the render context from a payload.
#[async_trait]
pub trait CacheContribution: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Cache key for this request. `None` or an empty key skips the
    /// contribution entirely.
    fn build_cache_key(&self, ctx: &PrerenderContext) -> Option<String>;

    /// Produce the payload on a miss.
    async fn load(&self, ctx: &PrerenderContext) -> anyhow::Result<CachePayload>;

    /// Apply a payload to the context, returning the hydrated keys.
    ///
    /// Defaults to writing every entry into the data cache.
    fn hydrate(
        &self,
        ctx: &mut PrerenderContext,
        payload: &CachePayload,
    ) -> anyhow::Result<Vec<String>> {
        Ok(hydrate_data_cache(ctx, payload))
    }

    /// Lifetime of stored payloads; `None` defers to the orchestrator.
    fn ttl(&self) -> Option<Duration> {
        None
    }
}

/// Write every payload entry into the context's data cache.
pub fn hydrate_data_cache(ctx: &mut PrerenderContext, payload: &CachePayload) -> Vec<String> {
    payload
        .entries()
        .iter()
        .map(|entry| {
            ctx.data_cache.set(entry.key.clone(), entry.value.clone());
            entry.key.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use ssr_core::RouteDescriptor;

    use super::*;

    struct Static;

    #[async_trait]
    impl CacheContribution for Static {
        fn name(&self) -> &str {
            "static"
        }

        fn build_cache_key(&self, _ctx: &PrerenderContext) -> Option<String> {
            Some("static".into())
        }

        async fn load(&self, _ctx: &PrerenderContext) -> anyhow::Result<CachePayload> {
            Ok(CachePayload::new().with_entry("a", json!(1)))
        }
    }

    #[tokio::test]
    async fn test_default_hydrate_writes_data_cache() {
        let mut ctx = PrerenderContext::new(Arc::new(RouteDescriptor::new("/")), "/");
        let payload = Static.load(&ctx).await.unwrap();

        let keys = Static.hydrate(&mut ctx, &payload).unwrap();

        assert_eq!(keys, vec!["a".to_string()]);
        assert_eq!(ctx.data_cache.get("a"), Some(&json!(1)));
        assert_eq!(Static.ttl(), None);
    }
}
