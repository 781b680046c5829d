//! Per-route preload hooks.

use async_trait::async_trait;
use ssr_core::{PrerenderContext, RouteDescriptor};

/// Runs after hydration and before render for the routes it applies to.
///
/// Typical uses are seeding client store state from the hydrated data
/// cache or resolving data that must not be cached.
#[async_trait]
pub trait RoutePreload: Send + Sync {
    /// Whether the hook applies to a route.
    fn applies_to(&self, route: &RouteDescriptor) -> bool;

    /// Prepare the context.
    async fn preload(&self, ctx: &mut PrerenderContext) -> anyhow::Result<()>;
}

/// Preload hook bound to a single route template.
pub struct RoutePreloadFn<F> {
    path: String,
    hook: F,
}

impl<F> RoutePreloadFn<F>
where
    F: Fn(&mut PrerenderContext) -> anyhow::Result<()> + Send + Sync,
{
    /// Bind a synchronous hook to the route template `path`.
    pub fn new(path: impl Into<String>, hook: F) -> Self {
        Self {
            path: path.into(),
            hook,
        }
    }
}

#[async_trait]
impl<F> RoutePreload for RoutePreloadFn<F>
where
    F: Fn(&mut PrerenderContext) -> anyhow::Result<()> + Send + Sync,
{
    fn applies_to(&self, route: &RouteDescriptor) -> bool {
        route.path == self.path
    }

    async fn preload(&self, ctx: &mut PrerenderContext) -> anyhow::Result<()> {
        (self.hook)(ctx)
    }
}
