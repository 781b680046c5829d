//! Extra render parameters.

use std::sync::Arc;

use async_trait::async_trait;
use ssr_core::{ExtraParams, PrerenderContext, RouteDescriptor};

use crate::error::SsrError;

/// Supplies additional parameters for eligible routes before caching runs.
#[async_trait]
pub trait ExtraParamsProvider: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Whether the provider applies to a route.
    fn is_eligible(&self, _route: &RouteDescriptor) -> bool {
        true
    }

    /// Parameters for this render, or `None` to contribute nothing.
    ///
    /// `ctx.extra_params` already holds what earlier providers returned.
    async fn get_params(
        &self,
        route: &RouteDescriptor,
        ctx: &PrerenderContext,
    ) -> anyhow::Result<Option<ExtraParams>>;
}

/// Run every eligible provider in order, merging each result into `ctx`.
///
/// A provider sees the keys merged by the ones before it; on a conflicting
/// key the later provider wins. The first failure stops the chain.
pub async fn collect_extra_params(
    providers: &[Arc<dyn ExtraParamsProvider>],
    route: &RouteDescriptor,
    ctx: &mut PrerenderContext,
) -> Result<(), SsrError> {
    for provider in providers.iter().filter(|p| p.is_eligible(route)) {
        let params = provider
            .get_params(route, ctx)
            .await
            .map_err(|source| SsrError::Params {
                provider: provider.name().to_string(),
                source,
            })?;

        if let Some(params) = params {
            tracing::debug!(provider = provider.name(), keys = params.len(), "merged extra params");
            ctx.merge_extra_params(params);
        }
    }
    Ok(())
}
