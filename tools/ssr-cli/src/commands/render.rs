//! Render a request through the pipeline with a preview renderer.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serde_json::json;
use ssr_sdk::prelude::*;

use super::RenderArgs;
use crate::context::Context;
use crate::output::{format_bytes, outcome_badge};

/// Router that only remembers where it points.
pub struct PreviewRouter {
    location: String,
}

impl TransientRouter for PreviewRouter {
    fn location(&self) -> &str {
        &self.location
    }

    fn dispose(&mut self) {
        tracing::debug!(location = %self.location, "preview router disposed");
    }
}

/// Renders the route, params and hydrated cache as escaped markup.
pub struct PreviewRenderer;

#[async_trait]
impl SsrRenderer for PreviewRenderer {
    type Router = PreviewRouter;

    fn create_router(&self, location: &str) -> PreviewRouter {
        PreviewRouter {
            location: location.to_string(),
        }
    }

    async fn render(
        &self,
        router: &PreviewRouter,
        ctx: &PrerenderContext,
    ) -> anyhow::Result<String> {
        let summary = json!({
            "route": ctx.route.path,
            "location": router.location(),
            "params": ctx.params,
            "query": ctx.query,
            "subject": ctx.subject(),
            "data": ctx.data_cache.dehydrate(),
        });
        let pretty = serde_json::to_string_pretty(&summary)?;
        Ok(format!("<pre>{}</pre>", escape_html(&pretty)))
    }
}

/// Seeds the data cache with the matched route and its params.
struct RouteEcho;

#[async_trait]
impl CacheContribution for RouteEcho {
    fn name(&self) -> &str {
        "route-echo"
    }

    fn build_cache_key(&self, ctx: &PrerenderContext) -> Option<String> {
        CacheKeyBuilder::new()
            .with_prefix("echo")
            .route()
            .path()
            .subject()
            .build(ctx)
    }

    async fn load(&self, ctx: &PrerenderContext) -> anyhow::Result<CachePayload> {
        Ok(CachePayload::new().with_entry(
            "route",
            json!({ "path": ctx.route.path, "params": ctx.params }),
        ))
    }
}

/// Run the render command.
pub async fn run(args: RenderArgs, ctx: &Context) -> Result<()> {
    let store: Arc<dyn CacheStore> = Arc::new(InMemoryStore::new());
    let pipeline = RenderPipeline::from_config(&ctx.config, PreviewRenderer, store)
        .with_contribution(Arc::new(RouteEcho));

    let mut request = RenderRequest::new(&args.uri);
    if let Some(subject) = args.subject {
        request = request.with_session(SessionContext::new(subject));
    }

    ctx.output.debug(&format!("Rendering {}", args.uri));
    let outcome = pipeline
        .render(request)
        .await
        .with_context(|| format!("Failed to render {}", args.uri))?;

    if ctx.output.is_json() {
        let document = outcome.document();
        ctx.output.json(&json!({
            "outcome": outcome.label(),
            "route": document.map(|d| d.route.path.as_str()),
            "params": document.map(|d| &d.params),
            "cache": document.map(|d| &d.cache),
            "metrics": document.map(|d| &d.metrics),
            "html": document.map(|d| d.html.as_str()),
        }));
        return Ok(());
    }

    let label = outcome.label();
    let Some(document) = outcome.into_document() else {
        ctx.output.warn(&format!("{} {}", outcome_badge(label), args.uri));
        return Ok(());
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &document.html)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            ctx.output.success(&format!(
                "{} {} → {} ({})",
                outcome_badge(label),
                document.route.path,
                path.display(),
                format_bytes(document.html.len() as u64)
            ));
        }
        None => print!("{}", document.html),
    }

    if ctx.output.is_verbose() {
        for outcome in &document.cache.outcomes {
            ctx.output.debug(&format!(
                "{}: {} {}",
                outcome.contribution,
                outcome.status,
                outcome.key.as_deref().unwrap_or("-")
            ));
        }
        eprintln!("{}", document.metrics.to_summary());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_preview_renderer_escapes_markup() {
        let route = Arc::new(RouteDescriptor::new("/a/:id"));
        let mut params = RouteParams::new();
        params.insert("id".into(), "<b>".into());
        let ctx = PrerenderContext::new(route, "/a/<b>").with_params(params);

        let router = PreviewRenderer.create_router("/a/<b>");
        let html = PreviewRenderer.render(&router, &ctx).await.unwrap();

        assert!(html.starts_with("<pre>"));
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_route_echo_key() {
        let ctx = PrerenderContext::new(Arc::new(RouteDescriptor::new("/a")), "/a");
        let key = RouteEcho.build_cache_key(&ctx).unwrap();
        assert!(key.starts_with("echo:"));
        assert!(key.ends_with("u:anon"));
    }
}
