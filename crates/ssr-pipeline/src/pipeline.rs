//! End-to-end prerender of a single request.

use std::sync::Arc;
use std::time::Duration;

use ssr_cache::{CacheContribution, CacheRunReport, CacheStore, PrerenderCacheOrchestrator};
use ssr_core::{
    PrerenderContext, QueryParams, RenderPhase, RequestId, RouteDescriptor, RouteParams,
    SessionContext, SsrConfig,
};
use ssr_document::DocumentComposer;
use ssr_observability::RenderMetrics;
use ssr_routes::{normalize_request, RouteRegistry};
use tracing::{debug, info_span, warn, Instrument};

use crate::error::{SsrError, SsrResult};
use crate::params::{collect_extra_params, ExtraParamsProvider};
use crate::preload::RoutePreload;
use crate::renderer::{RouterGuard, SsrRenderer};

/// An inbound render request.
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    /// Request target (path and query, or an absolute URL).
    pub target: String,
    /// Authenticated session, if any.
    pub session: Option<SessionContext>,
    /// Personal access token, if any.
    pub personal_access_token: Option<String>,
    /// Request ID; generated when absent.
    pub request_id: Option<RequestId>,
}

impl RenderRequest {
    /// Create a request for a target.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    /// Attach a session.
    pub fn with_session(mut self, session: SessionContext) -> Self {
        self.session = Some(session);
        self
    }

    /// Attach a personal access token.
    pub fn with_personal_access_token(mut self, token: impl Into<String>) -> Self {
        self.personal_access_token = Some(token.into());
        self
    }

    /// Use a caller-supplied request ID.
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }
}

/// A composed document and what went into it.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// Final HTML.
    pub html: String,
    /// Matched route.
    pub route: Arc<RouteDescriptor>,
    /// Captured path parameters.
    pub params: RouteParams,
    /// Cache outcomes.
    pub cache: CacheRunReport,
    /// Timing and cache metrics.
    pub metrics: RenderMetrics,
}

/// How a request was handled.
#[derive(Debug, Clone)]
pub enum RenderOutcome {
    /// A document was rendered.
    Rendered(Box<RenderedDocument>),
    /// No route matches the path.
    NotFound { path: String },
    /// The route exists but is not server-rendered.
    ClientOnly { route: Arc<RouteDescriptor> },
    /// The route needs a session and none was given.
    AuthRequired { route: Arc<RouteDescriptor> },
}

impl RenderOutcome {
    /// Stable label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rendered(_) => "rendered",
            Self::NotFound { .. } => "not_found",
            Self::ClientOnly { .. } => "client_only",
            Self::AuthRequired { .. } => "auth_required",
        }
    }

    /// The rendered document, if any.
    pub fn document(&self) -> Option<&RenderedDocument> {
        match self {
            Self::Rendered(doc) => Some(doc),
            _ => None,
        }
    }

    /// Consume into the rendered document, if any.
    pub fn into_document(self) -> Option<RenderedDocument> {
        match self {
            Self::Rendered(doc) => Some(*doc),
            _ => None,
        }
    }
}

struct ScopedContribution {
    route: Option<String>,
    contribution: Arc<dyn CacheContribution>,
}

/// Prerender pipeline: match, hydrate, render, compose.
///
/// Shared across concurrent requests; each render owns its own context.
pub struct RenderPipeline<R: SsrRenderer> {
    registry: RouteRegistry,
    renderer: R,
    composer: DocumentComposer,
    orchestrator: PrerenderCacheOrchestrator,
    store: Arc<dyn CacheStore>,
    contributions: Vec<ScopedContribution>,
    providers: Vec<Arc<dyn ExtraParamsProvider>>,
    preloads: Vec<Arc<dyn RoutePreload>>,
}

impl<R: SsrRenderer> RenderPipeline<R> {
    /// Create a pipeline with a default orchestrator.
    pub fn new(
        registry: RouteRegistry,
        renderer: R,
        composer: DocumentComposer,
        store: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            registry,
            renderer,
            composer,
            orchestrator: PrerenderCacheOrchestrator::new(),
            store,
            contributions: Vec::new(),
            providers: Vec::new(),
            preloads: Vec::new(),
        }
    }

    /// Create a pipeline from file configuration.
    pub fn from_config(config: &SsrConfig, renderer: R, store: Arc<dyn CacheStore>) -> Self {
        let registry = RouteRegistry::with_routes(config.routes.iter().cloned());
        let composer = DocumentComposer::new(config.document.clone(), config.app.name.clone());

        let mut orchestrator = PrerenderCacheOrchestrator::new()
            .with_stampede_protection(config.cache.stampede_protection);
        if let Some(secs) = config.cache.default_ttl_secs {
            orchestrator = orchestrator.with_default_ttl(Duration::from_secs(secs));
        }

        Self::new(registry, renderer, composer, store).with_orchestrator(orchestrator)
    }

    /// Replace the cache orchestrator.
    pub fn with_orchestrator(mut self, orchestrator: PrerenderCacheOrchestrator) -> Self {
        self.orchestrator = orchestrator;
        self
    }

    /// Add a contribution that runs for every prerendered route.
    pub fn with_contribution(mut self, contribution: Arc<dyn CacheContribution>) -> Self {
        self.contributions.push(ScopedContribution {
            route: None,
            contribution,
        });
        self
    }

    /// Add a contribution that runs only for the route template `path`.
    pub fn with_route_contribution(
        mut self,
        path: impl Into<String>,
        contribution: Arc<dyn CacheContribution>,
    ) -> Self {
        self.contributions.push(ScopedContribution {
            route: Some(path.into()),
            contribution,
        });
        self
    }

    /// Add an extra-parameter provider.
    pub fn with_params_provider(mut self, provider: Arc<dyn ExtraParamsProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Add a route preload hook.
    pub fn with_preload(mut self, preload: Arc<dyn RoutePreload>) -> Self {
        self.preloads.push(preload);
        self
    }

    /// Route registry.
    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    /// Document composer.
    pub fn composer(&self) -> &DocumentComposer {
        &self.composer
    }

    /// Contributions for a route, in registration order.
    pub fn contributions_for(&self, route: &RouteDescriptor) -> Vec<Arc<dyn CacheContribution>> {
        self.contributions
            .iter()
            .filter(|scoped| scoped.route.as_deref().map_or(true, |path| path == route.path))
            .map(|scoped| Arc::clone(&scoped.contribution))
            .collect()
    }

    /// Render a request.
    pub async fn render(&self, request: RenderRequest) -> SsrResult<RenderOutcome> {
        let request_id = request
            .request_id
            .clone()
            .unwrap_or_else(RequestId::generate);
        let normalized = normalize_request(&request.target);
        let span = info_span!("render", request_id = %request_id, path = %normalized.path);

        self.render_matched(request_id, normalized.path, normalized.query, request)
            .instrument(span)
            .await
    }

    async fn render_matched(
        &self,
        request_id: RequestId,
        path: String,
        query: QueryParams,
        request: RenderRequest,
    ) -> SsrResult<RenderOutcome> {
        let Some(matched) = self.registry.matcher().match_path(&path) else {
            debug!("no route matches");
            return Ok(RenderOutcome::NotFound { path });
        };

        let route = matched.route;
        if !route.is_prerendered() {
            debug!(route = %route.path, "route is client-only");
            return Ok(RenderOutcome::ClientOnly { route });
        }
        if route.auth_required && request.session.is_none() {
            debug!(route = %route.path, "route requires a session");
            return Ok(RenderOutcome::AuthRequired { route });
        }

        let mut ctx = PrerenderContext::new(Arc::clone(&route), path)
            .with_request_id(request_id)
            .with_params(matched.params)
            .with_query(query)
            .with_session(request.session)
            .with_personal_access_token(request.personal_access_token);
        ctx.timing.mark(RenderPhase::Start);
        ctx.timing.mark(RenderPhase::Matched);

        collect_extra_params(&self.providers, &route, &mut ctx).await?;
        ctx.timing.mark(RenderPhase::ParamsResolved);

        let contributions = self.contributions_for(&route);
        let report = self
            .orchestrator
            .run(&mut ctx, &contributions, self.store.as_ref())
            .await
            .inspect_err(|e| warn!(error = %e, "cache orchestration failed"))?;
        ctx.timing.mark(RenderPhase::CacheResolved);

        for preload in self.preloads.iter().filter(|p| p.applies_to(&route)) {
            preload
                .preload(&mut ctx)
                .await
                .map_err(|source| SsrError::Preload {
                    route: route.path.clone(),
                    source,
                })?;
        }
        ctx.timing.mark(RenderPhase::Preloaded);

        let markup = {
            let router = RouterGuard::new(self.renderer.create_router(&location(&ctx)));
            self.renderer
                .render(&router, &ctx)
                .await
                .map_err(|source| {
                    warn!(error = %source, "render failed");
                    SsrError::Render {
                        path: ctx.path.clone(),
                        source,
                    }
                })?
        };
        ctx.timing.mark(RenderPhase::Rendered);

        let state = serde_json::to_string(&ctx.state)?;
        let query_cache = serde_json::to_string(&ctx.data_cache.dehydrate())?;
        let html = self
            .composer
            .compose(&markup, &state, &query_cache, route.document_meta());
        ctx.timing.mark(RenderPhase::Composed);

        let metrics = RenderMetrics::from_timing(&ctx.request_id, ctx.path.clone(), &ctx.timing)
            .with_route(route.path.clone())
            .with_outcome("rendered")
            .with_cache_counts(report.hits(), report.misses(), report.bypassed())
            .with_document_bytes(html.len());
        metrics.log();

        Ok(RenderOutcome::Rendered(Box::new(RenderedDocument {
            html,
            route,
            params: ctx.params,
            cache: report,
            metrics,
        })))
    }
}

/// Router location: the normalized path plus the re-encoded query.
fn location(ctx: &PrerenderContext) -> String {
    if ctx.query.is_empty() {
        return ctx.path.clone();
    }
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(&ctx.query)
        .finish();
    format!("{}?{}", ctx.path, query)
}
