use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use ssr_cache::{
    CacheContribution, CacheError, CacheKeyBuilder, CachePayload, CacheStatus, CacheStore,
    InMemoryStore, PrerenderCacheOrchestrator,
};
use ssr_core::{
    DocumentMeta, DocumentSettings, ExtraParams, PrerenderConfig, PrerenderContext, RenderPhase,
    RouteDescriptor, SessionContext, SsrConfig,
};
use ssr_document::{escape_html, DocumentComposer};
use ssr_pipeline::{
    ExtraParamsProvider, RenderOutcome, RenderPipeline, RenderRequest, RoutePreloadFn,
    SsrError, SsrRenderer, TransientRouter,
};
use ssr_routes::RouteRegistry;

#[derive(Default)]
struct RenderLog {
    locations: Mutex<Vec<String>>,
    disposed: AtomicUsize,
}

struct TestRouter {
    location: String,
    log: Arc<RenderLog>,
}

impl TransientRouter for TestRouter {
    fn location(&self) -> &str {
        &self.location
    }

    fn dispose(&mut self) {
        self.log.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Renders the hydrated group name, or fails on demand.
struct TestRenderer {
    log: Arc<RenderLog>,
    fail: bool,
}

#[async_trait]
impl SsrRenderer for TestRenderer {
    type Router = TestRouter;

    fn create_router(&self, location: &str) -> TestRouter {
        self.log.locations.lock().unwrap().push(location.to_string());
        TestRouter {
            location: location.to_string(),
            log: Arc::clone(&self.log),
        }
    }

    async fn render(&self, router: &TestRouter, ctx: &PrerenderContext) -> anyhow::Result<String> {
        if self.fail {
            anyhow::bail!("component threw");
        }
        let name = ctx
            .data_cache
            .get("group")
            .and_then(|g| g["name"].as_str())
            .unwrap_or("none");
        Ok(format!("<h1>{}</h1><p>{}</p>", escape_html(name), router.location()))
    }
}

/// Loads a group payload keyed by id, counting calls.
struct GroupData {
    loads: AtomicUsize,
    hydrates: AtomicUsize,
    name: &'static str,
    fail_hydrate: bool,
    delay: Duration,
}

impl GroupData {
    fn new(name: &'static str) -> Self {
        Self {
            loads: AtomicUsize::new(0),
            hydrates: AtomicUsize::new(0),
            name,
            fail_hydrate: false,
            delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl CacheContribution for GroupData {
    fn name(&self) -> &str {
        "group"
    }

    fn build_cache_key(&self, ctx: &PrerenderContext) -> Option<String> {
        CacheKeyBuilder::new()
            .with_prefix("group")
            .require_param("id")
            .extra("locale")
            .build(ctx)
    }

    async fn load(&self, ctx: &PrerenderContext) -> anyhow::Result<CachePayload> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(CachePayload::new().with_entry(
            "group",
            json!({"id": ctx.param("id"), "name": self.name}),
        ))
    }

    fn hydrate(
        &self,
        ctx: &mut PrerenderContext,
        payload: &CachePayload,
    ) -> anyhow::Result<Vec<String>> {
        self.hydrates.fetch_add(1, Ordering::SeqCst);
        if self.fail_hydrate {
            anyhow::bail!("schema mismatch");
        }
        Ok(ssr_cache::hydrate_data_cache(ctx, payload))
    }
}

struct Locale(&'static str);

#[async_trait]
impl ExtraParamsProvider for Locale {
    fn name(&self) -> &str {
        "locale"
    }

    async fn get_params(
        &self,
        _route: &RouteDescriptor,
        _ctx: &PrerenderContext,
    ) -> anyhow::Result<Option<ExtraParams>> {
        let mut params = ExtraParams::new();
        params.insert("locale".into(), json!(self.0));
        Ok(Some(params))
    }
}

fn routes() -> RouteRegistry {
    RouteRegistry::with_routes(vec![
        RouteDescriptor::new("/").exact(),
        RouteDescriptor::new("/group/:id").exact().with_prerender(PrerenderConfig::with_document(
            DocumentMeta::new()
                .with_title("Group <details>")
                .with_meta(&[("name", "description"), ("content", "Group \"overview\"")]),
        )),
        RouteDescriptor::new("/settings").exact().auth_required().prerendered(),
        RouteDescriptor::new("/client").exact(),
    ])
}

fn pipeline(
    log: &Arc<RenderLog>,
    fail: bool,
    store: Arc<InMemoryStore>,
    group: Arc<GroupData>,
) -> RenderPipeline<TestRenderer> {
    let renderer = TestRenderer {
        log: Arc::clone(log),
        fail,
    };
    let composer = DocumentComposer::new(
        DocumentSettings::default().with_base_path("/app/"),
        Some("Console".into()),
    );
    RenderPipeline::new(routes(), renderer, composer, store)
        .with_route_contribution("/group/:id", group)
}

#[tokio::test]
async fn test_renders_document() {
    let log = Arc::new(RenderLog::default());
    let store = Arc::new(InMemoryStore::new());
    let group = Arc::new(GroupData::new("</script><b>Ops</b>"));
    let pipeline = pipeline(&log, false, Arc::clone(&store), Arc::clone(&group));

    let outcome = pipeline
        .render(RenderRequest::new("/group/7/?tab=members"))
        .await
        .unwrap();
    assert_eq!(outcome.label(), "rendered");
    let doc = outcome.into_document().unwrap();

    assert_eq!(doc.route.path, "/group/:id");
    assert_eq!(doc.params.get("id").map(String::as_str), Some("7"));
    assert!(doc.html.contains("<title>Group &lt;details&gt;</title>"));
    assert!(doc.html.contains(r#"content="Group &quot;overview&quot;""#));
    assert!(doc.html.contains(r#"<script src="/app/main.js"></script>"#));
    assert!(doc.html.contains(r#"href="/app/main.css""#));
    assert!(doc.html.contains("<p>/group/7?tab=members</p>"));

    // The hydrated payload lands in the query-cache blob, escaped.
    assert!(doc.html.contains(r#"window["__QUERY_STATE__"]={"group":"#));
    assert!(doc.html.contains(r"\u003c/script>\u003cb>Ops\u003c/b>"));
    assert!(doc.html.contains("<h1>&lt;/script&gt;&lt;b&gt;Ops&lt;/b&gt;</h1>"));
    assert_eq!(doc.html.matches("</script>").count(), 2);

    assert_eq!(doc.cache.misses(), 1);
    assert!(doc.metrics.phase_us(RenderPhase::Composed).is_some());
    assert_eq!(log.disposed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_second_render_hits_cache() {
    let log = Arc::new(RenderLog::default());
    let store = Arc::new(InMemoryStore::new());
    let group = Arc::new(GroupData::new("Ops"));
    let pipeline = pipeline(&log, false, Arc::clone(&store), Arc::clone(&group));

    let first = pipeline.render(RenderRequest::new("/group/7")).await.unwrap();
    let second = pipeline.render(RenderRequest::new("/group/7")).await.unwrap();

    assert_eq!(first.document().unwrap().cache.outcomes[0].status, CacheStatus::Miss);
    assert_eq!(second.document().unwrap().cache.outcomes[0].status, CacheStatus::Hit);
    assert_eq!(group.loads.load(Ordering::SeqCst), 1);
    assert_eq!(group.hydrates.load(Ordering::SeqCst), 2);
    assert!(second.document().unwrap().html.contains("<h1>Ops</h1>"));

    pipeline.render(RenderRequest::new("/group/8")).await.unwrap();
    assert_eq!(group.loads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_non_rendered_outcomes() {
    let log = Arc::new(RenderLog::default());
    let pipeline = pipeline(
        &log,
        false,
        Arc::new(InMemoryStore::new()),
        Arc::new(GroupData::new("Ops")),
    );

    let missing = pipeline.render(RenderRequest::new("/nope")).await.unwrap();
    assert!(matches!(missing, RenderOutcome::NotFound { ref path } if path == "/nope"));

    let exact = pipeline.render(RenderRequest::new("/group/7/extra")).await.unwrap();
    assert_eq!(exact.label(), "not_found");

    let client = pipeline.render(RenderRequest::new("/client")).await.unwrap();
    assert_eq!(client.label(), "client_only");

    let anon = pipeline.render(RenderRequest::new("/settings")).await.unwrap();
    assert_eq!(anon.label(), "auth_required");

    let signed_in = pipeline
        .render(RenderRequest::new("/settings").with_session(SessionContext::new("alice")))
        .await
        .unwrap();
    assert_eq!(signed_in.label(), "rendered");
    assert!(signed_in.document().unwrap().html.contains("<title>Console</title>"));

    // Only the signed-in render created a router.
    assert_eq!(log.locations.lock().unwrap().as_slice(), &["/settings".to_string()]);
}

#[tokio::test]
async fn test_render_failure_disposes_router() {
    let log = Arc::new(RenderLog::default());
    let pipeline = pipeline(
        &log,
        true,
        Arc::new(InMemoryStore::new()),
        Arc::new(GroupData::new("Ops")),
    );

    let err = pipeline.render(RenderRequest::new("/group/1")).await.unwrap_err();

    assert!(matches!(err, SsrError::Render { ref path, .. } if path == "/group/1"));
    assert_eq!(log.disposed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_hydrate_failure_evicts_and_skips_render() {
    let log = Arc::new(RenderLog::default());
    let store = Arc::new(InMemoryStore::new());
    let group = Arc::new(GroupData {
        fail_hydrate: true,
        ..GroupData::new("Ops")
    });
    let pipeline = pipeline(&log, false, Arc::clone(&store), group);

    let err = pipeline.render(RenderRequest::new("/group/1")).await.unwrap_err();

    assert!(matches!(
        err,
        SsrError::Cache(CacheError::Hydrate { evicted: true, .. })
    ));
    assert!(store.get("group:id=1").await.unwrap().is_none());
    assert!(log.locations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_extra_params_and_preload() {
    let log = Arc::new(RenderLog::default());
    let store = Arc::new(InMemoryStore::new());
    let group = Arc::new(GroupData::new("Ops"));
    let pipeline = pipeline(&log, false, Arc::clone(&store), group)
        .with_params_provider(Arc::new(Locale("en")))
        .with_params_provider(Arc::new(Locale("de")))
        .with_preload(Arc::new(RoutePreloadFn::new(
            "/group/:id",
            |ctx: &mut PrerenderContext| {
                let locale = ctx.extra_param("locale").cloned().unwrap_or_default();
                ctx.set_state("locale", locale);
                Ok(())
            },
        )));

    let doc = pipeline
        .render(RenderRequest::new("/group/3"))
        .await
        .unwrap()
        .into_document()
        .unwrap();

    assert_eq!(doc.cache.outcomes[0].key.as_deref(), Some("group:id=3|x:locale=de"));
    assert!(store.entry("group:id=3|x:locale=de").is_some());
    assert!(doc.html.contains(r#"window["__PRELOADED_STATE__"]={"locale":"de"};"#));
}

#[tokio::test]
async fn test_stampede_protection_across_renders() {
    let log = Arc::new(RenderLog::default());
    let store = Arc::new(InMemoryStore::new());
    let group = Arc::new(GroupData {
        delay: Duration::from_millis(50),
        ..GroupData::new("Ops")
    });
    let pipeline = Arc::new(
        pipeline(&log, false, Arc::clone(&store), Arc::clone(&group))
            .with_orchestrator(PrerenderCacheOrchestrator::new().with_stampede_protection(true)),
    );

    let a = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.render(RenderRequest::new("/group/9")).await }
    });
    let b = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.render(RenderRequest::new("/group/9")).await }
    });

    assert_eq!(a.await.unwrap().unwrap().label(), "rendered");
    assert_eq!(b.await.unwrap().unwrap().label(), "rendered");
    assert_eq!(group.loads.load(Ordering::SeqCst), 1);
    assert_eq!(group.hydrates.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_from_config() {
    let config = SsrConfig::from_toml_str(
        r#"
        [app]
        name = "Console"

        [document]
        base_path = "/"
        script = "bundle.js?v=2"

        [cache]
        default_ttl_secs = 60

        [[routes]]
        path = "/"
        exact = true

        [[routes]]
        path = "/about"
        exact = true

        [routes.prerender]
        title = "About us"
        "#,
    )
    .unwrap();

    let log = Arc::new(RenderLog::default());
    let renderer = TestRenderer {
        log: Arc::clone(&log),
        fail: false,
    };
    let pipeline = RenderPipeline::from_config(&config, renderer, Arc::new(InMemoryStore::new()));

    assert_eq!(pipeline.registry().graph().len(), 2);
    assert_eq!(pipeline.composer().script_path(), "/bundle.js?v=2");

    let doc = pipeline
        .render(RenderRequest::new("/about"))
        .await
        .unwrap()
        .into_document()
        .unwrap();
    assert!(doc.html.contains("<title>About us</title>"));
    assert!(doc.html.contains(r#"href="/bundle.css?v=2""#));
    assert_eq!(doc.cache.outcomes.len(), 0);
}
