//! Path matching.

use anyhow::Result;
use serde_json::json;
use ssr_sdk::ssr_routes::{normalize_request, RouteRegistry};

use super::MatchArgs;
use crate::context::Context;

/// Run the match command.
pub async fn run(args: MatchArgs, ctx: &Context) -> Result<()> {
    let registry = RouteRegistry::with_routes(ctx.config.routes.iter().cloned());
    let graph = registry.graph();
    let matcher = registry.matcher();

    let request = normalize_request(&args.path);
    let matched = matcher.match_path(&request.path);
    let current = matcher
        .resolve_current(&request.path)
        .and_then(|id| graph.node(id))
        .map(|route| route.path.clone());

    if ctx.output.is_json() {
        ctx.output.json(&json!({
            "path": request.path,
            "query": request.query,
            "route": matched.as_ref().map(|m| m.route.path.as_str()),
            "params": matched.as_ref().map(|m| &m.params),
            "current": current,
        }));
        return Ok(());
    }

    let Some(matched) = matched else {
        ctx.output.warn(&format!("No route matches {}", request.path));
        return Ok(());
    };

    ctx.output.success(&format!("{} → {}", request.path, matched.route.path));
    for (name, value) in &matched.params {
        ctx.output.kv(name, value);
    }
    for (name, value) in &request.query {
        ctx.output.kv(&format!("?{}", name), value);
    }
    if let Some(current) = current.filter(|c| *c != matched.route.path) {
        ctx.output.kv("current", &current);
    }
    ctx.output.debug(&format!(
        "prerender: {}, auth required: {}",
        matched.route.is_prerendered(),
        matched.route.auth_required
    ));

    Ok(())
}
