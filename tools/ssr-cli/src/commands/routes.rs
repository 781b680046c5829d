//! Route tree inspection.

use anyhow::Result;
use serde::Serialize;
use ssr_sdk::ssr_core::RouteDescriptor;
use ssr_sdk::ssr_routes::RouteRegistry;

use super::RoutesArgs;
use crate::context::Context;

#[derive(Serialize)]
struct RouteRow<'a> {
    path: &'a str,
    depth: usize,
    parent: Option<&'a str>,
    exact: bool,
    root: bool,
    prerender: bool,
    auth_required: bool,
}

/// Run the routes command.
pub async fn run(args: RoutesArgs, ctx: &Context) -> Result<()> {
    let registry = RouteRegistry::with_routes(ctx.config.routes.iter().cloned());
    let graph = registry.graph();

    if graph.is_empty() {
        ctx.output.info("No routes configured.");
        return Ok(());
    }

    let order: Vec<(usize, usize)> = if args.flat {
        (0..graph.len()).map(|id| (0, id)).collect()
    } else {
        graph.walk()
    };

    let rows: Vec<RouteRow<'_>> = order
        .iter()
        .filter_map(|&(depth, id)| {
            let route = graph.node(id)?;
            Some(RouteRow {
                path: &route.path,
                depth,
                parent: graph
                    .parent(id)
                    .and_then(|p| graph.node(p))
                    .map(|p| p.path.as_str()),
                exact: route.exact,
                root: graph.roots().contains(&id),
                prerender: route.is_prerendered(),
                auth_required: route.auth_required,
            })
        })
        .collect();

    if ctx.output.is_json() {
        ctx.output.json(&rows);
        return Ok(());
    }

    ctx.output.header(&format!(
        "{} routes, {} roots",
        graph.len(),
        graph.roots().len()
    ));
    for row in &rows {
        let tags = graph
            .get_route(row.path)
            .map(|route| tags(route))
            .unwrap_or_default();
        ctx.output.tree_item(row.depth, row.path, &tags);
    }

    Ok(())
}

fn tags(route: &RouteDescriptor) -> Vec<&'static str> {
    let mut tags = Vec::new();
    if route.exact {
        tags.push("exact");
    }
    if route.is_prerendered() {
        tags.push("ssr");
    }
    if route.auth_required {
        tags.push("auth");
    }
    if route.forced_parent().is_some() {
        tags.push("forced-parent");
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        let route = RouteDescriptor::new("/a")
            .exact()
            .prerendered()
            .with_force_parent("/b");
        assert_eq!(tags(&route), vec!["exact", "ssr", "forced-parent"]);
        assert!(tags(&RouteDescriptor::new("/c")).is_empty());
    }
}
