//! Request path to route resolution.

use std::sync::Arc;

use ssr_core::{RouteDescriptor, RouteParams};

use crate::graph::{NodeId, RouteGraph};

/// A route matched against a concrete path.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// Matched node.
    pub node: NodeId,
    /// Matched route.
    pub route: Arc<RouteDescriptor>,
    /// Captured path parameters.
    pub params: RouteParams,
}

/// Resolves normalized request paths against a route graph.
#[derive(Debug, Clone, Copy)]
pub struct RouteMatcher<'g> {
    graph: &'g RouteGraph,
}

impl<'g> RouteMatcher<'g> {
    /// Create a matcher over a graph.
    pub fn new(graph: &'g RouteGraph) -> Self {
        Self { graph }
    }

    /// Find the first route, in contribution order, whose template matches.
    ///
    /// Every node is considered, not just roots. When several templates
    /// match, the earliest contribution wins.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        self.graph
            .nodes()
            .iter()
            .enumerate()
            .find_map(|(id, route)| {
                let template = self.graph.template(id)?;
                let params = template.matches(path, route.exact)?;
                Some(RouteMatch {
                    node: id,
                    route: Arc::clone(route),
                    params,
                })
            })
    }

    /// Resolve "what route am I on" for navigation.
    ///
    /// A literal path equal to a known route wins over template matching.
    pub fn resolve_current(&self, path: &str) -> Option<NodeId> {
        self.graph
            .get(path)
            .or_else(|| self.match_path(path).map(|m| m.node))
    }
}

/// Match a path against a graph. See [`RouteMatcher::match_path`].
pub fn match_route(graph: &RouteGraph, path: &str) -> Option<RouteMatch> {
    RouteMatcher::new(graph).match_path(path)
}
