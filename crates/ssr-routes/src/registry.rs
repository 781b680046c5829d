//! Route contributions with a lazily built graph.

use std::sync::OnceLock;

use ssr_core::RouteDescriptor;

use crate::graph::RouteGraph;
use crate::matcher::RouteMatcher;

/// Collects route contributions and builds the graph on first access.
///
/// Once built, the graph is cached for the lifetime of the registry. Adding
/// a route afterwards drops the cached graph; the next access rebuilds it
/// wholesale.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: Vec<RouteDescriptor>,
    graph: OnceLock<RouteGraph>,
}

impl RouteRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from routes in contribution order.
    pub fn with_routes(routes: impl IntoIterator<Item = RouteDescriptor>) -> Self {
        Self {
            routes: routes.into_iter().collect(),
            graph: OnceLock::new(),
        }
    }

    /// Contribute a route.
    pub fn register(&mut self, route: RouteDescriptor) -> &mut Self {
        self.routes.push(route);
        if self.graph.take().is_some() {
            tracing::debug!("route contributions changed, graph will be rebuilt");
        }
        self
    }

    /// Contributed routes.
    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    /// Whether the graph has been built.
    pub fn is_built(&self) -> bool {
        self.graph.get().is_some()
    }

    /// The route graph, built on first call.
    pub fn graph(&self) -> &RouteGraph {
        self.graph.get_or_init(|| {
            let graph = RouteGraph::build(self.routes.iter().cloned());
            tracing::debug!(
                routes = graph.len(),
                roots = graph.roots().len(),
                "built route graph"
            );
            graph
        })
    }

    /// A matcher over the graph.
    pub fn matcher(&self) -> RouteMatcher<'_> {
        RouteMatcher::new(self.graph())
    }
}
