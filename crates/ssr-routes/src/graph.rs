//! Route hierarchy reconstructed from flat route descriptors.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use ssr_core::RouteDescriptor;

use crate::template::PathTemplate;

/// Index of a node in a [`RouteGraph`], in contribution order.
pub type NodeId = usize;

/// Builder collecting route descriptors in contribution order.
#[derive(Debug, Clone, Default)]
pub struct RouteGraphBuilder {
    routes: Vec<RouteDescriptor>,
}

impl RouteGraphBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Contribute a route.
    pub fn route(mut self, route: RouteDescriptor) -> Self {
        self.routes.push(route);
        self
    }

    /// Contribute several routes.
    pub fn routes(mut self, routes: impl IntoIterator<Item = RouteDescriptor>) -> Self {
        self.routes.extend(routes);
        self
    }

    /// Build the graph. Same input, same order, same graph.
    pub fn build(self) -> RouteGraph {
        RouteGraph::build(self.routes)
    }
}

/// Read-only parent/child hierarchy over a fixed set of routes.
///
/// Never mutated after construction. The root set and child lists are
/// memoized through `OnceLock`, so shared references can be read from any
/// number of threads.
#[derive(Debug)]
pub struct RouteGraph {
    nodes: Vec<Arc<RouteDescriptor>>,
    templates: Vec<PathTemplate>,
    index: HashMap<String, NodeId>,
    parent_keys: Vec<String>,
    adjacency: Vec<Vec<NodeId>>,
    parents: Vec<Option<NodeId>>,
    in_degree: Vec<usize>,
    roots: OnceLock<Vec<NodeId>>,
    children: Vec<OnceLock<Vec<NodeId>>>,
}

impl RouteGraph {
    /// Build a graph from descriptors in contribution order.
    pub fn build(descriptors: impl IntoIterator<Item = RouteDescriptor>) -> Self {
        let nodes: Vec<Arc<RouteDescriptor>> = descriptors.into_iter().map(Arc::new).collect();
        let len = nodes.len();

        // Pass 1: index nodes and group them under their parent key.
        let mut index = HashMap::with_capacity(len);
        let mut parent_keys = Vec::with_capacity(len);
        let mut by_parent: HashMap<String, Vec<NodeId>> = HashMap::new();
        for (id, route) in nodes.iter().enumerate() {
            if index.contains_key(&route.path) {
                tracing::warn!(path = %route.path, "route contributed more than once, first wins");
            } else {
                index.insert(route.path.clone(), id);
            }
            let key = parent_key(route);
            by_parent.entry(key.clone()).or_default().push(id);
            parent_keys.push(key);
        }

        // Pass 2: connect every node to the children listed under its path.
        let mut adjacency = vec![Vec::new(); len];
        let mut parents = vec![None; len];
        let mut in_degree = vec![0; len];
        for (id, route) in nodes.iter().enumerate() {
            if index.get(&route.path) != Some(&id) {
                continue;
            }
            let Some(children) = by_parent.get(&route.path) else {
                continue;
            };
            for &child in children {
                if child == id {
                    continue;
                }
                adjacency[id].push(child);
                in_degree[child] += 1;
                parents[child].get_or_insert(id);
            }
        }

        let templates = nodes.iter().map(|r| PathTemplate::parse(&r.path)).collect();
        let children = (0..len).map(|_| OnceLock::new()).collect();

        Self {
            nodes,
            templates,
            index,
            parent_keys,
            adjacency,
            parents,
            in_degree,
            roots: OnceLock::new(),
            children,
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All routes, flattened in contribution order.
    pub fn nodes(&self) -> &[Arc<RouteDescriptor>] {
        &self.nodes
    }

    /// Route for a node.
    pub fn node(&self, id: NodeId) -> Option<&Arc<RouteDescriptor>> {
        self.nodes.get(id)
    }

    /// Parsed template for a node.
    pub fn template(&self, id: NodeId) -> Option<&PathTemplate> {
        self.templates.get(id)
    }

    /// Look up a node by its literal path.
    pub fn get(&self, path: &str) -> Option<NodeId> {
        self.index.get(path).copied()
    }

    /// Look up a route by its literal path.
    pub fn get_route(&self, path: &str) -> Option<&Arc<RouteDescriptor>> {
        self.get(path).and_then(|id| self.node(id))
    }

    /// Parent key computed for a node during construction.
    pub fn parent_key(&self, id: NodeId) -> Option<&str> {
        self.parent_keys.get(id).map(String::as_str)
    }

    /// Number of edges into a node.
    pub fn in_degree(&self, id: NodeId) -> Option<usize> {
        self.in_degree.get(id).copied()
    }

    /// Nodes with no incoming edge, in ascending index order.
    pub fn roots(&self) -> &[NodeId] {
        self.roots.get_or_init(|| {
            self.in_degree
                .iter()
                .enumerate()
                .filter(|(_, degree)| **degree == 0)
                .map(|(id, _)| id)
                .collect()
        })
    }

    /// Children of a node. Unknown nodes have no children.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.children.get(id) {
            Some(cell) => cell.get_or_init(|| self.adjacency[id].clone()).as_slice(),
            None => &[],
        }
    }

    /// Children of the node owning `path`.
    pub fn children_of(&self, path: &str) -> &[NodeId] {
        match self.get(path) {
            Some(id) => self.children(id),
            None => &[],
        }
    }

    /// The node whose child set contains `id`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(id).copied().flatten()
    }

    /// Ancestors of a node, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if parent == id || ancestors.contains(&parent) {
                break;
            }
            ancestors.push(parent);
            current = self.parent(parent);
        }
        ancestors
    }

    /// Depth-first walk from every root, yielding `(depth, node)`.
    ///
    /// Each node is visited at most once even if `force_parent` overrides
    /// introduce a cycle.
    pub fn walk(&self) -> Vec<(usize, NodeId)> {
        let mut visited = vec![false; self.len()];
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<(usize, NodeId)> =
            self.roots().iter().rev().map(|&id| (0, id)).collect();

        while let Some((depth, id)) = stack.pop() {
            if std::mem::replace(&mut visited[id], true) {
                continue;
            }
            out.push((depth, id));
            for &child in self.children(id).iter().rev() {
                if !visited[child] {
                    stack.push((depth + 1, child));
                }
            }
        }
        out
    }
}

/// Compute the parent key of a route.
///
/// `force_parent` wins when non-empty. A `root` route directly under `/` is
/// its own parent, which leaves it unconnected. Anything else hangs off the
/// directory component of its path.
pub fn parent_key(route: &RouteDescriptor) -> String {
    if let Some(parent) = route.forced_parent() {
        return parent.to_string();
    }
    let dir = dirname(&route.path);
    if route.root && dir == "/" {
        return route.path.clone();
    }
    dir.to_string()
}

/// Directory component of a slash-separated path.
pub fn dirname(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.starts_with('/') { "/" } else { "." };
    }
    match trimmed.rfind('/') {
        None => ".",
        Some(i) => {
            let dir = trimmed[..i].trim_end_matches('/');
            if dir.is_empty() {
                "/"
            } else {
                dir
            }
        }
    }
}
