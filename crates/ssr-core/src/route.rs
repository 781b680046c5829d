//! Route descriptors contributed by route producers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Raw attributes for one `<meta>` or `<link>` entry.
///
/// Values are untrusted: only non-empty strings survive normalization by the
/// document composer.
pub type RawHeadAttrs = BTreeMap<String, serde_json::Value>;

/// Per-route document metadata (title override and dynamic head entries).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Page title override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `<meta>` entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meta: Vec<RawHeadAttrs>,
    /// `<link>` entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<RawHeadAttrs>,
}

impl DocumentMeta {
    /// Create empty document metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title override.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add a `<meta>` entry from string attribute pairs.
    pub fn with_meta(mut self, attrs: &[(&str, &str)]) -> Self {
        self.meta.push(string_attrs(attrs));
        self
    }

    /// Add a `<link>` entry from string attribute pairs.
    pub fn with_link(mut self, attrs: &[(&str, &str)]) -> Self {
        self.links.push(string_attrs(attrs));
        self
    }

    /// Add a `<meta>` entry with arbitrary (possibly non-string) values.
    pub fn with_raw_meta(mut self, attrs: RawHeadAttrs) -> Self {
        self.meta.push(attrs);
        self
    }
}

fn string_attrs(attrs: &[(&str, &str)]) -> RawHeadAttrs {
    attrs
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
        .collect()
}

/// Prerender participation for a route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrerenderConfig {
    /// Document metadata applied when this route is rendered.
    #[serde(flatten)]
    pub document: DocumentMeta,
}

impl PrerenderConfig {
    /// Prerender with the given document metadata.
    pub fn with_document(document: DocumentMeta) -> Self {
        Self { document }
    }
}

/// Static metadata for one navigable path.
///
/// Descriptors are immutable once contributed and identified by `path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    /// Path template (e.g. `/group/:id`).
    pub path: String,
    /// Marks a top-level node.
    #[serde(default)]
    pub root: bool,
    /// Forbid trailing segments when matching.
    #[serde(default)]
    pub exact: bool,
    /// Route requires an authenticated session.
    #[serde(default)]
    pub auth_required: bool,
    /// Explicit parent path, overriding the directory component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_parent: Option<String>,
    /// Present when the route participates in server-side prerendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerender: Option<PrerenderConfig>,
}

impl RouteDescriptor {
    /// Create a descriptor for the given path template.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            root: false,
            exact: false,
            auth_required: false,
            force_parent: None,
            prerender: None,
        }
    }

    /// Flag as a root node.
    pub fn root(mut self) -> Self {
        self.root = true;
        self
    }

    /// Require an exact match.
    pub fn exact(mut self) -> Self {
        self.exact = true;
        self
    }

    /// Require an authenticated session.
    pub fn auth_required(mut self) -> Self {
        self.auth_required = true;
        self
    }

    /// Override the parent path.
    pub fn with_force_parent(mut self, parent: impl Into<String>) -> Self {
        self.force_parent = Some(parent.into());
        self
    }

    /// Enable prerendering with the given configuration.
    pub fn with_prerender(mut self, prerender: PrerenderConfig) -> Self {
        self.prerender = Some(prerender);
        self
    }

    /// Enable prerendering with default configuration.
    pub fn prerendered(self) -> Self {
        self.with_prerender(PrerenderConfig::default())
    }

    /// The explicit parent, ignoring empty overrides.
    pub fn forced_parent(&self) -> Option<&str> {
        self.force_parent.as_deref().filter(|p| !p.is_empty())
    }

    /// Whether the route is rendered on the server.
    pub fn is_prerendered(&self) -> bool {
        self.prerender.is_some()
    }

    /// Document metadata, if the route is prerendered.
    pub fn document_meta(&self) -> Option<&DocumentMeta> {
        self.prerender.as_ref().map(|p| &p.document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let route = RouteDescriptor::new("/group/:id")
            .exact()
            .auth_required()
            .prerendered();

        assert_eq!(route.path, "/group/:id");
        assert!(route.exact);
        assert!(route.auth_required);
        assert!(!route.root);
        assert!(route.is_prerendered());
    }

    #[test]
    fn test_forced_parent_ignores_empty() {
        let route = RouteDescriptor::new("/a").with_force_parent("");
        assert_eq!(route.forced_parent(), None);

        let route = RouteDescriptor::new("/a").with_force_parent("/b");
        assert_eq!(route.forced_parent(), Some("/b"));
    }

    #[test]
    fn test_descriptor_from_toml() {
        let route: RouteDescriptor = toml::from_str(
            r#"
            path = "/projects/:id"
            exact = true
            force_parent = "/projects"

            [prerender]
            title = "Project"

            [[prerender.meta]]
            name = "description"
            content = "A project"
            "#,
        )
        .unwrap();

        assert!(route.exact);
        assert!(!route.auth_required);
        assert_eq!(route.forced_parent(), Some("/projects"));
        let meta = route.document_meta().unwrap();
        assert_eq!(meta.title.as_deref(), Some("Project"));
        assert_eq!(meta.meta.len(), 1);
        assert_eq!(meta.meta[0]["content"], serde_json::json!("A project"));
    }

    #[test]
    fn test_document_meta_builder() {
        let meta = DocumentMeta::new()
            .with_title("Home")
            .with_meta(&[("name", "robots"), ("content", "noindex")])
            .with_link(&[("rel", "canonical"), ("href", "/home")]);

        assert_eq!(meta.title.as_deref(), Some("Home"));
        assert_eq!(meta.meta[0].len(), 2);
        assert_eq!(meta.links[0]["rel"], serde_json::json!("canonical"));
    }
}
