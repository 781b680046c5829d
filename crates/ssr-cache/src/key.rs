//! Cache key composition from a prerender context.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ssr_core::PrerenderContext;

/// Component of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyComponent {
    /// The route template.
    Route,
    /// The normalized request path.
    Path,
    /// A path parameter; a required one that is absent yields no key.
    Param { name: String, required: bool },
    /// Specific query parameters.
    QueryParams(Vec<String>),
    /// All query parameters.
    AllQueryParams,
    /// An extra parameter from the providers.
    Extra { name: String, required: bool },
    /// The session subject, or `anon`.
    Subject,
    /// Custom static value.
    Custom(String),
}

/// Builder for composing cache keys.
///
/// Request-derived values are form-encoded, so distinct requests never
/// share a key. The route template and prefix are written as-is.
///
/// ```
/// use ssr_cache::CacheKeyBuilder;
///
/// let keys = CacheKeyBuilder::new()
///     .with_prefix("group")
///     .require_param("id")
///     .query_params(&["tab"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CacheKeyBuilder {
    components: Vec<KeyComponent>,
    prefix: Option<String>,
    hashed: bool,
}

impl CacheKeyBuilder {
    /// Create a new cache key builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for the cache key. Kept readable when hashing.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Hash the component part of the key.
    pub fn hashed(mut self) -> Self {
        self.hashed = true;
        self
    }

    /// Include the route template.
    pub fn route(mut self) -> Self {
        self.components.push(KeyComponent::Route);
        self
    }

    /// Include the request path.
    pub fn path(mut self) -> Self {
        self.components.push(KeyComponent::Path);
        self
    }

    /// Include a path parameter when present.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.components.push(KeyComponent::Param {
            name: name.into(),
            required: false,
        });
        self
    }

    /// Include a path parameter; no key is built without it.
    pub fn require_param(mut self, name: impl Into<String>) -> Self {
        self.components.push(KeyComponent::Param {
            name: name.into(),
            required: true,
        });
        self
    }

    /// Include specific query parameters.
    pub fn query_params(mut self, params: &[&str]) -> Self {
        self.components.push(KeyComponent::QueryParams(
            params.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Include all query parameters.
    pub fn all_query_params(mut self) -> Self {
        self.components.push(KeyComponent::AllQueryParams);
        self
    }

    /// Include an extra parameter when present.
    pub fn extra(mut self, name: impl Into<String>) -> Self {
        self.components.push(KeyComponent::Extra {
            name: name.into(),
            required: false,
        });
        self
    }

    /// Include an extra parameter; no key is built without it.
    pub fn require_extra(mut self, name: impl Into<String>) -> Self {
        self.components.push(KeyComponent::Extra {
            name: name.into(),
            required: true,
        });
        self
    }

    /// Include the session subject.
    pub fn subject(mut self) -> Self {
        self.components.push(KeyComponent::Subject);
        self
    }

    /// Include a custom static value.
    pub fn custom(mut self, value: impl Into<String>) -> Self {
        self.components.push(KeyComponent::Custom(value.into()));
        self
    }

    /// Build the key, or `None` when a required component is missing.
    pub fn build(&self, ctx: &PrerenderContext) -> Option<String> {
        let mut parts = Vec::new();

        for component in &self.components {
            match component {
                KeyComponent::Route => parts.push(ctx.route.path.clone()),
                KeyComponent::Path => parts.push(encode(&ctx.path)),
                KeyComponent::Param { name, required } => match ctx.param(name) {
                    Some(value) => parts.push(format!("{}={}", encode(name), encode(value))),
                    None if *required => return None,
                    None => {}
                },
                KeyComponent::QueryParams(params) => {
                    for param in params {
                        if let Some(value) = ctx.query_param(param) {
                            parts.push(format!("q:{}={}", encode(param), encode(value)));
                        }
                    }
                }
                KeyComponent::AllQueryParams => {
                    for (k, v) in &ctx.query {
                        parts.push(format!("q:{}={}", encode(k), encode(v)));
                    }
                }
                KeyComponent::Extra { name, required } => match ctx.extra_param(name) {
                    Some(Value::Null) | None if *required => return None,
                    Some(Value::Null) | None => {}
                    Some(Value::String(value)) => {
                        parts.push(format!("x:{}={}", encode(name), encode(value)))
                    }
                    Some(value) => {
                        parts.push(format!("x:{}={}", encode(name), encode(&value.to_string())))
                    }
                },
                KeyComponent::Subject => {
                    parts.push(format!("u:{}", encode(ctx.subject().unwrap_or("anon"))));
                }
                KeyComponent::Custom(value) => parts.push(encode(value)),
            }
        }

        let body = parts.join("|");
        let body = if self.hashed {
            format!("{:x}", simple_hash(&body))
        } else {
            body
        };

        let key = match &self.prefix {
            Some(prefix) if body.is_empty() => prefix.clone(),
            Some(prefix) => format!("{}:{}", prefix, body),
            None => body,
        };

        (!key.is_empty()).then_some(key)
    }
}

/// Form-encode a request-derived part so it cannot contain `|`, `=` or `:`.
fn encode(part: &str) -> String {
    url::form_urlencoded::byte_serialize(part.as_bytes()).collect()
}

// Non-cryptographic; stable within a build only.
fn simple_hash(s: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use ssr_core::{RouteDescriptor, RouteParams, SessionContext};

    use super::*;

    fn ctx() -> PrerenderContext {
        let mut params = RouteParams::new();
        params.insert("id".into(), "7".into());
        let mut query = ssr_core::QueryParams::new();
        query.insert("tab".into(), "members".into());
        query.insert("page".into(), "2".into());

        PrerenderContext::new(Arc::new(RouteDescriptor::new("/group/:id")), "/group/7")
            .with_params(params)
            .with_query(query)
    }

    #[test]
    fn test_readable_key() {
        let key = CacheKeyBuilder::new()
            .with_prefix("group")
            .route()
            .require_param("id")
            .query_params(&["tab", "missing"])
            .build(&ctx());

        assert_eq!(key.as_deref(), Some("group:/group/:id|id=7|q:tab=members"));
    }

    #[test]
    fn test_required_param_missing() {
        let builder = CacheKeyBuilder::new().with_prefix("group").require_param("slug");
        assert_eq!(builder.build(&ctx()), None);

        let optional = CacheKeyBuilder::new().with_prefix("group").param("slug");
        assert_eq!(optional.build(&ctx()).as_deref(), Some("group"));
    }

    #[test]
    fn test_all_query_params_sorted() {
        let key = CacheKeyBuilder::new().all_query_params().build(&ctx());
        assert_eq!(key.as_deref(), Some("q:page=2|q:tab=members"));
    }

    #[test]
    fn test_extra_params() {
        let mut ctx = ctx();
        let mut extra = ssr_core::ExtraParams::new();
        extra.insert("locale".into(), json!("de"));
        extra.insert("version".into(), json!(3));
        extra.insert("unset".into(), json!(null));
        ctx.merge_extra_params(extra);

        let key = CacheKeyBuilder::new()
            .extra("locale")
            .extra("version")
            .extra("unset")
            .build(&ctx);
        assert_eq!(key.as_deref(), Some("x:locale=de|x:version=3"));

        assert_eq!(CacheKeyBuilder::new().require_extra("unset").build(&ctx), None);
    }

    #[test]
    fn test_subject() {
        let anon = CacheKeyBuilder::new().subject().build(&ctx());
        assert_eq!(anon.as_deref(), Some("u:anon"));

        let ctx = ctx().with_session(Some(SessionContext::new("alice")));
        let key = CacheKeyBuilder::new().subject().build(&ctx);
        assert_eq!(key.as_deref(), Some("u:alice"));
    }

    #[test]
    fn test_hashed_key_is_stable() {
        let builder = CacheKeyBuilder::new().with_prefix("g").path().hashed();
        let a = builder.build(&ctx()).unwrap();
        let b = builder.build(&ctx()).unwrap();

        assert_eq!(a, b);
        assert!(a.starts_with("g:"));
        assert!(!a.contains("/group"));
    }

    #[test]
    fn test_query_delimiters_cannot_forge_keys() {
        let builder = CacheKeyBuilder::new().with_prefix("g").query_params(&["a", "b"]);
        let route = Arc::new(RouteDescriptor::new("/g"));

        let mut crafted = ssr_core::QueryParams::new();
        crafted.insert("a".into(), "1|q:b=2".into());
        let crafted = PrerenderContext::new(Arc::clone(&route), "/g").with_query(crafted);

        let mut plain = ssr_core::QueryParams::new();
        plain.insert("a".into(), "1".into());
        plain.insert("b".into(), "2".into());
        let plain = PrerenderContext::new(route, "/g").with_query(plain);

        let crafted = builder.build(&crafted).unwrap();
        let plain = builder.build(&plain).unwrap();
        assert_eq!(plain, "g:q:a=1|q:b=2");
        assert_ne!(crafted, plain);
        assert_eq!(crafted, "g:q:a=1%7Cq%3Ab%3D2");
    }

    #[test]
    fn test_path_and_subject_are_encoded() {
        let ctx = ctx().with_session(Some(SessionContext::new("a|b")));
        let key = CacheKeyBuilder::new().path().subject().build(&ctx);
        assert_eq!(key.as_deref(), Some("%2Fgroup%2F7|u:a%7Cb"));
    }

    #[test]
    fn test_empty_builder_yields_no_key() {
        assert_eq!(CacheKeyBuilder::new().build(&ctx()), None);
    }
}
