//! Per-render context threaded through the prerender pipeline.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lifecycle::TimingContext;
use crate::route::RouteDescriptor;

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("{:x}-{:x}", nanos, seq))
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extracted route parameters (e.g. `:id` from `/group/:id`).
pub type RouteParams = BTreeMap<String, String>;

/// Query string parameters.
pub type QueryParams = BTreeMap<String, String>;

/// Parameters accumulated from extra-parameter providers.
pub type ExtraParams = Map<String, Value>;

/// Authenticated session, as resolved by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Subject identifier (user id).
    pub subject: String,
    /// Bearer token for downstream calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Verified claims.
    #[serde(default)]
    pub claims: Map<String, Value>,
}

impl SessionContext {
    /// Create a session for the given subject.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Default::default()
        }
    }

    /// Attach an access token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Attach a claim.
    pub fn with_claim(mut self, name: impl Into<String>, value: Value) -> Self {
        self.claims.insert(name.into(), value);
        self
    }
}

/// Client-visible data cache populated by hydration.
///
/// Serialized into the document so the client does not re-fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataCache {
    entries: BTreeMap<String, Value>,
}

impl DataCache {
    /// Create an empty data cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write an entry, returning the value it replaced.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Read an entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Whether an entry exists.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Snapshot the cache as a JSON object for the client.
    pub fn dehydrate(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// Per-render context.
///
/// Owned by exactly one render invocation; never shared across renders.
#[derive(Debug)]
pub struct PrerenderContext {
    /// Unique request identifier.
    pub request_id: RequestId,
    /// Matched route.
    pub route: Arc<RouteDescriptor>,
    /// Normalized concrete request path.
    pub path: String,
    /// Extracted route parameters.
    pub params: RouteParams,
    /// Query string parameters.
    pub query: QueryParams,
    /// Parameters accumulated from providers (last writer wins).
    pub extra_params: ExtraParams,
    /// Authenticated session, if any.
    pub session: Option<SessionContext>,
    /// Personal access token supplied with the request.
    pub personal_access_token: Option<String>,
    /// Client data cache written by hydration.
    pub data_cache: DataCache,
    /// Client store state serialized into the document.
    pub state: Map<String, Value>,
    /// Timing context for observability.
    pub timing: TimingContext,
}

impl PrerenderContext {
    /// Create a context for a matched route and concrete path.
    pub fn new(route: Arc<RouteDescriptor>, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::generate(),
            route,
            path: path.into(),
            params: RouteParams::new(),
            query: QueryParams::new(),
            extra_params: ExtraParams::new(),
            session: None,
            personal_access_token: None,
            data_cache: DataCache::new(),
            state: Map::new(),
            timing: TimingContext::new(),
        }
    }

    /// Use an existing request ID.
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Set route parameters.
    pub fn with_params(mut self, params: RouteParams) -> Self {
        self.params = params;
        self
    }

    /// Set query parameters.
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Attach a session.
    pub fn with_session(mut self, session: Option<SessionContext>) -> Self {
        self.session = session;
        self
    }

    /// Attach a personal access token.
    pub fn with_personal_access_token(mut self, token: Option<String>) -> Self {
        self.personal_access_token = token;
        self
    }

    /// Get a route parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Get a query parameter by name.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Get an extra parameter by name.
    pub fn extra_param(&self, name: &str) -> Option<&Value> {
        self.extra_params.get(name)
    }

    /// Merge provider output; later writers replace earlier keys.
    pub fn merge_extra_params(&mut self, params: ExtraParams) {
        for (key, value) in params {
            self.extra_params.insert(key, value);
        }
    }

    /// Whether a session is attached.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Subject of the attached session.
    pub fn subject(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.subject.as_str())
    }

    /// Set a top-level client store entry.
    pub fn set_state(&mut self, key: impl Into<String>, value: Value) {
        self.state.insert(key.into(), value);
    }
}
