//! Request target normalization.

use http::Uri;
use ssr_core::QueryParams;

/// A request target split into a normalized path and decoded query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    /// Normalized path (leading slash, no duplicate or trailing slashes).
    pub path: String,
    /// Decoded query parameters; the last occurrence of a key wins.
    pub query: QueryParams,
}

/// Normalize a request target (origin-form or absolute-form).
pub fn normalize_request(target: &str) -> NormalizedRequest {
    let target = target.split('#').next().unwrap_or_default();

    let parsed = if target.starts_with('/') || target.contains("://") {
        target.parse::<Uri>().ok()
    } else {
        None
    };

    let (path, query) = match &parsed {
        Some(uri) => (uri.path(), uri.query()),
        None => match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        },
    };

    NormalizedRequest {
        path: normalize_path(path),
        query: query.map(parse_query).unwrap_or_default(),
    }
}

/// Collapse duplicate slashes, force a leading slash, drop a trailing one.
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

fn parse_query(query: &str) -> QueryParams {
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}
