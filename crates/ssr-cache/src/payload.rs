//! Cached hydration payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One hydration entry: a data-cache key and the value written under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrationEntry {
    /// Data-cache key.
    pub key: String,
    /// Value to hydrate.
    pub value: Value,
}

/// Ordered hydration entries produced by a loader and stored verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CachePayload {
    entries: Vec<HydrationEntry>,
}

impl CachePayload {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn with_entry(mut self, key: impl Into<String>, value: Value) -> Self {
        self.push(key, value);
        self
    }

    /// Append an entry in place.
    pub fn push(&mut self, key: impl Into<String>, value: Value) {
        self.entries.push(HydrationEntry {
            key: key.into(),
            value,
        });
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[HydrationEntry] {
        &self.entries
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the payload has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for CachePayload {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut payload = Self::new();
        for (key, value) in iter {
            payload.push(key, value);
        }
        payload
    }
}
