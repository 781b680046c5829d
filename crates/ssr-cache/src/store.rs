//! Cache store interface and an in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::payload::CachePayload;

/// Errors raised by store backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend storage error.
    #[error("storage error: {0}")]
    Backend(String),

    /// Backend unreachable.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Operation timed out.
    #[error("operation timed out")]
    Timeout,
}

/// A stored value with its creation time and optional TTL.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Stored payload.
    pub value: CachePayload,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
    /// Lifetime; `None` or zero never expires.
    pub ttl: Option<Duration>,
}

impl CacheEntry {
    /// Create an entry written at `created_at`.
    pub fn new(value: CachePayload, created_at: DateTime<Utc>, ttl: Option<Duration>) -> Self {
        Self {
            value,
            created_at,
            ttl,
        }
    }

    /// When the entry expires, if ever.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let ttl = self.ttl.filter(|ttl| !ttl.is_zero())?;
        let ttl = chrono::Duration::from_std(ttl).ok()?;
        self.created_at.checked_add_signed(ttl)
    }

    /// Whether the entry is expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expires| now >= expires)
    }

    /// Remaining lifetime at `now`; `None` if the entry never expires.
    pub fn remaining_ttl(&self, now: DateTime<Utc>) -> Option<Duration> {
        let expires = self.expires_at()?;
        Some((expires - now).to_std().unwrap_or_default())
    }
}

/// Storage backend for prerender payloads.
///
/// Implementations must tolerate concurrent access from independent renders.
/// Expiry and timeouts are the backend's responsibility.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read a payload. Only a missing or expired entry is `None`.
    async fn get(&self, key: &str) -> Result<Option<CachePayload>, StoreError>;

    /// Write a payload.
    async fn set(
        &self,
        key: &str,
        value: CachePayload,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError>;

    /// Delete a payload.
    async fn del(&self, key: &str) -> Result<(), StoreError>;

    /// Delete everything.
    async fn clear(&self) -> Result<(), StoreError>;
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// In-memory store (for development/testing). Not durable.
#[derive(Clone)]
pub struct InMemoryStore {
    entries: Arc<DashMap<String, CacheEntry>>,
    clock: Clock,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl InMemoryStore {
    /// Create an empty store using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// Create an empty store with a custom clock.
    pub fn with_clock(clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            clock: Arc::new(clock),
        }
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw entry, including expired ones.
    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = (self.clock)();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - self.entries.len()
    }
}

#[async_trait]
impl CacheStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CachePayload>, StoreError> {
        let now = (self.clock)();
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, entry| entry.is_expired_at(now));
        }
        Ok(None)
    }

    async fn set(
        &self,
        key: &str,
        value: CachePayload,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let entry = CacheEntry::new(value, (self.clock)(), ttl);
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.entries.clear();
        Ok(())
    }
}
