//! Cache-aside orchestration over prerender contributions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use ssr_core::PrerenderContext;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::contribution::CacheContribution;
use crate::payload::CachePayload;
use crate::store::{CacheStore, StoreError};

/// Errors that stop an orchestrator run.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A store read or write failed.
    #[error("cache store {operation} failed for key '{key}'")]
    Store {
        operation: &'static str,
        key: String,
        #[source]
        source: StoreError,
    },

    /// A contribution failed to load.
    #[error("contribution '{contribution}' failed to load key '{key}'")]
    Load {
        contribution: String,
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// A contribution failed to hydrate.
    #[error("contribution '{contribution}' failed to hydrate key '{key}'")]
    Hydrate {
        contribution: String,
        key: String,
        /// Whether the entry was removed from the store.
        evicted: bool,
        #[source]
        source: anyhow::Error,
    },
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// How a contribution was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Payload came from the store.
    Hit,
    /// Payload was loaded during this run.
    Miss,
    /// No key; the contribution was skipped.
    Bypass,
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Miss => write!(f, "MISS"),
            Self::Bypass => write!(f, "BYPASS"),
        }
    }
}

/// Outcome of a single contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributionOutcome {
    /// Contribution name.
    pub contribution: String,
    /// Cache key, if one was built.
    pub key: Option<String>,
    /// How it was served.
    pub status: CacheStatus,
    /// Keys hydrated into the context.
    pub hydrated: Vec<String>,
}

/// Outcomes of a run, in contribution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheRunReport {
    /// Per-contribution outcomes.
    pub outcomes: Vec<ContributionOutcome>,
}

impl CacheRunReport {
    fn count(&self, status: CacheStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// Contributions served from the store.
    pub fn hits(&self) -> usize {
        self.count(CacheStatus::Hit)
    }

    /// Contributions loaded during the run.
    pub fn misses(&self) -> usize {
        self.count(CacheStatus::Miss)
    }

    /// Contributions skipped for lack of a key.
    pub fn bypassed(&self) -> usize {
        self.count(CacheStatus::Bypass)
    }

    /// Every hydrated key, in order.
    pub fn hydrated_keys(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .flat_map(|o| o.hydrated.iter().map(String::as_str))
    }
}

/// Runs prerender cache contributions against a store.
///
/// Contributions run sequentially in the order given. For each one:
///
/// - no key (or an empty key) skips it
/// - any stored value, including an empty payload, is a hit
/// - on a miss the payload is loaded, written to the store, then hydrated
/// - a hydrate failure after a miss evicts the key; after a hit it does not
///
/// The first error stops the run. A key is loaded at most once per run.
///
/// With stampede protection enabled, concurrent runs that miss on the same
/// key are serialized so only one of them loads it. The orchestrator must be
/// shared between those runs for the guard to apply.
#[derive(Debug, Default)]
pub struct PrerenderCacheOrchestrator {
    default_ttl: Option<Duration>,
    locks: Option<KeyLocks>,
}

impl PrerenderCacheOrchestrator {
    /// Create an orchestrator without a default TTL or stampede protection.
    pub fn new() -> Self {
        Self::default()
    }

    /// TTL for contributions that do not set their own.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Enable or disable per-key load coalescing across concurrent runs.
    pub fn with_stampede_protection(mut self, enabled: bool) -> Self {
        self.locks = enabled.then(KeyLocks::default);
        self
    }

    /// Whether stampede protection is enabled.
    pub fn is_stampede_protected(&self) -> bool {
        self.locks.is_some()
    }

    /// Default TTL.
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Run contributions against `store`, hydrating `ctx`.
    pub async fn run(
        &self,
        ctx: &mut PrerenderContext,
        contributions: &[Arc<dyn CacheContribution>],
        store: &dyn CacheStore,
    ) -> CacheResult<CacheRunReport> {
        let mut report = CacheRunReport::default();
        let mut loaded: HashMap<String, CachePayload> = HashMap::new();

        for contribution in contributions {
            let name = contribution.name();

            let Some(key) = contribution
                .build_cache_key(ctx)
                .filter(|key| !key.is_empty())
            else {
                debug!(contribution = name, "no cache key, skipping contribution");
                report.outcomes.push(ContributionOutcome {
                    contribution: name.to_string(),
                    key: None,
                    status: CacheStatus::Bypass,
                    hydrated: Vec::new(),
                });
                continue;
            };

            let (payload, status) = self
                .resolve(ctx, contribution.as_ref(), &key, store, &mut loaded)
                .await?;

            match contribution.hydrate(ctx, &payload) {
                Ok(hydrated) => {
                    debug!(
                        contribution = name,
                        key = %key,
                        status = %status,
                        hydrated = hydrated.len(),
                        "hydrated contribution"
                    );
                    report.outcomes.push(ContributionOutcome {
                        contribution: name.to_string(),
                        key: Some(key),
                        status,
                        hydrated,
                    });
                }
                Err(source) => {
                    let evicted = status == CacheStatus::Miss && evict(store, &key).await;
                    return Err(CacheError::Hydrate {
                        contribution: name.to_string(),
                        key,
                        evicted,
                        source,
                    });
                }
            }
        }

        Ok(report)
    }

    async fn resolve(
        &self,
        ctx: &PrerenderContext,
        contribution: &dyn CacheContribution,
        key: &str,
        store: &dyn CacheStore,
        loaded: &mut HashMap<String, CachePayload>,
    ) -> CacheResult<(CachePayload, CacheStatus)> {
        if let Some(payload) = loaded.get(key) {
            return Ok((payload.clone(), CacheStatus::Miss));
        }

        if let Some(payload) = get(store, key).await? {
            return Ok((payload, CacheStatus::Hit));
        }

        let _guard = match &self.locks {
            Some(locks) => {
                let guard = locks.lock(key).await;
                // Another run may have filled the key while we waited.
                if let Some(payload) = get(store, key).await? {
                    debug!(key, "key filled while waiting for lock");
                    return Ok((payload, CacheStatus::Hit));
                }
                Some(guard)
            }
            None => None,
        };

        let payload = contribution
            .load(ctx)
            .await
            .map_err(|source| CacheError::Load {
                contribution: contribution.name().to_string(),
                key: key.to_string(),
                source,
            })?;

        let ttl = contribution.ttl().or(self.default_ttl);
        store
            .set(key, payload.clone(), ttl)
            .await
            .map_err(|source| CacheError::Store {
                operation: "set",
                key: key.to_string(),
                source,
            })?;

        loaded.insert(key.to_string(), payload.clone());
        Ok((payload, CacheStatus::Miss))
    }
}

async fn get(store: &dyn CacheStore, key: &str) -> CacheResult<Option<CachePayload>> {
    store.get(key).await.map_err(|source| CacheError::Store {
        operation: "get",
        key: key.to_string(),
        source,
    })
}

async fn evict(store: &dyn CacheStore, key: &str) -> bool {
    match store.del(key).await {
        Ok(()) => {
            debug!(key, "evicted entry after failed hydrate");
            true
        }
        Err(e) => {
            warn!(key, error = %e, "failed to evict entry after failed hydrate");
            false
        }
    }
}

/// Per-key async locks, removed once nobody holds or waits on them.
#[derive(Debug, Default)]
struct KeyLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyLocks {
    async fn lock(&self, key: &str) -> KeyGuard<'_> {
        let mutex = Arc::clone(&*self.locks.entry(key.to_string()).or_default());
        let guard = mutex.lock_owned().await;
        KeyGuard {
            locks: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.len()
    }
}

struct KeyGuard<'a> {
    locks: &'a KeyLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
