//! Client-side cache of backend reads, keyed by [`QueryKey`].
//!
//! Values are kept as JSON so one map can hold every query type. Invalidation
//! only flips the `stale` flag; the value stays until the next successful fetch
//! replaces it, which makes invalidating the same prefix twice equivalent to
//! doing it once.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tabula_core::cache::QueryKey;
use tabula_core::config::CacheSettings;
use tabula_core::{Result, TabulaError};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Last successfully fetched value. Kept across a later failed refetch.
    pub data: Option<Value>,
    pub fetched_at: Instant,
    pub status: QueryStatus,
    pub stale: bool,
    pub error: Option<String>,
}

impl CacheEntry {
    fn is_fresh(&self, freshness: Duration) -> bool {
        self.status == QueryStatus::Success
            && !self.stale
            && self.data.is_some()
            && self.fetched_at.elapsed() < freshness
    }
}

/// How a read may be served and retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    pub freshness: Duration,
    pub retries: u32,
}

impl FetchPolicy {
    /// List and detail reads: cached for the configured freshness, retried.
    pub fn read(settings: &CacheSettings) -> Self {
        Self {
            freshness: Duration::from_secs(settings.freshness_secs),
            retries: settings.read_retries,
        }
    }

    /// Cached like a read but never retried.
    pub fn single_attempt(settings: &CacheSettings) -> Self {
        Self {
            freshness: Duration::from_secs(settings.freshness_secs),
            retries: 0,
        }
    }
}

/// Whether a failed read is worth another attempt.
fn is_retryable(err: &TabulaError) -> bool {
    match err {
        TabulaError::Network(_) | TabulaError::Opaque(_) => true,
        TabulaError::Http { status, .. } => *status >= 500,
        _ => false,
    }
}

#[derive(Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, CacheEntry>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `key` from cache when fresh, otherwise runs `fetcher` (up to
    /// `1 + policy.retries` times) and stores the result.
    pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, policy: FetchPolicy, fetcher: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.fresh_value::<T>(key, policy.freshness).await {
            tracing::debug!("cache hit {}", key);
            return Ok(hit);
        }

        let mut attempt = 0;
        loop {
            match fetcher().await {
                Ok(value) => {
                    let data = serde_json::to_value(&value)?;
                    self.entries.write().await.insert(
                        key.clone(),
                        CacheEntry {
                            data: Some(data),
                            fetched_at: Instant::now(),
                            status: QueryStatus::Success,
                            stale: false,
                            error: None,
                        },
                    );
                    tracing::debug!("cache fill {}", key);
                    return Ok(value);
                }
                Err(err) if attempt < policy.retries && is_retryable(&err) => {
                    attempt += 1;
                    tracing::warn!("{} failed ({}), retry {}/{}", key, err, attempt, policy.retries);
                }
                Err(err) => {
                    if !err.is_cancelled() {
                        self.record_failure(key, &err).await;
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Marks every entry under `prefix` stale. Returns how many entries matched.
    pub async fn invalidate_prefix(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries.write().await;
        let mut matched = 0;
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.stale = true;
                matched += 1;
            }
        }
        tracing::debug!("invalidated {} entries under '{}'", matched, prefix);
        matched
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn entry(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn is_stale(&self, key: &QueryKey) -> Option<bool> {
        self.entries.read().await.get(key).map(|e| e.stale)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn fresh_value<T: DeserializeOwned>(&self, key: &QueryKey, freshness: Duration) -> Option<T> {
        let entries = self.entries.read().await;
        let entry = entries.get(key).filter(|e| e.is_fresh(freshness))?;
        let data = entry.data.clone()?;
        match serde_json::from_value(data) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("cached value for {} no longer decodes: {}", key, err);
                None
            }
        }
    }

    async fn record_failure(&self, key: &QueryKey, err: &TabulaError) {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) => {
                entry.status = QueryStatus::Error;
                entry.error = Some(err.to_string());
            }
            None => {
                entries.insert(
                    key.clone(),
                    CacheEntry {
                        data: None,
                        fetched_at: Instant::now(),
                        status: QueryStatus::Error,
                        stale: true,
                        error: Some(err.to_string()),
                    },
                );
            }
        }
    }
}
