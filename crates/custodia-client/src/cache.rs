//! Keyed, deduplicated async query cache.
//!
//! Backs every listing read: concurrent readers of the same resource key
//! share one in-flight fetch, fresh-enough entries short-circuit the network
//! entirely, and mutations either invalidate a key or write straight through
//! to the cached value.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::ApiError;

/// Fetch state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
    #[default]
    Idle,
    Loading,
    Error,
    Success,
}

/// Per-query configuration.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    /// When false, the query never fetches and only reports cached state.
    /// Used to defer listings until a session exists.
    pub enabled: bool,
    /// How long a fetched value counts as fresh.
    pub stale_time: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            stale_time: Duration::ZERO,
        }
    }
}

impl QueryOptions {
    pub fn with_stale_time(stale_time: Duration) -> Self {
        Self {
            enabled: true,
            stale_time,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[derive(Debug, Default)]
struct CacheEntry {
    value: Option<Value>,
    fetched_at: Option<Instant>,
    status: QueryStatus,
    last_error: Option<ApiError>,
    invalidated: bool,
}

impl CacheEntry {
    fn is_fresh(&self, stale_time: Duration) -> bool {
        if self.invalidated || self.value.is_none() {
            return false;
        }
        self.fetched_at
            .is_some_and(|at| at.elapsed() <= stale_time)
    }
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Explicit in-flight registry: one sender per key currently fetching.
    /// Late callers subscribe instead of issuing a duplicate request.
    in_flight: HashMap<String, broadcast::Sender<Result<Value, ApiError>>>,
}

/// Deduplicating query cache keyed by resource name.
///
/// Locks are short and never held across an await; fan-out to concurrent
/// callers goes through the in-flight registry's broadcast channels.
#[derive(Default)]
pub struct QueryCache {
    inner: Mutex<CacheInner>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, fetching with `fetch` when the
    /// entry is absent, stale, or older than `stale_time`. While a fetch for
    /// `key` is in flight, callers share its outcome. Disabled queries
    /// return whatever is cached without fetching.
    pub async fn query<F, Fut>(
        &self,
        key: &str,
        options: QueryOptions,
        fetch: F,
    ) -> Result<Option<Value>, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ApiError>>,
    {
        enum Plan {
            Cached(Value),
            Join(broadcast::Receiver<Result<Value, ApiError>>),
            Fetch,
        }

        let plan = {
            let mut inner = self.inner.lock().expect("cache lock poisoned");

            if !options.enabled {
                return Ok(inner
                    .entries
                    .get(key)
                    .and_then(|entry| entry.value.clone()));
            }

            if let Some(entry) = inner.entries.get(key)
                && entry.is_fresh(options.stale_time)
            {
                Plan::Cached(entry.value.clone().expect("fresh entry has a value"))
            } else if let Some(sender) = inner.in_flight.get(key) {
                Plan::Join(sender.subscribe())
            } else {
                let (sender, _) = broadcast::channel(1);
                inner.in_flight.insert(key.to_string(), sender);
                let entry = inner.entries.entry(key.to_string()).or_default();
                entry.status = QueryStatus::Loading;
                Plan::Fetch
            }
        };

        match plan {
            Plan::Cached(value) => Ok(Some(value)),
            Plan::Join(mut receiver) => match receiver.recv().await {
                Ok(outcome) => outcome.map(Some),
                // Sender dropped without publishing: the owning fetch was
                // cancelled mid-flight.
                Err(_) => Err(ApiError::cancelled("query cancelled")),
            },
            Plan::Fetch => {
                tracing::debug!(key, "cache miss, fetching");
                let outcome = fetch().await;
                self.settle(key, &outcome);
                outcome.map(Some)
            }
        }
    }

    /// Records a fetch outcome and fans it out to joined callers.
    fn settle(&self, key: &str, outcome: &Result<Value, ApiError>) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let entry = inner.entries.entry(key.to_string()).or_default();
        match outcome {
            Ok(value) => {
                entry.value = Some(value.clone());
                entry.fetched_at = Some(Instant::now());
                entry.status = QueryStatus::Success;
                entry.last_error = None;
                entry.invalidated = false;
            }
            Err(e) => {
                entry.status = QueryStatus::Error;
                entry.last_error = Some(e.clone());
            }
        }
        if let Some(sender) = inner.in_flight.remove(key) {
            // No receivers is fine: nobody joined this fetch.
            let _ = sender.send(outcome.clone());
        }
    }

    /// Marks `key` stale so the next query re-fetches.
    pub fn invalidate(&self, key: &str) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        if let Some(entry) = inner.entries.get_mut(key) {
            entry.invalidated = true;
            tracing::debug!(key, "cache invalidated");
        }
    }

    /// Atomically replaces the cached value for `key` with `update(current)`.
    /// Touches no other key and never triggers a fetch. Returns false when
    /// nothing is cached under `key`.
    pub fn write_cache(&self, key: &str, update: impl FnOnce(Value) -> Value) -> bool {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let Some(entry) = inner.entries.get_mut(key) else {
            return false;
        };
        let Some(current) = entry.value.take() else {
            return false;
        };
        entry.value = Some(update(current));
        true
    }

    /// Last cached value for `key`, if any.
    pub fn peek(&self, key: &str) -> Option<Value> {
        let inner = self.inner.lock().expect("cache lock poisoned");
        inner.entries.get(key).and_then(|entry| entry.value.clone())
    }

    /// Fetch status for `key`.
    pub fn status(&self, key: &str) -> QueryStatus {
        let inner = self.inner.lock().expect("cache lock poisoned");
        inner
            .entries
            .get(key)
            .map_or(QueryStatus::Idle, |entry| entry.status)
    }

    /// Wraps a side-effecting call: on success the listed keys are
    /// invalidated so their next observer re-fetches, on error the failure
    /// is logged and propagated.
    pub async fn mutate<T, F, Fut>(&self, invalidates: &[&str], op: F) -> Result<T, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match op().await {
            Ok(value) => {
                for key in invalidates {
                    self.invalidate(key);
                }
                Ok(value)
            }
            Err(e) => {
                tracing::warn!("mutation failed: {e}");
                Err(e)
            }
        }
    }
}
