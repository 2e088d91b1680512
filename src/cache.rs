//! Time-boxed, in-process memoisation keyed by operation name.
use crate::error::Result;
use crate::sheets::{RawRow, RowSource};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Cache key used for the fetched sheet rows.
pub const SHEET_ROWS_KEY: &str = "googleSheet";

pub struct TimedCache<T> {
    entries: Mutex<HashMap<String, (Instant, T)>>,
}

impl<T: Clone> TimedCache<T> {
    pub fn new() -> Self {
        TimedCache {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the value stored under `key` if it is younger than `ttl`, otherwise awaits
    /// `produce` and stores its value. Failures are passed through and not stored.
    pub async fn cached<F, Fut>(&self, key: &str, ttl: Duration, produce: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.lookup(key, ttl) {
            debug!(key, "Cache hit");
            return Ok(value);
        }
        let value = produce().await?;
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_owned(), (Instant::now(), value.clone()));
        Ok(value)
    }

    fn lookup(&self, key: &str, ttl: Duration) -> Option<T> {
        let entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries
            .get(key)
            .filter(|(stored_at, _)| stored_at.elapsed() < ttl)
            .map(|(_, value)| value.clone())
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clear();
    }
}

impl<T: Clone> Default for TimedCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`RowSource`] that reuses rows fetched less than `ttl` ago.
pub struct CachedSource<S> {
    inner: S,
    ttl: Duration,
    cache: TimedCache<Vec<RawRow>>,
}

impl<S> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        CachedSource {
            inner,
            ttl,
            cache: TimedCache::new(),
        }
    }
}

#[async_trait]
impl<S: RowSource + Send + Sync> RowSource for CachedSource<S> {
    async fn fetch_rows(&self) -> Result<Vec<RawRow>> {
        self.cache
            .cached(SHEET_ROWS_KEY, self.ttl, || self.inner.fetch_rows())
            .await
    }
}
