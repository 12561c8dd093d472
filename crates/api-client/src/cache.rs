use chrono::{DateTime, Duration, Utc};
use std::future::Future;

/// A single value with a time-to-live.
///
/// The cache does no locking of its own. Callers share it behind a
/// `tokio::sync::Mutex` and hold the lock across `get_or_refresh`, so
/// concurrent readers wait for one refresh instead of each starting their own.
#[derive(Debug, Clone)]
pub struct TimedCache<T> {
    value: Option<T>,
    fetched_at: Option<DateTime<Utc>>,
    ttl: Duration,
}

impl<T: Clone> TimedCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            value: None,
            fetched_at: None,
            ttl,
        }
    }

    /// The cached value if it was stored less than `ttl` before `now`.
    pub fn get(&self, now: DateTime<Utc>) -> Option<&T> {
        match (&self.value, self.fetched_at) {
            (Some(value), Some(at)) if now.signed_duration_since(at) < self.ttl => Some(value),
            _ => None,
        }
    }

    pub fn put(&mut self, value: T, now: DateTime<Utc>) {
        self.value = Some(value);
        self.fetched_at = Some(now);
    }

    /// Returns the fresh value, or awaits `refresh`, stores its result as of
    /// `now` and returns it.
    pub async fn get_or_refresh<F, Fut>(&mut self, now: DateTime<Utc>, refresh: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(value) = self.get(now) {
            return value.clone();
        }
        let value = refresh().await;
        self.put(value.clone(), now);
        value
    }
}
