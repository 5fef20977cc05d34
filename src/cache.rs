//! Time-to-live cache in front of a [`TaskSource`].
//!
//! Holds at most one batch of raw records. A batch younger than the TTL is served
//! as-is; anything older, or an explicit [`TaskCache::invalidate`], makes the
//! next read go to the source. Failed fetches are never cached.

use std::time::{Duration, Instant};

use serde_json::Value;

use crate::error::FetchError;
use crate::source::TaskSource;

struct Entry {
    fetched_at: Instant,
    records: Vec<Value>,
}

pub struct TaskCache<S> {
    source: S,
    ttl: Duration,
    entry: Option<Entry>,
}

impl<S: TaskSource> TaskCache<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        TaskCache {
            source,
            ttl,
            entry: None,
        }
    }

    /// Records for the list, fetching only if the cached batch is stale.
    pub fn get(&mut self) -> Result<&[Value], FetchError> {
        self.get_at(Instant::now())
    }

    /// Like [`TaskCache::get`] with an explicit clock reading.
    pub fn get_at(&mut self, now: Instant) -> Result<&[Value], FetchError> {
        if self.is_fresh_at(now) {
            tracing::trace!(target: "sdash.cache", "cache hit");
        } else {
            tracing::debug!(target: "sdash.cache", "cache miss, fetching");
            let records = self.source.fetch_tasks()?;
            self.entry = Some(Entry {
                fetched_at: now,
                records,
            });
        }
        Ok(self.entry.as_ref().map(|e| e.records.as_slice()).unwrap_or(&[]))
    }

    /// Treat the next read as a miss.
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            tracing::debug!(target: "sdash.cache", "cache invalidated");
        }
    }

    pub fn is_fresh_at(&self, now: Instant) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|e| now.saturating_duration_since(e.fetched_at) < self.ttl)
    }

    /// When the cached batch was fetched, if there is one.
    pub fn fetched_at(&self) -> Option<Instant> {
        self.entry.as_ref().map(|e| e.fetched_at)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
