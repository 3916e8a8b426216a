use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use tracing::debug;

/// Default time-to-live for entries that are not looked up again.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    last_touched: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, now: Instant) -> Self {
        Self {
            value,
            last_touched: now,
        }
    }

    fn stale(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_touched) > ttl
    }

    fn touch(&mut self, now: Instant) {
        self.last_touched = now;
    }
}

/// Values keyed by the validation token a client presents.
///
/// Expiry is lazy: every lookup sweeps out entries idle for longer than the
/// TTL, and a successful lookup resets the idle clock of the entry it returns.
/// The sweep is O(n), which is fine while the key set stays bounded by the
/// number of distinct images served in one TTL window.
#[derive(Debug)]
pub struct FreshnessCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V: Clone> FreshnessCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, token: &str) -> Option<V> {
        self.get_at(token, Instant::now())
    }

    /// Purge, look up and touch as one atomic step, as of `now`.
    pub fn get_at(&self, token: &str, now: Instant) -> Option<V> {
        let mut entries = self.lock();
        Self::purge(&mut entries, now, self.ttl);

        let entry = entries.get_mut(token)?;
        entry.touch(now);

        Some(entry.value.clone())
    }

    pub fn set(&self, token: impl Into<String>, value: V) {
        self.set_at(token, value, Instant::now());
    }

    pub fn set_at(&self, token: impl Into<String>, value: V, now: Instant) {
        self.lock().insert(token.into(), CacheEntry::new(value, now));
    }

    /// Entries currently held, including any not yet swept out.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge(entries: &mut HashMap<String, CacheEntry<V>>, now: Instant, ttl: Duration) {
        entries.retain(|token, entry| {
            let keep = !entry.stale(now, ttl);
            if !keep {
                debug!(token = %token, "purging cache entry");
            }
            keep
        });
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        // Every critical section leaves the map consistent, so a poisoned
        // lock still guards valid data.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Clone> Default for FreshnessCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
