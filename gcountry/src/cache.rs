//! Time-to-live caches for resolved records and name lists.
//!
//! ```rust
//! use std::time::Duration;
//! use gcountry::{Cache, TtlCache};
//!
//! let cache = TtlCache::new(Duration::from_secs(60));
//! cache.put("spain", 1_u32);
//! assert_eq!(cache.get("spain"), Some(1));
//! cache.expire("spain");
//! assert_eq!(cache.get("spain"), None);
//! ```

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Twelve hours for single country records.
pub const DEFAULT_RECORD_TTL: Duration = Duration::from_secs(12 * 60 * 60);
/// One day for the full country name list.
pub const DEFAULT_NAME_LIST_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub trait Cache<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;

    fn put(&self, key: &str, value: V);

    fn expire(&self, key: &str);
}

/// Concurrent cache whose entries expire `ttl` after insertion. A zero TTL
/// disables caching entirely. Every `put` also drops expired entries, so keys
/// that are never read again do not pile up.
#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    entries: DashMap<String, (Instant, V)>,
}

impl<V> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn purge_expired(&self) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, (inserted, _)| inserted.elapsed() < ttl);
    }
}

impl<V> Cache<V> for TtlCache<V>
where
    V: Clone + Send + Sync,
{
    fn get(&self, key: &str) -> Option<V> {
        let fresh = {
            let entry = self.entries.get(key)?;
            let (inserted, value) = entry.value();
            (inserted.elapsed() < self.ttl).then(|| value.clone())
        };

        if fresh.is_none() {
            let ttl = self.ttl;
            self.entries
                .remove_if(key, |_, (inserted, _)| inserted.elapsed() >= ttl);
        }
        fresh
    }

    fn put(&self, key: &str, value: V) {
        if self.ttl.is_zero() {
            return;
        }
        self.purge_expired();
        self.entries
            .insert(key.to_string(), (Instant::now(), value));
    }

    fn expire(&self, key: &str) {
        self.entries.remove(key);
    }
}
