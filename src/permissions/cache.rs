//! A small time-to-live cache.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Size below which inserts never sweep.
const MIN_SWEEP_LEN: usize = 64;

#[derive(Debug)]
struct Entries<K, V> {
    map: HashMap<K, (V, Instant)>,
    sweep_at: usize,
}

/// A thread-safe map whose entries expire `ttl` after insertion.
///
/// An expired entry is dropped when it is next read. Inserts also sweep every
/// expired entry once the map has doubled since the last sweep, so keys that
/// are never read again do not accumulate.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<Entries<K, V>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    /// Creates an empty cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(Entries {
                map: HashMap::new(),
                sweep_at: MIN_SWEEP_LEN,
            }),
        }
    }

    /// How long entries live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // A panic while holding the lock cannot leave the map half-updated.
    fn entries(&self) -> MutexGuard<'_, Entries<K, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_live(&self, stored: Instant, now: Instant) -> bool {
        now.saturating_duration_since(stored) < self.ttl
    }

    /// The value for `key`, if present and not expired.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let mut entries = self.entries();
        match entries.map.get(key) {
            Some((value, stored)) if self.is_live(*stored, now) => Some(value.clone()),
            Some(_) => {
                entries.map.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `value` under `key`, resetting its age.
    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    fn insert_at(&self, key: K, value: V, now: Instant) {
        let mut entries = self.entries();
        if entries.map.len() >= entries.sweep_at {
            entries.map.retain(|_, (_, stored)| self.is_live(*stored, now));
            entries.sweep_at = (entries.map.len() * 2).max(MIN_SWEEP_LEN);
        }
        entries.map.insert(key, (value, now));
    }

    /// Drops every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries()
            .map
            .retain(|_, (_, stored)| self.is_live(*stored, now));
    }

    /// Keeps only the entries whose key satisfies `keep`.
    pub fn retain(&self, mut keep: impl FnMut(&K) -> bool) {
        self.entries().map.retain(|key, _| keep(key));
    }

    /// Drops every entry.
    pub fn clear(&self) {
        let mut entries = self.entries();
        entries.map.clear();
        entries.sweep_at = MIN_SWEEP_LEN;
    }

    /// Entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries().map.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries().map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_before_expiry() {
        let cache = TtlCache::new(Duration::from_secs(300));
        cache.insert(("u1".to_string(), "view".to_string()), true);
        assert_eq!(cache.get(&("u1".to_string(), "view".to_string())), Some(true));
        assert_eq!(cache.get(&("u2".to_string(), "view".to_string())), None);
    }

    #[test]
    fn test_expired_entry_is_dropped() {
        let cache = TtlCache::new(Duration::from_secs(300));
        cache.insert("k", 1);
        let later = Instant::now() + Duration::from_secs(301);
        assert_eq!(cache.get_at(&"k", later), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_inserts_sweep_unread_expired_entries() {
        let cache = TtlCache::new(Duration::from_secs(300));
        let start = Instant::now();
        for i in 0..200 {
            cache.insert_at(format!("old-{}", i), i, start);
        }
        assert_eq!(cache.len(), 200);

        let later = start + Duration::from_secs(301);
        for i in 0..256 {
            cache.insert_at(format!("new-{}", i), i, later);
        }
        // Only the fresh keys survive; none of the old ones were ever read.
        assert_eq!(cache.len(), 256);
        assert_eq!(cache.get_at(&"new-0".to_string(), later), Some(0));
    }

    #[test]
    fn test_sweep_keeps_live_entries() {
        let cache = TtlCache::new(Duration::from_secs(300));
        let now = Instant::now();
        for i in 0..(MIN_SWEEP_LEN * 3) {
            cache.insert_at(i, i, now);
        }
        assert_eq!(cache.len(), MIN_SWEEP_LEN * 3);
    }

    #[test]
    fn test_retain_by_user() {
        let cache = TtlCache::new(Duration::from_secs(300));
        cache.insert(("u1".to_string(), "a"), true);
        cache.insert(("u1".to_string(), "b"), false);
        cache.insert(("u10".to_string(), "a"), true);

        cache.retain(|(user, _)| user.as_str() != "u1");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&("u10".to_string(), "a")), Some(true));

        cache.clear();
        assert!(cache.is_empty());
    }
}
