// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A bounded in-memory cache with per-entry expiry.
//!
//! Capacity is enforced by evicting the least recently used entry, and
//! entries older than the TTL are dropped on access. Time is passed in by the
//! caller so the cache stays deterministic.

use std::hash::Hash;
use std::num::NonZeroUsize;

use chrono::Duration;
use lru::LruCache;

use crate::types::timestamp::Timestamp;

struct Entry<V> {
    value: V,
    expires_at: Timestamp,
}

pub struct TtlCache<K, V> {
    /// `None` when the capacity is zero.
    entries: Option<LruCache<K, Entry<V>>>,
    ttl: Duration,
}

impl<K: Eq + Hash + Clone, V> TtlCache<K, V> {
    /// A cache holding at most `capacity` entries, each living for `ttl`.
    /// A zero capacity caches nothing.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a live entry and mark it as recently used.
    pub fn get(&mut self, key: &K, now: Timestamp) -> Option<&V> {
        let entries = self.entries.as_mut()?;
        if entries.peek(key)?.expires_at <= now {
            entries.pop(key);
            return None;
        }
        entries.get(key).map(|entry| &entry.value)
    }

    /// Insert or replace an entry. When the cache is full, expired entries
    /// go first and the least recently used one after that.
    pub fn insert(&mut self, key: K, value: V, now: Timestamp) {
        let expires_at = now.plus(self.ttl);
        let Some(entries) = self.entries.as_mut() else {
            return;
        };
        if !entries.contains(&key) && entries.len() == entries.cap().get() {
            purge(entries, now);
        }
        entries.put(key, Entry { value, expires_at });
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries
            .as_mut()?
            .pop(key)
            .map(|entry| entry.value)
    }

    /// Drop every expired entry. Returns how many were dropped.
    pub fn purge_expired(&mut self, now: Timestamp) -> usize {
        self.entries
            .as_mut()
            .map_or(0, |entries| purge(entries, now))
    }

    pub fn clear(&mut self) {
        if let Some(entries) = self.entries.as_mut() {
            entries.clear();
        }
    }
}

fn purge<K: Eq + Hash + Clone, V>(entries: &mut LruCache<K, Entry<V>>, now: Timestamp) -> usize {
    let expired: Vec<K> = entries
        .iter()
        .filter(|(_, entry)| entry.expires_at <= now)
        .map(|(key, _)| key.clone())
        .collect();
    for key in &expired {
        entries.pop(key);
    }
    expired.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::timestamp::ts;

    fn t0() -> Timestamp {
        ts("2024-05-01T10:00:00.000")
    }

    #[test]
    fn test_get_after_insert() {
        let mut cache = TtlCache::new(4, Duration::minutes(5));
        cache.insert("a", 1, t0());
        assert_eq!(cache.get(&"a", t0()), Some(&1));
        assert_eq!(cache.get(&"b", t0()), None);
    }

    #[test]
    fn test_entries_expire() {
        let mut cache = TtlCache::new(4, Duration::minutes(5));
        cache.insert("a", 1, t0());
        let later = t0().plus(Duration::minutes(4));
        assert_eq!(cache.get(&"a", later), Some(&1));
        let expired = t0().plus(Duration::minutes(5));
        assert_eq!(cache.get(&"a", expired), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = TtlCache::new(2, Duration::hours(1));
        cache.insert("a", 1, t0());
        cache.insert("b", 2, t0());
        // Touch "a" so "b" becomes the oldest.
        assert!(cache.get(&"a", t0()).is_some());
        cache.insert("c", 3, t0());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"b", t0()), None);
        assert_eq!(cache.get(&"a", t0()), Some(&1));
        assert_eq!(cache.get(&"c", t0()), Some(&3));
    }

    #[test]
    fn test_expired_entries_evicted_before_live_ones() {
        let mut cache = TtlCache::new(2, Duration::minutes(1));
        cache.insert("old", 1, t0());
        let later = t0().plus(Duration::seconds(50));
        cache.insert("live", 2, later);
        assert!(cache.get(&"old", later).is_some());
        let after = t0().plus(Duration::seconds(70));
        cache.insert("new", 3, after);
        assert_eq!(cache.get(&"live", after), Some(&2));
        assert_eq!(cache.get(&"new", after), Some(&3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_replace_refreshes_value_and_expiry() {
        let mut cache = TtlCache::new(2, Duration::minutes(1));
        cache.insert("a", 1, t0());
        let later = t0().plus(Duration::seconds(45));
        cache.insert("a", 2, later);
        assert_eq!(cache.len(), 1);
        let check = t0().plus(Duration::seconds(90));
        assert_eq!(cache.get(&"a", check), Some(&2));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut cache = TtlCache::new(0, Duration::minutes(1));
        cache.insert("a", 1, t0());
        assert!(cache.is_empty());
        assert_eq!(cache.get(&"a", t0()), None);
        assert_eq!(cache.remove(&"a"), None);
        assert_eq!(cache.purge_expired(t0()), 0);
    }

    #[test]
    fn test_full_cache_of_live_entries_evicts_one() {
        let mut cache = TtlCache::new(3, Duration::hours(1));
        for (i, key) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
            cache.insert(key, i, t0());
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&"a", t0()), None);
        assert_eq!(cache.get(&"b", t0()), None);
        assert_eq!(cache.get(&"e", t0()), Some(&4));
    }

    #[test]
    fn test_ttl_past_latest_timestamp_does_not_panic() {
        let mut cache = TtlCache::new(2, Duration::weeks(1_000_000_000));
        cache.insert("a", 1, t0());
        assert_eq!(cache.get(&"a", Timestamp::latest()), None);
    }

    #[test]
    fn test_purge_and_remove() {
        let mut cache = TtlCache::new(8, Duration::minutes(1));
        for (i, key) in ["a", "b", "c"].into_iter().enumerate() {
            cache.insert(key, i, t0());
        }
        assert_eq!(cache.remove(&"b"), Some(1));
        assert_eq!(cache.purge_expired(t0().plus(Duration::minutes(2))), 2);
        assert!(cache.is_empty());
        cache.insert("d", 9, t0());
        cache.clear();
        assert!(cache.is_empty());
    }
}
