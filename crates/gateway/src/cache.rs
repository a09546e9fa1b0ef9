//! # Upstream Response Cache
//!
//! Cache respons upstream yang dipakai HANYA sebagai pengganti ketika
//! upstream membalas HTTP 429 (rate limited).
//!
//! ## Prinsip
//!
//! - Cache BUKAN sumber kebenaran; fresh fetch selalu diutamakan
//! - Entry immutable setelah ditulis, refresh = last-write-wins
//! - Expiry lazy (dicek saat lookup), tidak ada background eviction
//! - Ukuran dibatasi `max_entries`; saat penuh, entry tertua dibuang
//!
//! ## Ownership
//!
//! Cache dimiliki eksplisit oleh aplikasi (`Arc<UpstreamCache>`) dan
//! di-inject ke `UpstreamClient`, bukan state global proses.

use std::collections::HashMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde_json::Value;

/// Default stale-fallback TTL: 10 detik.
pub const DEFAULT_CACHE_TTL_MS: u64 = 10_000;

/// Default bound on the number of `(base, path)` entries.
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 512;

type CacheKey = (String, String);

// ════════════════════════════════════════════════════════════════════════════
// CACHE ENTRY
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Unix milliseconds at which the entry was written.
    pub stored_at_ms: u64,
    pub data: Value,
}

impl CacheEntry {
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.stored_at_ms)
    }

    /// Fresh means age ≤ ttl (inclusive).
    pub fn is_fresh(&self, now_ms: u64, ttl_ms: u64) -> bool {
        self.age_ms(now_ms) <= ttl_ms
    }
}

// ════════════════════════════════════════════════════════════════════════════
// UPSTREAM CACHE
// ════════════════════════════════════════════════════════════════════════════

pub struct UpstreamCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl_ms: u64,
    max_entries: usize,
}

impl fmt::Debug for UpstreamCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamCache")
            .field("entries", &self.len())
            .field("ttl_ms", &self.ttl_ms)
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

impl Default for UpstreamCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL_MS, DEFAULT_CACHE_MAX_ENTRIES)
    }
}

impl UpstreamCache {
    /// Membuat cache kosong. `max_entries` of 0 is treated as 1.
    pub fn new(ttl_ms: u64, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl_ms,
            max_entries: max_entries.max(1),
        }
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Store `data` under `(base, path)` stamped with the current time.
    pub fn store(&self, base: &str, path: &str, data: Value) {
        self.store_at(base, path, data, current_timestamp_ms());
    }

    /// Store with an explicit timestamp.
    pub fn store_at(&self, base: &str, path: &str, data: Value, now_ms: u64) {
        let key = (base.to_string(), path.to_string());
        let mut entries = self.entries.write();

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            let ttl_ms = self.ttl_ms;
            entries.retain(|_, entry| entry.is_fresh(now_ms, ttl_ms));

            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.stored_at_ms)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(key, CacheEntry { stored_at_ms: now_ms, data });
    }

    /// Raw entry regardless of age.
    pub fn entry(&self, base: &str, path: &str) -> Option<CacheEntry> {
        self.entries
            .read()
            .get(&(base.to_string(), path.to_string()))
            .cloned()
    }

    /// Rescue untuk response 429: entry pertama yang ada, `(base, path)`
    /// lalu `(fallback_base, path)`, dan hanya entry itu yang dicek TTL-nya.
    /// Entry `base` yang basi tidak digantikan oleh entry fallback.
    pub fn rescue(&self, base: &str, fallback_base: &str, path: &str) -> Option<Value> {
        self.rescue_at(base, fallback_base, path, current_timestamp_ms())
    }

    pub fn rescue_at(
        &self,
        base: &str,
        fallback_base: &str,
        path: &str,
        now_ms: u64,
    ) -> Option<Value> {
        self.entry(base, path)
            .or_else(|| self.entry(fallback_base, path))
            .filter(|entry| entry.is_fresh(now_ms, self.ttl_ms))
            .map(|entry| entry.data)
    }
}

/// Get current timestamp in Unix milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fresh_at(cache: &UpstreamCache, base: &str, path: &str, now_ms: u64) -> Option<Value> {
        cache.rescue_at(base, base, path, now_ms)
    }

    #[test]
    fn test_fresh_within_ttl_inclusive() {
        let cache = UpstreamCache::new(1_000, 8);
        cache.store_at("http://a", "/x", json!({ "v": 1 }), 5_000);

        assert_eq!(fresh_at(&cache, "http://a", "/x", 5_500), Some(json!({ "v": 1 })));
        assert_eq!(fresh_at(&cache, "http://a", "/x", 6_000), Some(json!({ "v": 1 })));
        assert_eq!(fresh_at(&cache, "http://a", "/x", 6_001), None);
    }

    #[test]
    fn test_keyed_by_base_and_path() {
        let cache = UpstreamCache::new(1_000, 8);
        cache.store_at("http://a", "/x", json!(1), 0);
        cache.store_at("http://b", "/x", json!(2), 0);
        cache.store_at("http://a", "/y", json!(3), 0);

        assert_eq!(cache.len(), 3);
        assert_eq!(fresh_at(&cache, "http://b", "/x", 10), Some(json!(2)));
        assert_eq!(fresh_at(&cache, "http://c", "/x", 10), None);
    }

    #[test]
    fn test_last_write_wins() {
        let cache = UpstreamCache::new(1_000, 8);
        cache.store_at("http://a", "/x", json!("old"), 0);
        cache.store_at("http://a", "/x", json!("new"), 100);

        let entry = cache.entry("http://a", "/x").unwrap();
        assert_eq!(entry.data, json!("new"));
        assert_eq!(entry.stored_at_ms, 100);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_bounded_evicts_expired_then_oldest() {
        let cache = UpstreamCache::new(100, 2);
        cache.store_at("http://a", "/1", json!(1), 0);
        cache.store_at("http://a", "/2", json!(2), 150);

        // /1 is expired at t=200 and is dropped first
        cache.store_at("http://a", "/3", json!(3), 200);
        assert_eq!(cache.len(), 2);
        assert!(cache.entry("http://a", "/1").is_none());

        // nothing expired at t=210: the oldest (/2) goes
        cache.store_at("http://a", "/4", json!(4), 210);
        assert_eq!(cache.len(), 2);
        assert!(cache.entry("http://a", "/2").is_none());
        assert!(cache.entry("http://a", "/3").is_some());
        assert!(cache.entry("http://a", "/4").is_some());
    }

    #[test]
    fn test_rescue_prefers_present_entry_even_if_stale() {
        let cache = UpstreamCache::new(1_000, 8);
        cache.store_at("http://leader", "/q", json!("leader"), 0);
        cache.store_at("http://default", "/q", json!("default"), 5_000);

        // entry leader ada tapi basi: tidak jatuh ke entry default
        assert_eq!(cache.rescue_at("http://leader", "http://default", "/q", 5_500), None);
        assert_eq!(
            cache.rescue_at("http://leader", "http://default", "/q", 500),
            Some(json!("leader"))
        );
        // tanpa entry leader, entry default dipakai
        assert_eq!(
            cache.rescue_at("http://other", "http://default", "/q", 5_500),
            Some(json!("default"))
        );
    }

    #[test]
    fn test_clock_skew_counts_as_fresh() {
        let cache = UpstreamCache::new(10, 4);
        cache.store_at("http://a", "/x", json!(true), 1_000);
        // now earlier than stored_at: age saturates at 0
        assert_eq!(fresh_at(&cache, "http://a", "/x", 900), Some(json!(true)));
    }
}
