//! Response cache — time-boxed memoization of completion results keyed by
//! (operation, parameters).
//!
//! Intentionally process-local with no persistence: staleness past a restart
//! is cheaper than serving stale cross-deployment data. A cache hit freezes
//! one particular non-deterministic upstream answer for the TTL window —
//! a deliberate consistency/latency tradeoff.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

/// Injectable time source so TTL behavior is testable without sleeping.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

struct CacheEntry {
    payload: Value,
    stored_at: DateTime<Utc>,
}

pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Clock,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(Utc::now))
    }

    pub fn with_clock(ttl: Duration, clock: Clock) -> Self {
        ResponseCache {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Cache key for an operation and its parameters.
    ///
    /// serde_json's default `Map` is BTree-backed, so structurally-equal
    /// parameter objects serialize identically regardless of the order their
    /// properties were inserted in. Non-canonical keys here would silently
    /// collapse the hit rate to zero.
    fn key(operation: &str, params: &Value) -> String {
        format!("{operation}:{params}")
    }

    /// Returns the cached payload, or `None` if the key is absent or its
    /// entry has outlived the TTL. Expired entries are left in place and
    /// overwritten by the next `set` on the same key (lazy expiry — no
    /// background sweep).
    pub fn get(&self, operation: &str, params: &Value) -> Option<Value> {
        let key = Self::key(operation, params);
        let entries = self.entries.lock().expect("cache lock poisoned");
        let entry = entries.get(&key)?;
        if (self.clock)() - entry.stored_at >= self.ttl {
            return None;
        }
        Some(entry.payload.clone())
    }

    /// Stores a payload. Last writer wins on identical keys — payloads for
    /// identical keys are expected to be semantically equivalent.
    pub fn set(&self, operation: &str, params: &Value, payload: Value) {
        let key = Self::key(operation, params);
        let stored_at = (self.clock)();
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(key, CacheEntry { payload, stored_at });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// A clock the test advances by hand.
    fn manual_clock() -> (Clock, Arc<AtomicI64>) {
        let offset_secs = Arc::new(AtomicI64::new(0));
        let offset = Arc::clone(&offset_secs);
        let base = Utc::now();
        let clock: Clock =
            Arc::new(move || base + Duration::seconds(offset.load(Ordering::SeqCst)));
        (clock, offset_secs)
    }

    #[test]
    fn test_set_then_get_round_trips() {
        let cache = ResponseCache::new(Duration::minutes(30));
        let params = json!({"query": "transformers"});
        cache.set("search", &params, json!({"papers": []}));
        assert_eq!(cache.get("search", &params), Some(json!({"papers": []})));
    }

    #[test]
    fn test_get_misses_on_unknown_key() {
        let cache = ResponseCache::new(Duration::minutes(30));
        assert_eq!(cache.get("search", &json!({"query": "x"})), None);
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let (clock, offset) = manual_clock();
        let cache = ResponseCache::with_clock(Duration::minutes(30), clock);
        let params = json!({"query": "x"});
        cache.set("search", &params, json!(1));

        offset.store(29 * 60, Ordering::SeqCst);
        assert_eq!(cache.get("search", &params), Some(json!(1)));

        offset.store(30 * 60, Ordering::SeqCst);
        assert_eq!(cache.get("search", &params), None);
    }

    #[test]
    fn test_expired_entry_is_overwritten_by_next_set() {
        let (clock, offset) = manual_clock();
        let cache = ResponseCache::with_clock(Duration::minutes(30), clock);
        let params = json!({"query": "x"});
        cache.set("search", &params, json!("old"));

        offset.store(31 * 60, Ordering::SeqCst);
        assert_eq!(cache.get("search", &params), None);
        cache.set("search", &params, json!("new"));
        assert_eq!(cache.get("search", &params), Some(json!("new")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_key_is_insertion_order_independent() {
        // Structurally equal objects built in different property orders
        // must land on the same key.
        let mut forward = serde_json::Map::new();
        forward.insert("a".to_string(), json!(1));
        forward.insert("b".to_string(), json!(2));
        let mut reverse = serde_json::Map::new();
        reverse.insert("b".to_string(), json!(2));
        reverse.insert("a".to_string(), json!(1));

        let cache = ResponseCache::new(Duration::minutes(30));
        cache.set("op", &Value::Object(forward), json!("hit"));
        assert_eq!(cache.get("op", &Value::Object(reverse)), Some(json!("hit")));
    }

    #[test]
    fn test_operations_do_not_share_keys() {
        let cache = ResponseCache::new(Duration::minutes(30));
        let params = json!({"q": "x"});
        cache.set("search", &params, json!("a"));
        assert_eq!(cache.get("match", &params), None);
    }

    #[test]
    fn test_last_writer_wins_on_same_key() {
        let cache = ResponseCache::new(Duration::minutes(30));
        let params = json!({"q": "x"});
        cache.set("search", &params, json!("first"));
        cache.set("search", &params, json!("second"));
        assert_eq!(cache.get("search", &params), Some(json!("second")));
    }
}
