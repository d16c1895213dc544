use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use sha2::{Digest, Sha256};

/// How long an extracted article stays reusable.
pub const ARTICLE_TTL: Duration = Duration::from_secs(5 * 60);
/// Rendered PDF bytes are far more expensive to produce and fully
/// determined by their inputs, so they live longer.
pub const PDF_TTL: Duration = Duration::from_secs(60 * 60);

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Process-local memoization of successful results, one instance per
/// route with its own TTL. A mutex-guarded map is enough at the request
/// volumes this service sees; everything is lost on restart.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, value: V) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }
}

/// Stable cache key: sha256 over the route name and the normalized call
/// arguments, so distinct routes never collide on equal inputs.
pub fn cache_key(route: &str, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(route.as_bytes());
    for part in parts {
        hasher.update([0u8]);
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
