//! In-memory article cache keyed by a hash of the normalized article URL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use metrics::{counter, gauge};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::news::ArticleOutcome;

#[derive(Debug, Clone)]
struct CacheEntry {
    created_at: Instant,
    value: ArticleOutcome,
}

/// Process-wide cache of processed articles. Successes and placeholders are
/// both stored; expiry is absolute (no refresh on hit).
#[derive(Debug)]
pub struct ArticleCache {
    inner: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    high_water: usize,
}

/// Canonical form of an article URL used for keying.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match url::Url::parse(trimmed) {
        Ok(mut u) => {
            u.set_fragment(None);
            // `Url` already lowercases scheme and host.
            let mut s = u.to_string();
            if s.ends_with('/') && u.query().is_none() {
                s.pop();
            }
            s
        }
        Err(_) => trimmed.to_string(),
    }
}

/// Hex SHA-256 of the normalized URL.
pub fn cache_key(url: &str) -> String {
    let digest = Sha256::digest(normalize_url(url).as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

impl ArticleCache {
    pub fn new(ttl: Duration, high_water: usize) -> Self {
        gauge!("article_cache_ttl_secs").set(ttl.as_secs_f64());
        Self {
            inner: Mutex::new(HashMap::new()),
            ttl,
            high_water,
        }
    }

    /// Live entry for `url`, if any. Expired entries are removed on the way.
    pub fn get(&self, url: &str) -> Option<ArticleOutcome> {
        let key = cache_key(url);
        let mut map = self.inner.lock();
        let hit = match map.get(&key) {
            Some(e) if e.created_at.elapsed() < self.ttl => Some(e.value.clone()),
            Some(_) => {
                map.remove(&key);
                None
            }
            None => None,
        };
        gauge!("article_cache_entries").set(map.len() as f64);
        drop(map);

        if hit.is_some() {
            counter!("article_cache_hits_total").increment(1);
        } else {
            counter!("article_cache_misses_total").increment(1);
        }
        hit
    }

    /// Store `value` under `url`, sweeping expired entries first when the map
    /// has grown beyond the high-water mark.
    pub fn insert(&self, url: &str, value: ArticleOutcome) {
        let key = cache_key(url);
        let mut map = self.inner.lock();
        if map.len() >= self.high_water {
            let ttl = self.ttl;
            map.retain(|_, e| e.created_at.elapsed() < ttl);
        }
        map.insert(
            key,
            CacheEntry {
                created_at: Instant::now(),
                value,
            },
        );
        gauge!("article_cache_entries").set(map.len() as f64);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholder(url: &str) -> ArticleOutcome {
        ArticleOutcome::ExtractionFailed {
            title: "t".into(),
            url: url.into(),
            source: "s".into(),
        }
    }

    #[test]
    fn url_normalization_folds_trivial_differences() {
        assert_eq!(
            cache_key("HTTPS://Example.COM/a/#frag"),
            cache_key("https://example.com/a")
        );
        assert_ne!(cache_key("https://example.com/a"), cache_key("https://example.com/b"));
        assert_eq!(normalize_url("  not a url "), "not a url");
    }

    #[test]
    fn hit_then_expiry() {
        let cache = ArticleCache::new(Duration::from_millis(50), 100);
        cache.insert("https://example.com/x", placeholder("https://example.com/x"));
        assert!(cache.get("https://example.com/x").is_some());
        std::thread::sleep(Duration::from_millis(250));
        assert!(cache.get("https://example.com/x").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn high_water_sweeps_expired_on_insert() {
        let cache = ArticleCache::new(Duration::from_millis(50), 2);
        cache.insert("https://example.com/1", placeholder("1"));
        cache.insert("https://example.com/2", placeholder("2"));
        std::thread::sleep(Duration::from_millis(250));
        cache.insert("https://example.com/3", placeholder("3"));
        assert_eq!(cache.len(), 1);
    }
}
