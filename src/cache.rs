//! HTTP response cache for public GET endpoints
//!
//! Cache-aside: the middleware answers from the cache when it can, otherwise
//! runs the handler and stores successful responses. Keys are
//! `cache:{namespace}:{path}:{query}`, where the namespace is the path segment
//! after `/api/`, so a content change can drop a whole namespace at once.

use arc_swap::ArcSwap;
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::error::AppError;
use crate::metrics;

/// Responses larger than this are passed through uncached
const MAX_CACHED_BODY: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
struct CacheSettings {
    enabled: bool,
    default_ttl: Duration,
    stale_window: Duration,
    max_entries: usize,
    namespace_ttls: HashMap<String, Duration>,
}

impl From<&CacheConfig> for CacheSettings {
    fn from(config: &CacheConfig) -> Self {
        Self {
            enabled: config.enabled,
            default_ttl: Duration::from_secs(config.default_ttl_seconds),
            stale_window: Duration::from_secs(config.stale_seconds),
            max_entries: config.max_entries.max(1),
            namespace_ttls: config
                .namespaces
                .iter()
                .map(|(ns, ttl)| (ns.clone(), Duration::from_secs(*ttl)))
                .collect(),
        }
    }
}

impl CacheSettings {
    fn ttl_for(&self, namespace: &str) -> Duration {
        self.namespace_ttls
            .get(namespace)
            .copied()
            .unwrap_or(self.default_ttl)
    }
}

#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub body: Bytes,
    pub content_type: Option<HeaderValue>,
    inserted_at: Instant,
    stale_at: Instant,
    expires_at: Instant,
}

impl CachedResponse {
    fn remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

#[derive(Debug, Clone)]
pub enum CacheLookup {
    Hit(CachedResponse),
    /// Inside the stale window; served once and already evicted
    Stale(CachedResponse),
    Miss,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub enabled: bool,
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub stale_hits: u64,
    pub hit_rate: f64,
}

/// Concurrent in-memory response cache
pub struct ResponseCache {
    entries: DashMap<String, CachedResponse>,
    settings: ArcSwap<CacheSettings>,
    hits: AtomicU64,
    misses: AtomicU64,
    stale_hits: AtomicU64,
}

impl ResponseCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            settings: ArcSwap::from_pointee(CacheSettings::from(config)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stale_hits: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.load().enabled
    }

    /// Apply new settings and drop everything cached under the old ones
    pub fn reconfigure(&self, config: &CacheConfig) {
        self.settings.store(Arc::new(CacheSettings::from(config)));
        self.clear();
    }

    pub fn lookup(&self, key: &str) -> CacheLookup {
        self.lookup_at(key, Instant::now())
    }

    fn lookup_at(&self, key: &str, now: Instant) -> CacheLookup {
        let entry = match self.entries.get(key) {
            Some(entry) => entry.clone(),
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return CacheLookup::Miss;
            }
        };

        if now >= entry.expires_at {
            self.entries.remove(key);
            self.misses.fetch_add(1, Ordering::Relaxed);
            CacheLookup::Miss
        } else if now >= entry.stale_at {
            self.entries.remove(key);
            self.stale_hits.fetch_add(1, Ordering::Relaxed);
            CacheLookup::Stale(entry)
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
            CacheLookup::Hit(entry)
        }
    }

    /// Store a response body under `key`; returns the TTL applied
    pub fn insert(
        &self,
        key: String,
        namespace: &str,
        body: Bytes,
        content_type: Option<HeaderValue>,
    ) -> Duration {
        let settings = self.settings.load();
        let ttl = settings.ttl_for(namespace);
        if ttl.is_zero() {
            return ttl;
        }

        if self.entries.len() >= settings.max_entries && !self.entries.contains_key(&key) {
            self.make_room(settings.max_entries);
        }

        let now = Instant::now();
        // short-lived namespaces never spend more than half their life stale
        let stale_window = settings.stale_window.min(ttl / 2);
        self.entries.insert(
            key,
            CachedResponse {
                body,
                content_type,
                inserted_at: now,
                stale_at: now + (ttl - stale_window),
                expires_at: now + ttl,
            },
        );
        ttl
    }

    fn make_room(&self, max_entries: usize) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);

        while self.entries.len() >= max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.inserted_at)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Drop every entry of a namespace; returns how many were removed
    pub fn invalidate_namespace(&self, namespace: &str) -> usize {
        let prefix = format!("cache:{}:", namespace);
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(&prefix));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(namespace = %namespace, removed = removed, "Cache namespace invalidated");
        }
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let stale_hits = self.stale_hits.load(Ordering::Relaxed);
        let lookups = hits + misses + stale_hits;

        CacheStats {
            enabled: self.is_enabled(),
            entries: self.entries.len(),
            hits,
            misses,
            stale_hits,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                (hits + stale_hits) as f64 / lookups as f64
            },
        }
    }
}

/// Path segment after `/api/`
pub fn namespace_of(path: &str) -> Option<&str> {
    path.strip_prefix("/api/")?
        .split('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

pub fn cache_key(namespace: &str, path: &str, query: Option<&str>) -> String {
    format!("cache:{}:{}:{}", namespace, path, query.unwrap_or(""))
}

/// Cache-aside middleware for GET routes under `/api/`
pub async fn cache_middleware(
    State(cache): State<Arc<ResponseCache>>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET || !cache.is_enabled() {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    let Some(namespace) = namespace_of(&path).map(str::to_string) else {
        return next.run(request).await;
    };
    let key = cache_key(&namespace, &path, request.uri().query());

    match cache.lookup(&key) {
        CacheLookup::Hit(entry) => {
            metrics::record_cache(&namespace, "hit");
            let ttl = entry.remaining(Instant::now());
            return cached_response(entry, "HIT", ttl);
        }
        CacheLookup::Stale(entry) => {
            metrics::record_cache(&namespace, "stale");
            let ttl = entry.remaining(Instant::now());
            return cached_response(entry, "STALE", ttl);
        }
        CacheLookup::Miss => metrics::record_cache(&namespace, "miss"),
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_CACHED_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, path = %path, "Failed to buffer response for caching");
            return AppError::InternalError(format!("Failed to read response body: {}", e))
                .into_response();
        }
    };

    let content_type = parts.headers.get(header::CONTENT_TYPE).cloned();
    let ttl = cache.insert(key, &namespace, bytes.clone(), content_type);

    parts.headers.insert("x-cache", HeaderValue::from_static("MISS"));
    parts
        .headers
        .insert("x-cache-ttl", HeaderValue::from(ttl.as_secs()));
    Response::from_parts(parts, Body::from(bytes))
}

fn cached_response(entry: CachedResponse, status: &'static str, ttl: Duration) -> Response {
    let mut response = (StatusCode::OK, entry.body).into_response();
    let headers = response.headers_mut();
    if let Some(content_type) = entry.content_type {
        headers.insert(header::CONTENT_TYPE, content_type);
    }
    headers.insert("x-cache", HeaderValue::from_static(status));
    headers.insert("x-cache-ttl", HeaderValue::from(ttl.as_secs()));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CacheConfig {
        CacheConfig {
            default_ttl_seconds: 100,
            stale_seconds: 20,
            max_entries: 3,
            ..CacheConfig::default()
        }
    }

    #[test]
    fn test_namespace_of() {
        assert_eq!(namespace_of("/api/models-with-pricing"), Some("models-with-pricing"));
        assert_eq!(namespace_of("/api/brands/b1"), Some("brands"));
        assert_eq!(namespace_of("/api/"), None);
        assert_eq!(namespace_of("/health"), None);
    }

    #[test]
    fn test_hit_stale_then_miss() {
        let cache = ResponseCache::new(&config());
        let key = cache_key("widgets", "/api/widgets", Some("a=1"));
        cache.insert(key.clone(), "widgets", Bytes::from_static(b"{}"), None);

        let now = Instant::now();
        assert!(matches!(cache.lookup_at(&key, now), CacheLookup::Hit(_)));
        // 100s ttl, 20s stale window
        assert!(matches!(
            cache.lookup_at(&key, now + Duration::from_secs(90)),
            CacheLookup::Stale(_)
        ));
        assert!(matches!(cache.lookup_at(&key, now), CacheLookup::Miss));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.stale_hits, stats.misses), (1, 1, 1));
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = ResponseCache::new(&config());
        cache.insert("k".to_string(), "widgets", Bytes::from_static(b"x"), None);

        let later = Instant::now() + Duration::from_secs(101);
        assert!(matches!(cache.lookup_at("k", later), CacheLookup::Miss));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_namespace_ttl_and_invalidation() {
        let cache = ResponseCache::new(&CacheConfig::default());
        assert_eq!(cache.settings.load().ttl_for("brands"), Duration::from_secs(3600));
        assert_eq!(cache.settings.load().ttl_for("unknown"), Duration::from_secs(300));

        cache.insert(cache_key("brands", "/api/brands", None), "brands", Bytes::new(), None);
        cache.insert(cache_key("models", "/api/models", None), "models", Bytes::new(), None);

        assert_eq!(cache.invalidate_namespace("brands"), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.invalidate_namespace("brands"), 0);
    }

    #[test]
    fn test_bounded_by_max_entries() {
        let cache = ResponseCache::new(&config());
        for i in 0..5 {
            cache.insert(format!("cache:w:/api/w:{}", i), "w", Bytes::new(), None);
        }
        assert_eq!(cache.len(), 3);
        assert!(matches!(cache.lookup("cache:w:/api/w:4"), CacheLookup::Hit(_)));
    }

    #[test]
    fn test_reconfigure_clears() {
        let cache = ResponseCache::new(&config());
        cache.insert("k".to_string(), "w", Bytes::new(), None);

        let disabled = CacheConfig {
            enabled: false,
            ..config()
        };
        cache.reconfigure(&disabled);
        assert!(cache.is_empty());
        assert!(!cache.is_enabled());
    }
}
