//! Per-declaration memoization of parsed annotation maps.

use crate::annotation::AnnotationMap;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Thread-safe cache keyed by canonical declaration identity.
///
/// Each identity is parsed at most once; later lookups hand out clones of
/// the same `Arc`, so callers can hold results without blocking the cache.
#[derive(Debug, Default)]
pub struct AnnotationCache {
    entries: RwLock<HashMap<String, Arc<AnnotationMap>>>,
}

impl AnnotationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the map for `identity`, computing and storing it on first use.
    ///
    /// `compute` runs under the write lock, so concurrent callers racing on
    /// the same identity still parse it only once. A poisoned lock is
    /// recovered rather than propagated; the map data stays valid because
    /// no writer mutates a stored map in place.
    pub fn get_or_parse<F>(&self, identity: &str, compute: F) -> Arc<AnnotationMap>
    where
        F: FnOnce() -> AnnotationMap,
    {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(map) = entries.get(identity) {
                return Arc::clone(map);
            }
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(map) = entries.get(identity) {
            return Arc::clone(map);
        }
        let map = Arc::new(compute());
        entries.insert(identity.to_string(), Arc::clone(&map));
        map
    }

    /// Look up an already-cached identity without computing anything.
    pub fn get(&self, identity: &str) -> Option<Arc<AnnotationMap>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(identity).map(Arc::clone)
    }

    /// Number of cached declarations.
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached entry. Outstanding `Arc`s stay usable.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_computes_once_per_identity() {
        let cache = AnnotationCache::new();
        let calls = AtomicUsize::new(0);
        let parse = || {
            calls.fetch_add(1, Ordering::SeqCst);
            crate::parser::parse_comment("@package demo")
        };
        let first = cache.get_or_parse("app.Demo", parse);
        let second = cache.get_or_parse("app.Demo", || {
            calls.fetch_add(1, Ordering::SeqCst);
            AnnotationMap::new()
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.get("package"), Some("demo"));
    }

    #[test]
    fn test_distinct_identities_are_cached_separately() {
        let cache = AnnotationCache::new();
        cache.get_or_parse("app.A", || crate::parser::parse_comment("@x 1"));
        cache.get_or_parse("app.B", || crate::parser::parse_comment("@x 2"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("app.A").unwrap().get("x"), Some("1"));
        assert_eq!(cache.get("app.B").unwrap().get("x"), Some("2"));
    }

    #[test]
    fn test_get_misses_do_not_populate() {
        let cache = AnnotationCache::new();
        assert!(cache.get("app.Missing").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_leaves_existing_handles_alive() {
        let cache = AnnotationCache::new();
        let map = cache.get_or_parse("app.A", || crate::parser::parse_comment("@keep me"));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(map.get("keep"), Some("me"));
    }

    #[test]
    fn test_concurrent_lookups_share_one_parse() {
        let cache = Arc::new(AnnotationCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(std::thread::spawn(move || {
                cache.get_or_parse("app.Shared", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    crate::parser::parse_comment("@shared yes")
                })
            }));
        }
        let maps: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for map in &maps {
            assert!(Arc::ptr_eq(map, &maps[0]));
        }
    }
}
