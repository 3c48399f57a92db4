//! Single-entry read cache for one JSON document.
//!
//! An entry remembers the data, when it was loaded and the document's
//! modification time at that moment. It is served only while the document's
//! current mtime has not advanced past the recorded one and the entry is
//! younger than the configured maximum age.

use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant, SystemTime};

pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(300);

struct CachedDocument<T> {
    data: T,
    loaded_at: Instant,
    source_mtime: Option<SystemTime>,
}

/// Snapshot of one cache, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatus {
    pub cached: bool,
    pub age: Option<Duration>,
    pub hits: u64,
    pub misses: u64,
}

pub struct DocumentCache<T> {
    entry: RefCell<Option<CachedDocument<T>>>,
    max_age: Duration,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl<T: Clone> DocumentCache<T> {
    pub fn new(max_age: Duration) -> Self {
        Self {
            entry: RefCell::new(None),
            max_age,
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    /// Returns a copy of the cached data if still valid for `current_mtime`.
    pub fn get(&self, current_mtime: Option<SystemTime>) -> Option<T> {
        let entry = self.entry.borrow();
        let fresh = entry.as_ref().and_then(|cached| {
            let unchanged = match (current_mtime, cached.source_mtime) {
                (Some(current), Some(recorded)) => current <= recorded,
                _ => false,
            };
            let young = cached.loaded_at.elapsed() < self.max_age;
            (unchanged && young).then(|| cached.data.clone())
        });
        match fresh {
            Some(_) => self.hits.set(self.hits.get() + 1),
            None => self.misses.set(self.misses.get() + 1),
        }
        fresh
    }

    pub fn store(&self, data: T, source_mtime: Option<SystemTime>) {
        *self.entry.borrow_mut() = Some(CachedDocument {
            data,
            loaded_at: Instant::now(),
            source_mtime,
        });
    }

    pub fn invalidate(&self) {
        *self.entry.borrow_mut() = None;
    }

    pub fn status(&self) -> CacheStatus {
        let entry = self.entry.borrow();
        CacheStatus {
            cached: entry.is_some(),
            age: entry.as_ref().map(|c| c.loaded_at.elapsed()),
            hits: self.hits.get(),
            misses: self.misses.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn t(secs: u64) -> Option<SystemTime> {
        Some(UNIX_EPOCH + Duration::from_secs(secs))
    }

    #[test]
    fn empty_cache_misses() {
        let cache: DocumentCache<Vec<u32>> = DocumentCache::new(DEFAULT_MAX_AGE);
        assert_eq!(cache.get(t(1)), None);
        assert_eq!(cache.status().misses, 1);
        assert!(!cache.status().cached);
    }

    #[test]
    fn serves_while_mtime_unchanged() {
        let cache = DocumentCache::new(DEFAULT_MAX_AGE);
        cache.store(vec![1, 2], t(10));
        assert_eq!(cache.get(t(10)), Some(vec![1, 2]));
        assert_eq!(cache.get(t(9)), Some(vec![1, 2]));
        assert_eq!(cache.status().hits, 2);
    }

    #[test]
    fn newer_mtime_or_missing_file_invalidates() {
        let cache = DocumentCache::new(DEFAULT_MAX_AGE);
        cache.store(vec![1], t(10));
        assert_eq!(cache.get(t(11)), None);
        assert_eq!(cache.get(None), None);
    }

    #[test]
    fn zero_max_age_never_serves() {
        let cache = DocumentCache::new(Duration::ZERO);
        cache.store(vec![1], t(10));
        assert_eq!(cache.get(t(10)), None);
    }

    #[test]
    fn invalidate_drops_entry() {
        let cache = DocumentCache::new(DEFAULT_MAX_AGE);
        cache.store(vec![1], t(10));
        cache.invalidate();
        assert_eq!(cache.get(t(10)), None);
        assert!(!cache.status().cached);
    }
}
