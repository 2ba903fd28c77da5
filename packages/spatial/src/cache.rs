//! Region index memoization.
//!
//! Indexes are expensive to build (a prefecture's dataset can be tens of
//! megabytes) and never change, so they are built once per region code
//! and shared. [`IndexCache`] is the seam for swapping in a bounded cache.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock, RwLock};

use crate::index::RegionIndex;

/// Memoizes built indexes by region code.
pub trait IndexCache: Send + Sync {
    /// Returns the cached index for `region`, if any.
    fn get(&self, region: &str) -> Option<Arc<RegionIndex>>;

    /// Stores `index` for `region` and returns the index now cached.
    ///
    /// When two builds for the same region race, the first insert wins and
    /// later callers get that index back.
    fn insert(&self, region: &str, index: Arc<RegionIndex>) -> Arc<RegionIndex>;
}

/// Keeps every index for the lifetime of the cache. Nothing is evicted.
#[derive(Debug, Default)]
pub struct UnboundedIndexCache {
    indexes: RwLock<BTreeMap<String, Arc<RegionIndex>>>,
}

impl UnboundedIndexCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indexes
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IndexCache for UnboundedIndexCache {
    fn get(&self, region: &str) -> Option<Arc<RegionIndex>> {
        self.indexes
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(region)
            .cloned()
    }

    fn insert(&self, region: &str, index: Arc<RegionIndex>) -> Arc<RegionIndex> {
        self.indexes
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entry(region.to_string())
            .or_insert(index)
            .clone()
    }
}

static GLOBAL: LazyLock<Arc<UnboundedIndexCache>> =
    LazyLock::new(|| Arc::new(UnboundedIndexCache::new()));

/// The process-wide cache shared by every aggregator that does not
/// supply its own.
#[must_use]
pub fn global_index_cache() -> Arc<UnboundedIndexCache> {
    GLOBAL.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_insert_wins() {
        let cache = UnboundedIndexCache::new();
        let first = Arc::new(RegionIndex::from_polygons([]));
        let second = Arc::new(RegionIndex::from_polygons([]));

        let kept = cache.insert("13", first.clone());
        assert!(Arc::ptr_eq(&kept, &first));

        let kept = cache.insert("13", second);
        assert!(Arc::ptr_eq(&kept, &first));
        assert!(Arc::ptr_eq(&cache.get("13").unwrap(), &first));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn misses_are_none() {
        let cache = UnboundedIndexCache::new();
        assert!(cache.get("27").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn global_cache_is_shared() {
        assert!(Arc::ptr_eq(&global_index_cache(), &global_index_cache()));
    }
}
