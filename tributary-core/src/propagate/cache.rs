//! Affected-Set Cache
//!
//! Maps the exact set of free variables updated in one `compute` call to the
//! ordered list of dependent variables that call had to re-evaluate.
//!
//! The key is the sorted list of the updated variables' graph indices, so the
//! order in which updates were staged does not matter. The cached list is
//! shared behind an `Rc` so a hit costs a reference-count bump.
//!
//! With a capacity set, the cache evicts the oldest inserted key first.

use std::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;
use smallvec::SmallVec;

/// Sorted graph indices of the updated free variables.
pub(crate) type UpdateKey = SmallVec<[usize; 4]>;

/// Counters describing cache effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that required a reachability search.
    pub misses: u64,
    /// Update sets currently cached.
    pub entries: usize,
}

#[derive(Debug)]
pub(crate) struct AffectedCache<V> {
    entries: IndexMap<UpdateKey, Rc<[V]>>,
    capacity: Option<usize>,
    enabled: bool,
    hits: u64,
    misses: u64,
}

impl<V> AffectedCache<V> {
    pub(crate) fn new(enabled: bool, capacity: Option<usize>) -> Self {
        Self {
            entries: IndexMap::new(),
            capacity,
            enabled,
            hits: 0,
            misses: 0,
        }
    }

    /// Look up `key`, or build the list with `build` and remember it.
    pub(crate) fn get_or_insert_with<F>(&mut self, key: UpdateKey, build: F) -> Rc<[V]>
    where
        F: FnOnce() -> Vec<V>,
    {
        if self.enabled {
            if let Some(affected) = self.entries.get(&key) {
                self.hits += 1;
                return Rc::clone(affected);
            }
        }

        self.misses += 1;
        let affected: Rc<[V]> = build().into();

        if self.enabled && self.capacity != Some(0) {
            if let Some(capacity) = self.capacity {
                while self.entries.len() >= capacity {
                    self.entries.shift_remove_index(0);
                }
            }
            self.entries.insert(key, Rc::clone(&affected));
        }

        affected
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}

/// Build a cache key from graph indices in any order.
pub(crate) fn update_key<I>(indices: I) -> UpdateKey
where
    I: IntoIterator<Item = usize>,
{
    let mut key: UpdateKey = indices.into_iter().collect();
    key.sort_unstable();
    key.dedup();
    key
}
