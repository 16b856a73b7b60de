//! Lock-free activity counters for [`RequestCache`](super::RequestCache).
//!
//! Counters are relaxed atomics; a [`CacheStats`] snapshot is not a
//! consistent cut across fields while other tasks are writing.

use std::sync::atomic::{AtomicU64, Ordering};

/// A point-in-time snapshot of cache activity counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads answered from the cache without touching the transport.
    pub hits: u64,
    /// Reads that had to go to the transport.
    pub misses: u64,
    /// Entries written from successful transport calls.
    pub stores: u64,
    /// Entries removed by expiry sweeps or explicit invalidation.
    pub evictions: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    evictions: AtomicU64,
}

impl Counters {
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn store(&self) {
        self.stores.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn evict(&self, count: usize) {
        self.evictions.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
