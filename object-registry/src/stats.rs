//! Allocation counters.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Point-in-time registry statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Successful allocations.
    pub allocations: u64,
    /// Successful frees.
    pub frees: u64,
    /// Allocations served from the free list.
    pub recycled: u64,
    /// Objects currently registered.
    pub live_objects: usize,
    /// Highest `live_objects` seen.
    pub peak_live_objects: usize,
    /// Slots currently addressable.
    pub table_len: usize,
    /// Indices waiting on the free list.
    pub free_list_len: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    allocations: AtomicU64,
    frees: AtomicU64,
    recycled: AtomicU64,
    live: AtomicUsize,
    peak_live: AtomicUsize,
}

impl Counters {
    pub(crate) fn record_allocation(&self, recycled: bool) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        if recycled {
            self.recycled.fetch_add(1, Ordering::Relaxed);
        }
        let live = self.live.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_live.fetch_max(live, Ordering::Relaxed);
    }

    pub(crate) fn record_free(&self) {
        self.frees.fetch_add(1, Ordering::Relaxed);
        self.live.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn live(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    pub(crate) fn snapshot(&self, table_len: usize, free_list_len: usize) -> RegistryStats {
        RegistryStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
            recycled: self.recycled.load(Ordering::Relaxed),
            live_objects: self.live(),
            peak_live_objects: self.peak_live.load(Ordering::Relaxed),
            table_len,
            free_list_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let counters = Counters::default();
        counters.record_allocation(false);
        counters.record_allocation(false);
        counters.record_free();
        counters.record_allocation(true);

        let stats = counters.snapshot(2, 0);
        assert_eq!(stats.allocations, 3);
        assert_eq!(stats.frees, 1);
        assert_eq!(stats.recycled, 1);
        assert_eq!(stats.live_objects, 2);
        assert_eq!(stats.peak_live_objects, 2);
        assert_eq!(stats.table_len, 2);
    }
}
