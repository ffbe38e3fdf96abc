//! Internal per-slot object flags.
//!
//! These live in the slot rather than in the object so the collector can
//! read and update them while walking the table without touching object memory.

use bitflags::bitflags;

bitflags! {
    /// Lifecycle and ownership flags stored in every slot.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InternalObjectFlags: u32 {
        /// Reachable through its cluster root.
        const REACHABLE_IN_CLUSTER = 1 << 23;
        /// Root of a collector cluster.
        const CLUSTER_ROOT = 1 << 24;
        /// Defined by native code.
        const NATIVE = 1 << 25;
        /// Created on a worker thread.
        const ASYNC = 1 << 26;
        /// Being loaded asynchronously.
        const ASYNC_LOADING = 1 << 27;
        /// Not reached by the last mark phase.
        const UNREACHABLE = 1 << 28;
        /// Marked for destruction.
        const GARBAGE = 1 << 29;
        /// Member of the root set.
        const ROOT_SET = 1 << 30;
        /// Allocated but constructor not yet finished. Set on every allocation.
        const PENDING_CONSTRUCTION = 1 << 31;
    }
}

impl InternalObjectFlags {
    /// Flags the collector owns.
    pub const GC_FLAGS: Self = Self::UNREACHABLE.union(Self::GARBAGE);
}
