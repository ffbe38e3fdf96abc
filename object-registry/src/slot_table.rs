//! # Slot Table
//!
//! Fixed-capacity, index-addressed storage for registry slots.
//!
//! ## Design
//!
//! Slots never move once created: the collector and validity checks read
//! them without taking the array lock while allocation appends new ones.
//! Storage is therefore split into fixed-size chunks, each materialized at
//! most once through a `OnceLock`. A pre-allocated table materializes every
//! chunk up front; otherwise chunks appear as the logical length reaches them.
//!
//! Growth (`append_range`, `append_single`) must be serialized by the caller;
//! the registry only calls it while holding its array lock.

use std::fmt;
use std::sync::atomic::{AtomicI32, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::RwLock;
use thiserror::Error;

use crate::error::{fatal, FatalError};
use crate::flags::InternalObjectFlags;
use crate::object::{same_object, ManagedObject, ObjectIndex, ObjectRef};

/// Number of slots per storage chunk.
pub const SLOTS_PER_CHUNK: usize = 64 * 1024;

/// Cluster-root value of a slot outside any cluster.
pub const CLUSTER_ROOT_NONE: ObjectIndex = 0;

/// The table cannot hold the requested number of additional slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("slot table full: capacity {capacity}, {requested} more slot(s) requested")]
pub struct CapacityExceeded {
    /// Hard maximum of the table.
    pub capacity: usize,
    /// Slots the failing request needed.
    pub requested: usize,
}

/// What an occupied slot holds.
struct Occupant {
    object: Weak<dyn ManagedObject>,
    /// Diagnostic name, computed on first request. First writer wins.
    stat_name: OnceLock<Arc<str>>,
}

/// One registry entry.
pub struct Slot {
    occupant: RwLock<Option<Occupant>>,
    flags: AtomicU32,
    cluster_root_index: AtomicI32,
    serial_number: AtomicU32,
}

impl Slot {
    fn new() -> Self {
        Self {
            occupant: RwLock::new(None),
            flags: AtomicU32::new(0),
            cluster_root_index: AtomicI32::new(CLUSTER_ROOT_NONE),
            serial_number: AtomicU32::new(0),
        }
    }

    /// Whether an object is published in this slot.
    pub fn is_occupied(&self) -> bool {
        self.occupant.read().is_some()
    }

    /// The published object, if any and still alive.
    pub fn object(&self) -> Option<ObjectRef> {
        self.occupant.read().as_ref()?.object.upgrade()
    }

    /// Whether this slot holds exactly `object`.
    pub fn holds(&self, object: &dyn ManagedObject) -> bool {
        self.occupant
            .read()
            .as_ref()
            .is_some_and(|occ| same_object(occ.object.as_ptr(), object))
    }

    /// Current flags.
    pub fn flags(&self) -> InternalObjectFlags {
        InternalObjectFlags::from_bits_retain(self.flags.load(Ordering::Acquire))
    }

    /// Set `flags` in addition to the current ones.
    pub fn set_flags(&self, flags: InternalObjectFlags) {
        self.flags.fetch_or(flags.bits(), Ordering::AcqRel);
    }

    /// Clear `flags`, keeping the others.
    pub fn clear_flags(&self, flags: InternalObjectFlags) {
        self.flags.fetch_and(!flags.bits(), Ordering::AcqRel);
    }

    /// Whether any of `flags` is set.
    pub fn has_any_flags(&self, flags: InternalObjectFlags) -> bool {
        self.flags().intersects(flags)
    }

    /// Index of this slot's cluster root.
    pub fn cluster_root_index(&self) -> ObjectIndex {
        self.cluster_root_index.load(Ordering::Acquire)
    }

    /// Attach this slot to a cluster root.
    pub fn set_cluster_root_index(&self, root: ObjectIndex) {
        self.cluster_root_index.store(root, Ordering::Release);
    }

    /// Current serial number, 0 if none was assigned.
    pub fn serial_number(&self) -> u32 {
        self.serial_number.load(Ordering::Acquire)
    }

    pub(crate) fn serial_cell(&self) -> &AtomicU32 {
        &self.serial_number
    }

    /// Publish `object`. Returns `false`, leaving the slot untouched, if the
    /// slot is already occupied.
    pub(crate) fn publish(
        &self,
        object: Weak<dyn ManagedObject>,
        flags: InternalObjectFlags,
        serial_number: u32,
    ) -> bool {
        let mut occupant = self.occupant.write();
        if occupant.is_some() {
            return false;
        }
        self.flags.store(flags.bits(), Ordering::Release);
        self.cluster_root_index
            .store(CLUSTER_ROOT_NONE, Ordering::Release);
        self.serial_number.store(serial_number, Ordering::Release);
        *occupant = Some(Occupant {
            object,
            stat_name: OnceLock::new(),
        });
        true
    }

    pub(crate) fn clear(&self) {
        let mut occupant = self.occupant.write();
        *occupant = None;
        self.flags.store(0, Ordering::Release);
        self.cluster_root_index
            .store(CLUSTER_ROOT_NONE, Ordering::Release);
        self.serial_number.store(0, Ordering::Release);
    }

    pub(crate) fn cached_stat_name(&self) -> Option<Arc<str>> {
        self.occupant.read().as_ref()?.stat_name.get().cloned()
    }

    /// Cache `name` for `object` unless another caller got there first,
    /// returning whichever name won. Nothing is cached if the slot no
    /// longer holds `object`.
    pub(crate) fn cache_stat_name(&self, object: &dyn ManagedObject, name: Arc<str>) -> Arc<str> {
        let occupant = self.occupant.read();
        match occupant.as_ref() {
            Some(occ) if same_object(occ.object.as_ptr(), object) => {
                occ.stat_name.get_or_init(|| name).clone()
            }
            _ => name,
        }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("occupied", &self.is_occupied())
            .field("flags", &self.flags())
            .field("cluster_root_index", &self.cluster_root_index())
            .field("serial_number", &self.serial_number())
            .finish()
    }
}

/// Chunked, append-only table of [`Slot`]s.
pub struct SlotTable {
    chunks: Box<[OnceLock<Box<[Slot]>>]>,
    capacity: usize,
    len: AtomicUsize,
}

impl SlotTable {
    /// Reserve storage for up to `capacity` slots, materializing all of it
    /// immediately when `preallocate` is set.
    pub fn reserve(capacity: usize, preallocate: bool) -> Self {
        if capacity == 0 {
            fatal(FatalError::InvalidCapacity(0));
        }

        let chunk_count = capacity.div_ceil(SLOTS_PER_CHUNK);
        let table = Self {
            chunks: (0..chunk_count).map(|_| OnceLock::new()).collect(),
            capacity,
            len: AtomicUsize::new(0),
        };

        if preallocate {
            for chunk in 0..chunk_count {
                table.materialize(chunk);
            }
        }
        table
    }

    fn materialize(&self, chunk: usize) -> &[Slot] {
        self.chunks[chunk].get_or_init(|| {
            let first = chunk * SLOTS_PER_CHUNK;
            let count = SLOTS_PER_CHUNK.min(self.capacity - first);
            (0..count).map(|_| Slot::new()).collect()
        })
    }

    /// Grow the logical length by `count`, returning the first new index.
    pub(crate) fn append_range(&self, count: usize) -> Result<usize, CapacityExceeded> {
        let first = self.len.load(Ordering::Acquire);
        if count > self.capacity - first {
            return Err(CapacityExceeded {
                capacity: self.capacity,
                requested: count,
            });
        }
        let end = first + count;
        if end > 0 {
            for chunk in first / SLOTS_PER_CHUNK..=(end - 1) / SLOTS_PER_CHUNK {
                self.materialize(chunk);
            }
        }
        self.len.store(end, Ordering::Release);
        Ok(first)
    }

    /// Grow the logical length by one, returning the new index.
    pub(crate) fn append_single(&self) -> Result<ObjectIndex, CapacityExceeded> {
        self.append_range(1).map(|index| index as ObjectIndex)
    }

    /// Number of slots currently addressable.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Whether no slot has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hard maximum number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of chunks with backing storage.
    pub fn materialized_chunks(&self) -> usize {
        self.chunks.iter().filter(|c| c.get().is_some()).count()
    }

    /// Bounds-checked access.
    pub fn get(&self, index: ObjectIndex) -> Option<&Slot> {
        let index = usize::try_from(index).ok()?;
        if index >= self.len() {
            return None;
        }
        self.chunks[index / SLOTS_PER_CHUNK]
            .get()
            .map(|chunk| &chunk[index % SLOTS_PER_CHUNK])
    }

    /// Access for call sites that assume `index` is valid.
    #[track_caller]
    pub fn at(&self, index: ObjectIndex) -> &Slot {
        match self.get(index) {
            Some(slot) => slot,
            None => fatal(FatalError::IndexOutOfRange {
                index,
                len: self.len(),
            }),
        }
    }

    /// All addressable slots with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectIndex, &Slot)> + '_ {
        let len = self.len();
        self.chunks
            .iter()
            .map_while(|chunk| chunk.get())
            .flat_map(|chunk| chunk.iter())
            .take(len)
            .enumerate()
            .map(|(index, slot)| (index as ObjectIndex, slot))
    }

    /// Occupied slots with their live objects.
    pub fn iter_live(&self) -> impl Iterator<Item = (ObjectIndex, &Slot, ObjectRef)> + '_ {
        self.iter()
            .filter_map(|(index, slot)| slot.object().map(|object| (index, slot, object)))
    }
}

impl fmt::Debug for SlotTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotTable")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("materialized_chunks", &self.materialized_chunks())
            .finish()
    }
}
