//! # Object Registry
//!
//! Hands out stable indices to managed objects and answers "is index I still
//! the object handle H was taken from".
//!
//! ## Index Space
//!
//! ```text
//!  0                 last_non_gc   first_gc                     len
//!  ├──── disregard pool ───┤ slack ├──── general pool ───────────┤
//!  │ permanent, never      │       │ collector-eligible,         │
//!  │ recycled              │       │ recycled through free list  │
//! ```
//!
//! The disregard pool is a prefix filled sequentially while it is open.
//! Closing it freezes `first_gc_index` just past the last used disregard
//! index; the unused tail of the reservation stays as slack that a later
//! reopen can fill. The general pool pops the free list first and otherwise
//! appends.
//!
//! ## Locking
//!
//! Index selection, publish and clear run under the array lock (see
//! [`crate::sync`]). Listener callbacks and close hooks always run with no
//! registry lock held, so they may allocate. Serial numbers are assigned with
//! a per-slot compare-and-swap instead of the array lock.
//!
//! ## Thread Roles
//!
//! The thread that builds the registry is its owner. One collector thread
//! may be designated with [`ObjectRegistry::set_collector_thread`]. Freeing
//! and closing or disabling the disregard pool are restricted to these two;
//! opening the pool to the owner alone.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::RwLock;

use crate::census::CensusReport;
use crate::config::RegistryConfig;
use crate::error::{fatal, FatalError, InvalidObject};
use crate::flags::InternalObjectFlags;
use crate::handle::{WeakObjectHandle, START_SERIAL_NUMBER};
use crate::listener::{CreateListener, DeleteListener, ListenerRegistry};
use crate::log::{self, LogBuilder, LogLevel};
use crate::naming;
use crate::object::{ManagedObject, ObjectIndex, ObjectRef, INDEX_NONE};
use crate::slot_table::{CapacityExceeded, SlotTable};
use crate::stats::{Counters, RegistryStats};
use crate::sync::{ArrayGuard, ArrayMutex, LockStrategy, SingleThreadLock, ThreadedLock};

/// Steps run by [`ObjectRegistry::close_disregard_pool`] before the boundary
/// is frozen. Both run while the pool is still open, with no registry lock
/// held, so objects they create land in the disregard pool.
pub trait DisregardPoolHooks: Send + Sync {
    /// Finish constructing objects whose static initialization was deferred.
    fn flush_deferred_construction(&self) {}

    /// Finalize type reference layouts used for later scanning.
    fn finalize_reference_layouts(&self) {}
}

/// Called with the census when the table is full, just before the fatal error.
pub type OverflowHandler = Arc<dyn Fn(&CensusReport) + Send + Sync>;

/// Exclusive structural access to the slot table.
///
/// Allocation and free block while this is held. With [`SingleThreadLock`]
/// they are fatal instead, so drop the guard before freeing what the
/// iteration found.
pub struct ArrayLock<'a, R: LockStrategy> {
    slots: &'a SlotTable,
    _guard: ArrayGuard<'a, R, Vec<ObjectIndex>>,
}

impl<R: LockStrategy> Deref for ArrayLock<'_, R> {
    type Target = SlotTable;

    fn deref(&self) -> &SlotTable {
        self.slots
    }
}

/// The registry. `R` selects the array lock; see [`crate::sync`].
pub struct ObjectRegistry<R: LockStrategy = ThreadedLock> {
    slots: SlotTable,
    /// Free list; its mutex is the array lock.
    free_list: ArrayMutex<R, Vec<ObjectIndex>>,
    listeners: ListenerRegistry,
    config: RegistryConfig,

    // Pool boundary. Written under the array lock, read without it.
    first_gc_index: AtomicI32,
    last_non_gc_index: AtomicI32,
    max_disregard_objects: AtomicI32,
    open_for_disregard: AtomicBool,
    /// Held by the one close in progress while its hooks run.
    closing: AtomicBool,
    disabled: AtomicBool,
    initial_load: AtomicBool,
    teardown: AtomicBool,

    serial_counter: AtomicU32,
    owner_thread: ThreadId,
    collector_thread: RwLock<Option<ThreadId>>,
    hooks: RwLock<Option<Arc<dyn DisregardPoolHooks>>>,
    overflow_handler: RwLock<Option<OverflowHandler>>,
    counters: Counters,
}

impl ObjectRegistry<ThreadedLock> {
    /// Build a registry shared between threads.
    ///
    /// Fatal if `config.max_objects` is 0 or beyond the index range.
    pub fn initialize(config: &RegistryConfig) -> Self {
        Self::with_lock(config)
    }
}

impl ObjectRegistry<SingleThreadLock> {
    /// Build a registry whose array lock is a no-op. The result is `!Sync`.
    pub fn initialize_single_threaded(config: &RegistryConfig) -> Self {
        Self::with_lock(config)
    }
}

impl<R: LockStrategy> ObjectRegistry<R> {
    /// Build a registry with an explicitly chosen lock strategy.
    pub fn with_lock(config: &RegistryConfig) -> Self {
        if config.max_objects == 0 || config.max_objects > i32::MAX as usize {
            fatal(FatalError::InvalidCapacity(config.max_objects as i64));
        }

        let slots = SlotTable::reserve(config.max_objects, config.preallocate);
        let max_disregard = config.disregard_reserve.min(config.max_objects);
        if max_disregard > 0 {
            if let Err(e) = slots.append_range(max_disregard) {
                fatal(FatalError::CapacityExceeded {
                    capacity: e.capacity,
                    requested: e.requested,
                });
            }
        }

        // -1 records that the disregard pool has never been closed.
        let first_gc_index = if max_disregard > 0 { -1 } else { 0 };

        LogBuilder::new(LogLevel::Info)
            .message("object registry initialized")
            .field_int("max_objects", config.max_objects as i64)
            .field_int("disregard_reserve", max_disregard as i64)
            .field_bool("preallocate", config.preallocate)
            .field_bool("thread_safe", R::THREAD_SAFE)
            .emit();

        Self {
            slots,
            free_list: ArrayMutex::new(Vec::new()),
            listeners: ListenerRegistry::new(),
            config: config.clone(),
            first_gc_index: AtomicI32::new(first_gc_index),
            last_non_gc_index: AtomicI32::new(INDEX_NONE),
            max_disregard_objects: AtomicI32::new(max_disregard as ObjectIndex),
            open_for_disregard: AtomicBool::new(true),
            closing: AtomicBool::new(false),
            disabled: AtomicBool::new(false),
            initial_load: AtomicBool::new(true),
            teardown: AtomicBool::new(false),
            serial_counter: AtomicU32::new(START_SERIAL_NUMBER),
            owner_thread: thread::current().id(),
            collector_thread: RwLock::new(None),
            hooks: RwLock::new(None),
            overflow_handler: RwLock::new(None),
            counters: Counters::default(),
        }
    }

    // ------------------------------------------------------------------
    // Collaborators
    // ------------------------------------------------------------------

    /// Designate (or clear) the collector thread.
    pub fn set_collector_thread(&self, thread: Option<ThreadId>) {
        *self.collector_thread.write() = thread;
    }

    /// Install the steps run on close.
    pub fn set_disregard_pool_hooks(&self, hooks: Arc<dyn DisregardPoolHooks>) {
        *self.hooks.write() = Some(hooks);
    }

    /// Install the capacity-exhaustion handler. It only runs when
    /// `dump_counts_on_overflow` is configured.
    pub fn set_overflow_handler<F>(&self, handler: F)
    where
        F: Fn(&CensusReport) + Send + Sync + 'static,
    {
        *self.overflow_handler.write() = Some(Arc::new(handler));
    }

    /// Mark final teardown. Freed indices stop being recycled and closing
    /// the disregard pool skips its hooks.
    pub fn begin_teardown(&self) {
        self.teardown.store(true, Ordering::Release);
        log::info("object registry teardown started");
    }

    /// Whether [`begin_teardown`](Self::begin_teardown) was called.
    pub fn is_tearing_down(&self) -> bool {
        self.teardown.load(Ordering::Acquire)
    }

    fn check_thread(&self, operation: &'static str, collector_allowed: bool) {
        let current = thread::current().id();
        if current == self.owner_thread {
            return;
        }
        if collector_allowed && *self.collector_thread.read() == Some(current) {
            return;
        }
        fatal(FatalError::WrongThread {
            operation,
            thread: current,
        });
    }

    // ------------------------------------------------------------------
    // Disregard pool
    // ------------------------------------------------------------------

    /// Reopen the disregard pool after a close. Owner thread only.
    pub fn open_disregard_pool(&self) {
        self.check_thread("open_disregard_pool", false);
        {
            let _guard = self.free_list.lock();
            if self.disabled.load(Ordering::Acquire) {
                fatal(FatalError::DisregardPoolDisabled);
            }
            if self.open_for_disregard.load(Ordering::Acquire) {
                fatal(FatalError::DisregardPoolAlreadyOpen);
            }
            self.open_for_disregard.store(true, Ordering::Release);
        }
        self.log_pool("disregard pool opened");
    }

    /// Close the disregard pool, freezing the general-pool boundary.
    pub fn close_disregard_pool(&self) {
        self.check_thread("close_disregard_pool", true);
        if !self.open_for_disregard.load(Ordering::Acquire)
            || self
                .closing
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
        {
            fatal(FatalError::DisregardPoolAlreadyClosed);
        }

        let first_close = self.initial_load.swap(false, Ordering::AcqRel);
        if !self.is_tearing_down() {
            let hooks = self.hooks.read().clone();
            if let Some(hooks) = hooks {
                hooks.flush_deferred_construction();
                hooks.finalize_reference_layouts();
            }
            if first_close {
                self.commit_root_set();
            }
        }

        {
            let _guard = self.free_list.lock();
            if !self.open_for_disregard.load(Ordering::Acquire) {
                fatal(FatalError::DisregardPoolAlreadyClosed);
            }
            let last_non_gc = self.last_non_gc_index.load(Ordering::Acquire);
            let first_gc = self.first_gc_index.load(Ordering::Acquire);
            self.first_gc_index
                .store(first_gc.max(last_non_gc + 1), Ordering::Release);
            self.open_for_disregard.store(false, Ordering::Release);
            self.closing.store(false, Ordering::Release);
        }
        self.log_pool("disregard pool closed");
    }

    /// Turn the disregard pool off for good, closing it if open.
    pub fn disable_disregard_pool(&self) {
        self.check_thread("disable_disregard_pool", true);
        {
            let _guard = self.free_list.lock();
            self.max_disregard_objects.store(0, Ordering::Release);
            self.first_gc_index.store(0, Ordering::Release);
            self.disabled.store(true, Ordering::Release);
        }
        log::info("disregard pool disabled");
        if self.open_for_disregard.load(Ordering::Acquire) {
            self.close_disregard_pool();
        }
    }

    /// Root every live object that allows it; un-root the rest.
    fn commit_root_set(&self) {
        let mut always_loaded = 0i64;
        let mut rooted = 0i64;
        for (_, slot, object) in self.slots.iter_live() {
            if object.is_safe_for_root_set() {
                slot.set_flags(InternalObjectFlags::ROOT_SET);
                rooted += 1;
            } else if slot.has_any_flags(InternalObjectFlags::ROOT_SET) {
                slot.clear_flags(InternalObjectFlags::ROOT_SET);
            }
            always_loaded += 1;
        }

        LogBuilder::new(LogLevel::Info)
            .message(format!(
                "{always_loaded} objects as part of root set at end of initial load"
            ))
            .field_int("rooted", rooted)
            .emit();
        if self.is_disregard_enabled() {
            log::info(format!(
                "{} objects are not in the root set, but can never be destroyed \
                 because they are in the disregard pool",
                always_loaded - rooted
            ));
        }
    }

    fn log_pool(&self, message: &str) {
        let used = self.last_non_gc_index() + 1;
        let max = self.max_disregard_objects();
        LogBuilder::new(LogLevel::Info)
            .message(format!("{message}: {used}/{max} objects in disregard pool"))
            .field_int("first_gc_index", self.first_gc_index() as i64)
            .emit();
    }

    // ------------------------------------------------------------------
    // Allocation
    // ------------------------------------------------------------------

    /// Register `object`, choosing its index.
    pub fn allocate(&self, object: &ObjectRef, flags: InternalObjectFlags) -> ObjectIndex {
        self.allocate_inner(object, flags, None, 0)
    }

    /// Register `object` at an index the caller already reserved, with a
    /// preassigned serial number (0 for none). Fatal if `index` is occupied
    /// or not yet addressable.
    pub fn allocate_at(
        &self,
        object: &ObjectRef,
        flags: InternalObjectFlags,
        index: ObjectIndex,
        serial_number: u32,
    ) -> ObjectIndex {
        self.allocate_inner(object, flags, Some(index), serial_number)
    }

    fn allocate_inner(
        &self,
        object: &ObjectRef,
        flags: InternalObjectFlags,
        explicit_index: Option<ObjectIndex>,
        serial_number: u32,
    ) -> ObjectIndex {
        let existing = object.header().internal_index();
        if existing != INDEX_NONE {
            fatal(FatalError::AlreadyRegistered { index: existing });
        }

        let mut free_list = self.free_list.lock();
        let mut recycled = false;

        let index = if let Some(index) = explicit_index {
            // An index is on the free list only while its slot is empty.
            if let Some(pos) = free_list.iter().position(|&queued| queued == index) {
                free_list.remove(pos);
            }
            index
        } else if self.open_for_disregard.load(Ordering::Acquire) && self.is_disregard_enabled() {
            let index = self.last_non_gc_index.load(Ordering::Acquire) + 1;
            let max = self.max_disregard_objects.load(Ordering::Acquire);
            if index >= max {
                if self.first_gc_index.load(Ordering::Acquire) >= 0 {
                    fatal(FatalError::DisregardPoolOverflow { max });
                }
                // No general-pool object exists yet, so the pool may keep growing.
                match self.slots.append_single() {
                    Ok(appended) => debug_assert_eq!(appended, index),
                    Err(e) => {
                        drop(free_list);
                        self.capacity_exhausted(e);
                    }
                }
                self.max_disregard_objects.store(index + 1, Ordering::Release);
            }
            self.last_non_gc_index.store(index, Ordering::Release);
            index
        } else {
            let index = match free_list.pop() {
                Some(index) => {
                    recycled = true;
                    index
                }
                None => {
                    if self.first_gc_index.load(Ordering::Acquire) < 0 {
                        fatal(FatalError::PoolNeverClosed);
                    }
                    match self.slots.append_single() {
                        Ok(index) => index,
                        Err(e) => {
                            drop(free_list);
                            self.capacity_exhausted(e);
                        }
                    }
                }
            };
            let first_gc_index = self.first_gc_index.load(Ordering::Acquire);
            let last_non_gc_index = self.last_non_gc_index.load(Ordering::Acquire);
            if index < first_gc_index || index <= last_non_gc_index {
                fatal(FatalError::PoolLayoutViolated {
                    index,
                    first_gc_index,
                    last_non_gc_index,
                });
            }
            index
        };

        let slot = self.slots.at(index);
        if !slot.publish(
            Arc::downgrade(object),
            InternalObjectFlags::PENDING_CONSTRUCTION | flags,
            serial_number,
        ) {
            fatal(FatalError::IndexCollision { index });
        }
        object.header().set_internal_index(index);
        drop(free_list);

        self.counters.record_allocation(recycled);
        if log::would_log(LogLevel::Trace) {
            LogBuilder::new(LogLevel::Trace)
                .message("allocated object index")
                .field_int("index", index as i64)
                .field_str("type", object.header().type_descriptor().path())
                .field_bool("recycled", recycled)
                .emit();
        }

        self.listeners.notify_created(object, index);
        index
    }

    #[cold]
    fn capacity_exhausted(&self, error: CapacityExceeded) -> ! {
        if self.config.dump_counts_on_overflow {
            let report = self.census();
            report.log(&self.config.census);
            let handler = self.overflow_handler.read().clone();
            if let Some(handler) = handler {
                handler(&report);
            }
        }
        fatal(FatalError::CapacityExceeded {
            capacity: error.capacity,
            requested: error.requested,
        })
    }

    /// Unregister `object`. Owner or collector thread only.
    ///
    /// Delete listeners run first, while the slot still holds the object.
    pub fn free(&self, object: &dyn ManagedObject) {
        self.check_thread("free", true);

        let index = object.header().internal_index();
        let slot = self.slots.at(index);
        if !slot.holds(object) {
            fatal(FatalError::FreeMismatch { index });
        }

        self.listeners.notify_deleted(object, index);

        let mut free_list = self.free_list.lock();
        if !slot.holds(object) {
            fatal(FatalError::FreeMismatch { index });
        }
        slot.clear();
        if index > self.last_non_gc_index.load(Ordering::Acquire)
            && !self.is_tearing_down()
            && self.config.recycle_indices
        {
            free_list.push(index);
        }
        drop(free_list);

        self.counters.record_free();
        if log::would_log(LogLevel::Trace) {
            LogBuilder::new(LogLevel::Trace)
                .message("freed object index")
                .field_int("index", index as i64)
                .emit();
        }
    }

    /// Take the array lock for a structural walk of the slot table.
    pub fn lock_array(&self) -> ArrayLock<'_, R> {
        ArrayLock {
            slots: &self.slots,
            _guard: self.free_list.lock(),
        }
    }

    // ------------------------------------------------------------------
    // Serial numbers and weak handles
    // ------------------------------------------------------------------

    /// Serial number of the slot at `index`, assigning one on first request.
    pub fn serial_of(&self, index: ObjectIndex) -> u32 {
        let cell = self.slots.at(index).serial_cell();
        let current = cell.load(Ordering::Acquire);
        if current != 0 {
            return current;
        }

        let candidate = self
            .serial_counter
            .fetch_add(1, Ordering::AcqRel)
            .wrapping_add(1);
        if candidate <= START_SERIAL_NUMBER {
            fatal(FatalError::SerialOverflow(candidate));
        }
        match cell.compare_exchange(0, candidate, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => candidate,
            Err(winner) => winner,
        }
    }

    /// Drop `object`'s serial number, invalidating every outstanding handle.
    pub fn reset_serial(&self, object: &dyn ManagedObject) {
        let index = object.header().internal_index();
        self.slots.at(index).serial_cell().store(0, Ordering::Release);
    }

    /// Handle to `object`, or [`WeakObjectHandle::NULL`] if it is not
    /// registered.
    pub fn weak_handle(&self, object: &dyn ManagedObject) -> WeakObjectHandle {
        if self.check_valid(object).is_err() {
            return WeakObjectHandle::NULL;
        }
        let index = object.header().internal_index();
        WeakObjectHandle::new(index, self.serial_of(index))
    }

    /// Whether `handle` still names the occupant it was taken from.
    pub fn is_handle_valid(&self, handle: WeakObjectHandle) -> bool {
        if handle.is_null() {
            return false;
        }
        self.slots.get(handle.index()).is_some_and(|slot| {
            slot.is_occupied() && slot.serial_number() == handle.serial()
        })
    }

    /// The object `handle` names, if it is still there.
    pub fn resolve(&self, handle: WeakObjectHandle) -> Option<ObjectRef> {
        if handle.is_null() {
            return None;
        }
        let slot = self.slots.get(handle.index())?;
        if slot.serial_number() != handle.serial() {
            return None;
        }
        let object = slot.object()?;
        // Re-check: the slot may have been freed and refilled meanwhile.
        (slot.serial_number() == handle.serial() && slot.holds(object.as_ref())).then_some(object)
    }

    // ------------------------------------------------------------------
    // Validity
    // ------------------------------------------------------------------

    /// Why `object` is not the registered occupant of its index, if it isn't.
    pub fn check_valid(&self, object: &dyn ManagedObject) -> Result<(), InvalidObject> {
        let index = object.header().internal_index();
        if index == INDEX_NONE {
            return Err(InvalidObject::NotInArray);
        }
        let slot = self
            .slots
            .get(index)
            .ok_or(InvalidObject::IndexOutOfRange(index))?;
        if !slot.is_occupied() {
            return Err(InvalidObject::EmptySlot(index));
        }
        if !slot.holds(object) {
            return Err(InvalidObject::OtherObjectInSlot(index));
        }
        Ok(())
    }

    /// [`check_valid`](Self::check_valid), logging failures at `Warn`.
    pub fn is_valid(&self, object: &dyn ManagedObject) -> bool {
        match self.check_valid(object) {
            Ok(()) => true,
            Err(reason) => {
                LogBuilder::new(LogLevel::Warn)
                    .message(reason.to_string())
                    .field_str("name", object.header().name())
                    .emit();
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// The listener lists.
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// See [`ListenerRegistry::add_create_listener`].
    pub fn add_create_listener(&self, listener: Arc<dyn CreateListener>) {
        self.listeners.add_create_listener(listener);
    }

    /// See [`ListenerRegistry::remove_create_listener`].
    pub fn remove_create_listener(&self, listener: &dyn CreateListener) {
        self.listeners.remove_create_listener(listener);
    }

    /// See [`ListenerRegistry::add_delete_listener`].
    pub fn add_delete_listener(&self, listener: Arc<dyn DeleteListener>) {
        self.listeners.add_delete_listener(listener);
    }

    /// See [`ListenerRegistry::remove_delete_listener`].
    pub fn remove_delete_listener(&self, listener: &dyn DeleteListener) {
        self.listeners.remove_delete_listener(listener);
    }

    /// Notify every listener of shutdown; fatal if any stays registered.
    pub fn shutdown(&self) {
        self.listeners.shutdown();
        LogBuilder::new(LogLevel::Info)
            .message("object registry shut down")
            .field_int("live_objects", self.live_object_count() as i64)
            .emit();
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Live instance counts grouped by type.
    pub fn census(&self) -> CensusReport {
        CensusReport::collect(&self.slots)
    }

    /// Dot-separated ownership path of the object at `index`.
    pub fn path_name(&self, index: ObjectIndex) -> Option<String> {
        naming::path_name(&self.slots, index)
    }

    /// `"{type} {path}"` for the object at `index`, cached per occupant.
    pub fn stat_name(&self, index: ObjectIndex) -> Option<Arc<str>> {
        naming::stat_name(&self.slots, index)
    }

    /// Counters snapshot. Takes the array lock.
    pub fn stats(&self) -> RegistryStats {
        let free_list_len = self.free_list.lock().len();
        self.counters.snapshot(self.slots.len(), free_list_len)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The slot table, for lock-free reads.
    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    /// The configuration the registry was built with.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Hard maximum number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Slots currently addressable, occupied or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot is addressable yet.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Objects currently registered.
    pub fn live_object_count(&self) -> usize {
        self.counters.live()
    }

    /// First collector-eligible index, -1 until the disregard pool first closes.
    pub fn first_gc_index(&self) -> ObjectIndex {
        self.first_gc_index.load(Ordering::Acquire)
    }

    /// Last index used by the disregard pool, -1 if none.
    pub fn last_non_gc_index(&self) -> ObjectIndex {
        self.last_non_gc_index.load(Ordering::Acquire)
    }

    /// Declared size of the disregard pool.
    pub fn max_disregard_objects(&self) -> ObjectIndex {
        self.max_disregard_objects.load(Ordering::Acquire)
    }

    /// Whether allocations currently go to the disregard pool.
    pub fn is_open_for_disregard(&self) -> bool {
        self.open_for_disregard.load(Ordering::Acquire)
    }

    /// Whether the disregard pool has a non-zero size.
    pub fn is_disregard_enabled(&self) -> bool {
        self.max_disregard_objects() > 0
    }

    /// Whether `index` lies in the disregard prefix.
    pub fn is_disregard_index(&self, index: ObjectIndex) -> bool {
        index >= 0 && index <= self.last_non_gc_index()
    }

    /// Indices waiting for reuse. Takes the array lock.
    pub fn free_list_len(&self) -> usize {
        self.free_list.lock().len()
    }

    #[cfg(test)]
    pub(crate) fn force_serial_counter(&self, value: u32) {
        self.serial_counter.store(value, Ordering::Release);
    }
}

impl<R: LockStrategy> fmt::Debug for ObjectRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("live_objects", &self.live_object_count())
            .field("first_gc_index", &self.first_gc_index())
            .field("last_non_gc_index", &self.last_non_gc_index())
            .field("max_disregard_objects", &self.max_disregard_objects())
            .field("open_for_disregard", &self.is_open_for_disregard())
            .finish()
    }
}
