//! # Error Tiers
//!
//! The registry has exactly two failure tiers:
//!
//! - **Fatal** ([`FatalError`]): a broken invariant. Continuing would let two
//!   live objects alias one index or let a stale index be dereferenced, so the
//!   error is logged and the current thread panics via [`fatal`]. Release
//!   builds of this workspace use `panic = "abort"`, which turns that into
//!   process termination.
//! - **Reported** ([`InvalidObject`]): a validity check failed. These happen
//!   routinely on expired weak handles and are returned as values.

use std::thread::ThreadId;

use thiserror::Error;

use crate::log::{LogBuilder, LogLevel};
use crate::object::ObjectIndex;

/// Conditions that terminate the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalError {
    /// `initialize` was given a non-positive capacity.
    #[error("max object count is invalid: {0}, it must be a number greater than 0")]
    InvalidCapacity(i64),

    /// The slot table cannot grow any further.
    #[error(
        "maximum number of objects ({capacity}) exceeded when trying to add {requested} object(s)"
    )]
    CapacityExceeded {
        /// Configured hard maximum.
        capacity: usize,
        /// Number of slots the failing request needed.
        requested: usize,
    },

    /// Publishing into a slot that already holds an object.
    #[error("attempting to add object at index {index} but another object exists at that index")]
    IndexCollision {
        /// The occupied index.
        index: ObjectIndex,
    },

    /// The object handed to `allocate` already carries an index.
    #[error("object is already registered at index {index}")]
    AlreadyRegistered {
        /// Index stored in the object header.
        index: ObjectIndex,
    },

    /// `free` was called with an object that does not own its slot.
    #[error("removing object at index {index} but the index points to a different object")]
    FreeMismatch {
        /// Index stored in the object header.
        index: ObjectIndex,
    },

    /// An index that call sites assume valid is out of range.
    #[error("object index {index} is out of range (table length {len})")]
    IndexOutOfRange {
        /// Offending index.
        index: ObjectIndex,
        /// Current table length.
        len: usize,
    },

    /// The disregard pool overflowed after general-pool allocation began.
    #[error("unable to add more objects to disregard pool (max: {max})")]
    DisregardPoolOverflow {
        /// Declared pool maximum.
        max: ObjectIndex,
    },

    /// General-pool growth was requested before the disregard pool closed.
    #[error("general pool allocation before the disregard pool was ever closed")]
    PoolNeverClosed,

    /// A general-pool index landed inside the disregard prefix.
    #[error(
        "general pool index {index} overlaps the disregard pool \
         (first gc index {first_gc_index}, last non-gc index {last_non_gc_index})"
    )]
    PoolLayoutViolated {
        /// Chosen index.
        index: ObjectIndex,
        /// Current first collector-eligible index.
        first_gc_index: ObjectIndex,
        /// Current last disregard index.
        last_non_gc_index: ObjectIndex,
    },

    /// `close_disregard_pool` on a pool that is not open.
    #[error("disregard pool is already closed")]
    DisregardPoolAlreadyClosed,

    /// `open_disregard_pool` on a pool that is already open.
    #[error("disregard pool is already open")]
    DisregardPoolAlreadyOpen,

    /// `open_disregard_pool` after the pool was disabled.
    #[error("disregard pool has been disabled and cannot be reopened")]
    DisregardPoolDisabled,

    /// The process-wide serial counter wrapped.
    #[error("object serial numbers overflowed (trying to allocate serial number {0})")]
    SerialOverflow(u32),

    /// Listeners were still registered after shutdown notified them.
    #[error("all {kind} listeners should be unregistered when shutting down ({remaining} remaining)")]
    ListenersRemaining {
        /// `"create"` or `"delete"`.
        kind: &'static str,
        /// Number still registered.
        remaining: usize,
    },

    /// A listener was added twice.
    #[error("{kind} listener is already registered")]
    DuplicateListener {
        /// `"create"` or `"delete"`.
        kind: &'static str,
    },

    /// A listener was removed without being registered.
    #[error("{kind} listener is not registered")]
    UnknownListener {
        /// `"create"` or `"delete"`.
        kind: &'static str,
    },

    /// A thread-restricted operation ran on a foreign thread.
    #[error("{operation} called from {thread:?}, which is neither the owning nor the collector thread")]
    WrongThread {
        /// Name of the restricted operation.
        operation: &'static str,
        /// Calling thread.
        thread: ThreadId,
    },

    /// The single-threaded array lock was re-entered.
    #[error("single-threaded array lock acquired while already held")]
    ReentrantArrayLock,
}

/// Log `error` and stop the current thread of execution.
#[cold]
#[track_caller]
pub fn fatal(error: FatalError) -> ! {
    let location = std::panic::Location::caller();
    LogBuilder::new(LogLevel::Error)
        .message(error.to_string())
        .field_str("location", format!("{}:{}", location.file(), location.line()))
        .emit();
    panic!("{}", error);
}

/// Why an object failed a validity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidObject {
    /// The object never received an index.
    #[error("object is not in global object array")]
    NotInArray,
    /// The stored index is beyond the table.
    #[error("invalid object index {0}")]
    IndexOutOfRange(ObjectIndex),
    /// The slot at the stored index is free.
    #[error("empty slot at index {0}")]
    EmptySlot(ObjectIndex),
    /// The slot holds a different object.
    #[error("other object in slot {0}")]
    OtherObjectInSlot(ObjectIndex),
}
