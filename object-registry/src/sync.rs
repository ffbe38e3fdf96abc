//! # Array Lock Strategy
//!
//! All structural mutation of the slot table (index selection, publish,
//! clear) happens under one exclusive lock. Which lock is a type parameter
//! of the registry, chosen once at construction:
//!
//! - [`ThreadedLock`] - `parking_lot`'s raw mutex, for registries shared
//!   across threads.
//! - [`SingleThreadLock`] - no blocking at all, only a held flag to catch
//!   re-entry. It is `!Sync`, so a registry built on it cannot be shared
//!   between threads and the compiler enforces the single-thread assumption.

use std::cell::Cell;

use parking_lot::lock_api::{self, GuardNoSend, RawMutex};

use crate::error::{fatal, FatalError};

/// A raw mutex usable as the registry's array lock.
pub trait LockStrategy: RawMutex + 'static {
    /// Whether registries using this lock may be shared across threads.
    const THREAD_SAFE: bool;
}

/// Real mutual exclusion.
pub type ThreadedLock = parking_lot::RawMutex;

impl LockStrategy for ThreadedLock {
    const THREAD_SAFE: bool = true;
}

/// No-op lock for registries statically known to be single-threaded.
pub struct SingleThreadLock {
    held: Cell<bool>,
}

// SAFETY: `SingleThreadLock` is `!Sync`, so every call comes from the one
// thread that owns it; the held flag makes acquisition exclusive on that thread.
unsafe impl RawMutex for SingleThreadLock {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = Self {
        held: Cell::new(false),
    };

    type GuardMarker = GuardNoSend;

    fn lock(&self) {
        if self.held.replace(true) {
            fatal(FatalError::ReentrantArrayLock);
        }
    }

    fn try_lock(&self) -> bool {
        !self.held.replace(true)
    }

    unsafe fn unlock(&self) {
        self.held.set(false);
    }

    fn is_locked(&self) -> bool {
        self.held.get()
    }
}

impl LockStrategy for SingleThreadLock {
    const THREAD_SAFE: bool = false;
}

/// Mutex guarding the registry's index-selection state.
pub(crate) type ArrayMutex<R, T> = lock_api::Mutex<R, T>;

/// Guard over the array lock.
pub type ArrayGuard<'a, R, T> = lock_api::MutexGuard<'a, R, T>;
