//! # Object Registry
//!
//! Stable integer indices for the instances of a managed-object system, and
//! the liveness bookkeeping a tracing garbage collector consults.
//!
//! The registry provides:
//!
//! - **Two-phase index space**: a permanent disregard pool for objects created
//!   before collection is active, then a recyclable general pool
//! - **Weak handles**: `(index, serial)` pairs that detect slot reuse
//! - **Listeners**: synchronous create/delete observers with a shutdown contract
//! - **Diagnostics**: per-type census, ownership path names, counters
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        OBJECT REGISTRY                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐          │
//! │  │  Allocator   │  │  Listeners   │  │   Census     │          │
//! │  │(registry.rs) │  │(listener.rs) │  │ (census.rs)  │          │
//! │  └──────────────┘  └──────────────┘  └──────────────┘          │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐          │
//! │  │ Slot Table   │  │  Array Lock  │  │   Handles    │          │
//! │  │(slot_table.rs│  │  (sync.rs)   │  │ (handle.rs)  │          │
//! │  └──────────────┘  └──────────────┘  └──────────────┘          │
//! │                                                                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use object_registry::{init, InternalObjectFlags, RegistryConfig};
//!
//! let registry = init(RegistryConfig::builder().disregard_reserve(1024).build()?)?;
//!
//! let index = registry.allocate(&object, InternalObjectFlags::empty());
//! let handle = registry.weak_handle(object.as_ref());
//! registry.close_disregard_pool();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod census;
pub mod config;
pub mod error;
pub mod flags;
pub mod handle;
pub mod listener;
pub mod log;
pub mod naming;
pub mod object;
pub mod registry;
pub mod slot_table;
pub mod stats;
pub mod sync;

// Re-exports
pub use census::{CensusEntry, CensusReport};
pub use config::{CensusConfig, ConfigError, RegistryConfig, RegistryConfigBuilder};
pub use error::{fatal, FatalError, InvalidObject};
pub use flags::InternalObjectFlags;
pub use handle::{WeakObjectHandle, START_SERIAL_NUMBER};
pub use listener::{CreateListener, DeleteListener, ListenerRegistry};
pub use log::LogLevel;
pub use object::{ManagedObject, ObjectHeader, ObjectIndex, ObjectRef, TypeDescriptor, INDEX_NONE};
pub use registry::{ArrayLock, DisregardPoolHooks, ObjectRegistry, OverflowHandler};
pub use slot_table::{Slot, SlotTable};
pub use stats::RegistryStats;
pub use sync::{LockStrategy, SingleThreadLock, ThreadedLock};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Validate `config`, apply its log level and build a thread-safe registry.
pub fn init(config: RegistryConfig) -> Result<ObjectRegistry, ConfigError> {
    config.validate()?;
    log::set_level(config.log_level);
    Ok(ObjectRegistry::initialize(&config))
}

/// Initialize from `OBJREG_*` environment variables.
///
/// See [`RegistryConfig::from_env`] for the supported variables.
pub fn init_from_env() -> Result<ObjectRegistry, ConfigError> {
    init(RegistryConfig::from_env())
}
