//! Weak object handles.
//!
//! A handle is an `(index, serial)` pair. It resolves only while the slot at
//! `index` is occupied and still carries `serial`; freeing zeroes the slot's
//! serial, and later occupants receive fresh ones, so a handle can never
//! resolve to an object that reused its index.

use std::fmt;

use crate::object::{ObjectIndex, INDEX_NONE};

/// Serial numbers at or below this value are never handed out.
pub const START_SERIAL_NUMBER: u32 = 1000;

/// A non-owning, staleness-detecting reference to a registry entry.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeakObjectHandle {
    index: ObjectIndex,
    serial: u32,
}

impl WeakObjectHandle {
    /// A handle that never resolves.
    pub const NULL: Self = Self {
        index: INDEX_NONE,
        serial: 0,
    };

    /// Build a handle from its parts.
    pub const fn new(index: ObjectIndex, serial: u32) -> Self {
        Self { index, serial }
    }

    /// Slot index.
    pub const fn index(&self) -> ObjectIndex {
        self.index
    }

    /// Serial number captured when the handle was made.
    pub const fn serial(&self) -> u32 {
        self.serial
    }

    /// Whether this is [`WeakObjectHandle::NULL`] or otherwise unusable.
    pub const fn is_null(&self) -> bool {
        self.index < 0 || self.serial <= START_SERIAL_NUMBER
    }
}

impl Default for WeakObjectHandle {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for WeakObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "WeakObjectHandle(null)")
        } else {
            write!(f, "WeakObjectHandle({}#{})", self.index, self.serial)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_handle() {
        assert!(WeakObjectHandle::NULL.is_null());
        assert!(WeakObjectHandle::default().is_null());
        assert_eq!(format!("{:?}", WeakObjectHandle::NULL), "WeakObjectHandle(null)");
    }

    #[test]
    fn test_reserved_serials_are_null() {
        assert!(WeakObjectHandle::new(5, START_SERIAL_NUMBER).is_null());
        assert!(WeakObjectHandle::new(5, 0).is_null());
        assert!(!WeakObjectHandle::new(5, START_SERIAL_NUMBER + 1).is_null());
    }

    #[test]
    fn test_parts() {
        let handle = WeakObjectHandle::new(5, 1101);
        assert_eq!(handle.index(), 5);
        assert_eq!(handle.serial(), 1101);
        assert_eq!(format!("{:?}", handle), "WeakObjectHandle(5#1101)");
    }
}
