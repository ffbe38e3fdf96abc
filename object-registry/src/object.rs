//! # Managed Objects
//!
//! The registry never owns the objects it indexes. The object system keeps
//! them alive through [`ObjectRef`] (`Arc<dyn ManagedObject>`) and the registry
//! holds a `Weak` back-reference per slot.
//!
//! Every managed object embeds an [`ObjectHeader`], which carries the index the
//! registry assigned, the object's type descriptor, its name and the index of
//! its outer (owning) object. Outer links are stored as indices, never as
//! pointers, so ownership chains form an index forest the registry can walk.

use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

/// Position of an object in the registry.
pub type ObjectIndex = i32;

/// Sentinel for "never allocated" / "no index".
pub const INDEX_NONE: ObjectIndex = -1;

/// A strong reference to a managed object, as held by the object system.
pub type ObjectRef = Arc<dyn ManagedObject>;

/// Opaque identity of an object's type, used to group objects for diagnostics.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeDescriptor(Arc<str>);

impl TypeDescriptor {
    /// Create a descriptor from a type path.
    pub fn new(path: impl Into<Arc<str>>) -> Self {
        Self(path.into())
    }

    /// The type path.
    pub fn path(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDescriptor({})", self.0)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry bookkeeping embedded in every managed object.
pub struct ObjectHeader {
    internal_index: AtomicI32,
    outer_index: AtomicI32,
    type_descriptor: TypeDescriptor,
    name: Arc<str>,
}

impl ObjectHeader {
    /// Create an unregistered header with no outer.
    pub fn new(type_descriptor: TypeDescriptor, name: impl Into<Arc<str>>) -> Self {
        Self {
            internal_index: AtomicI32::new(INDEX_NONE),
            outer_index: AtomicI32::new(INDEX_NONE),
            type_descriptor,
            name: name.into(),
        }
    }

    /// Set the outer object's index.
    pub fn with_outer(self, outer: ObjectIndex) -> Self {
        self.outer_index.store(outer, Ordering::Relaxed);
        self
    }

    /// Index assigned by the registry, or [`INDEX_NONE`].
    pub fn internal_index(&self) -> ObjectIndex {
        self.internal_index.load(Ordering::Acquire)
    }

    pub(crate) fn set_internal_index(&self, index: ObjectIndex) {
        self.internal_index.store(index, Ordering::Release);
    }

    /// Index of the owning object, or [`INDEX_NONE`] for an outermost object.
    pub fn outer_index(&self) -> ObjectIndex {
        self.outer_index.load(Ordering::Acquire)
    }

    /// Re-parent the object.
    pub fn set_outer_index(&self, outer: ObjectIndex) {
        self.outer_index.store(outer, Ordering::Release);
    }

    /// The object's type descriptor.
    pub fn type_descriptor(&self) -> &TypeDescriptor {
        &self.type_descriptor
    }

    /// The object's own (unqualified) name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ObjectHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHeader")
            .field("index", &self.internal_index())
            .field("outer", &self.outer_index())
            .field("type", &self.type_descriptor)
            .field("name", &self.name)
            .finish()
    }
}

/// An instance of the managed-object system.
pub trait ManagedObject: Send + Sync + 'static {
    /// The embedded registry header.
    fn header(&self) -> &ObjectHeader;

    /// Whether the object may join the permanent root set when the
    /// disregard pool closes for the first time.
    fn is_safe_for_root_set(&self) -> bool {
        true
    }
}

/// Address identity of a managed object, ignoring vtable metadata.
pub(crate) fn same_object(a: *const dyn ManagedObject, b: *const dyn ManagedObject) -> bool {
    std::ptr::addr_eq(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Thing {
        header: ObjectHeader,
    }

    impl ManagedObject for Thing {
        fn header(&self) -> &ObjectHeader {
            &self.header
        }
    }

    #[test]
    fn test_new_header_is_unregistered() {
        let header = ObjectHeader::new(TypeDescriptor::new("/Script/Core.Thing"), "Thing_0");
        assert_eq!(header.internal_index(), INDEX_NONE);
        assert_eq!(header.outer_index(), INDEX_NONE);
        assert_eq!(header.name(), "Thing_0");
        assert_eq!(header.type_descriptor().path(), "/Script/Core.Thing");
    }

    #[test]
    fn test_with_outer() {
        let header = ObjectHeader::new(TypeDescriptor::new("T"), "child").with_outer(4);
        assert_eq!(header.outer_index(), 4);
        header.set_outer_index(9);
        assert_eq!(header.outer_index(), 9);
    }

    #[test]
    fn test_same_object_ignores_metadata() {
        let a: ObjectRef = Arc::new(Thing {
            header: ObjectHeader::new(TypeDescriptor::new("T"), "a"),
        });
        let b: ObjectRef = Arc::new(Thing {
            header: ObjectHeader::new(TypeDescriptor::new("T"), "b"),
        });
        assert!(same_object(Arc::as_ptr(&a), a.as_ref()));
        assert!(!same_object(Arc::as_ptr(&a), Arc::as_ptr(&b)));
    }

    #[test]
    fn test_type_descriptor_ordering_and_display() {
        let a = TypeDescriptor::new("A");
        let b = TypeDescriptor::new("B");
        assert!(a < b);
        assert_eq!(a.to_string(), "A");
        assert_eq!(format!("{:?}", b), "TypeDescriptor(B)");
    }
}
