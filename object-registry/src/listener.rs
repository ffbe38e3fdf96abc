//! # Creation and Deletion Listeners
//!
//! Observers notified synchronously on every allocate and free.
//!
//! Both lists are copy-on-write: notification clones an `Arc` of the
//! current list and calls observers with no lock held, so an observer may
//! register or deregister listeners (itself included) from inside a callback
//! without deadlocking or skipping a neighbour.
//!
//! Ordering:
//! - creation: registration order
//! - deletion: reverse registration order
//! - shutdown: reverse registration order, delete listeners first

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{fatal, FatalError};
use crate::object::{ManagedObject, ObjectIndex, ObjectRef};

/// Observer of object creation.
pub trait CreateListener: Send + Sync {
    /// `object` was published at `index`.
    fn on_object_created(&self, object: &ObjectRef, index: ObjectIndex);

    /// The registry is shutting down. Implementations must deregister
    /// themselves from `listeners` before returning.
    fn on_registry_shutdown(&self, listeners: &ListenerRegistry);
}

/// Observer of object deletion.
pub trait DeleteListener: Send + Sync {
    /// `object` is about to be removed from `index`. The slot still holds
    /// the object and its flags while this runs.
    fn on_object_deleted(&self, object: &dyn ManagedObject, index: ObjectIndex);

    /// The registry is shutting down. Implementations must deregister
    /// themselves from `listeners` before returning.
    fn on_registry_shutdown(&self, listeners: &ListenerRegistry);
}

type CreateList = Arc<Vec<Arc<dyn CreateListener>>>;
type DeleteList = Arc<Vec<Arc<dyn DeleteListener>>>;

/// The registry's two observer lists.
pub struct ListenerRegistry {
    // Readers are allocation paths; writers are rare registrations.
    create: RwLock<CreateList>,
    // Separate from the array lock; frees notify concurrently with registration.
    delete: Mutex<DeleteList>,
}

impl ListenerRegistry {
    /// Create empty listener lists.
    pub fn new() -> Self {
        Self {
            create: RwLock::new(Arc::new(Vec::new())),
            delete: Mutex::new(Arc::new(Vec::new())),
        }
    }

    /// Register a creation observer. Registering the same observer twice is fatal.
    pub fn add_create_listener(&self, listener: Arc<dyn CreateListener>) {
        let mut list = self.create.write();
        if list.iter().any(|l| same_create(l, listener.as_ref())) {
            fatal(FatalError::DuplicateListener { kind: "create" });
        }
        Arc::make_mut(&mut *list).push(listener);
    }

    /// Deregister a creation observer. Removing an unknown observer is fatal.
    pub fn remove_create_listener(&self, listener: &dyn CreateListener) {
        let mut list = self.create.write();
        match list.iter().position(|l| same_create(l, listener)) {
            Some(pos) => {
                Arc::make_mut(&mut *list).remove(pos);
            }
            None => fatal(FatalError::UnknownListener { kind: "create" }),
        }
    }

    /// Register a deletion observer. Registering the same observer twice is fatal.
    pub fn add_delete_listener(&self, listener: Arc<dyn DeleteListener>) {
        let mut list = self.delete.lock();
        if list.iter().any(|l| same_delete(l, listener.as_ref())) {
            fatal(FatalError::DuplicateListener { kind: "delete" });
        }
        Arc::make_mut(&mut *list).push(listener);
    }

    /// Deregister a deletion observer. Removing an unknown observer is fatal.
    pub fn remove_delete_listener(&self, listener: &dyn DeleteListener) {
        let mut list = self.delete.lock();
        match list.iter().position(|l| same_delete(l, listener)) {
            Some(pos) => {
                Arc::make_mut(&mut *list).remove(pos);
            }
            None => fatal(FatalError::UnknownListener { kind: "delete" }),
        }
    }

    /// Number of registered creation observers.
    pub fn create_listener_count(&self) -> usize {
        self.create.read().len()
    }

    /// Number of registered deletion observers.
    pub fn delete_listener_count(&self) -> usize {
        self.delete.lock().len()
    }

    pub(crate) fn notify_created(&self, object: &ObjectRef, index: ObjectIndex) {
        let snapshot = Arc::clone(&*self.create.read());
        for listener in snapshot.iter() {
            listener.on_object_created(object, index);
        }
    }

    pub(crate) fn notify_deleted(&self, object: &dyn ManagedObject, index: ObjectIndex) {
        let snapshot = Arc::clone(&*self.delete.lock());
        for listener in snapshot.iter().rev() {
            listener.on_object_deleted(object, index);
        }
    }

    /// Tell every observer the registry is going away. Any observer still
    /// registered afterwards is fatal.
    pub fn shutdown(&self) {
        let deletes = Arc::clone(&*self.delete.lock());
        for listener in deletes.iter().rev() {
            listener.on_registry_shutdown(self);
        }
        let remaining = self.delete_listener_count();
        if remaining > 0 {
            fatal(FatalError::ListenersRemaining {
                kind: "delete",
                remaining,
            });
        }

        let creates = Arc::clone(&*self.create.read());
        for listener in creates.iter().rev() {
            listener.on_registry_shutdown(self);
        }
        let remaining = self.create_listener_count();
        if remaining > 0 {
            fatal(FatalError::ListenersRemaining {
                kind: "create",
                remaining,
            });
        }
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("create", &self.create_listener_count())
            .field("delete", &self.delete_listener_count())
            .finish()
    }
}

fn same_create(a: &Arc<dyn CreateListener>, b: &dyn CreateListener) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), b as *const dyn CreateListener)
}

fn same_delete(a: &Arc<dyn DeleteListener>, b: &dyn DeleteListener) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), b as *const dyn DeleteListener)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ObjectHeader, TypeDescriptor};

    struct Thing {
        header: ObjectHeader,
    }

    impl ManagedObject for Thing {
        fn header(&self) -> &ObjectHeader {
            &self.header
        }
    }

    /// Records `(tag, index)` pairs into a shared journal.
    struct Recorder {
        tag: &'static str,
        journal: Arc<Mutex<Vec<(&'static str, ObjectIndex)>>>,
    }

    impl CreateListener for Recorder {
        fn on_object_created(&self, _object: &ObjectRef, index: ObjectIndex) {
            self.journal.lock().push((self.tag, index));
        }

        fn on_registry_shutdown(&self, listeners: &ListenerRegistry) {
            self.journal.lock().push((self.tag, -100));
            listeners.remove_create_listener(self);
        }
    }

    impl DeleteListener for Recorder {
        fn on_object_deleted(&self, _object: &dyn ManagedObject, index: ObjectIndex) {
            self.journal.lock().push((self.tag, index));
        }

        fn on_registry_shutdown(&self, listeners: &ListenerRegistry) {
            self.journal.lock().push((self.tag, -200));
            listeners.remove_delete_listener(self);
        }
    }

    struct SelfRemoving {
        hits: Mutex<u32>,
        listeners: Arc<ListenerRegistry>,
    }

    impl DeleteListener for SelfRemoving {
        fn on_object_deleted(&self, _object: &dyn ManagedObject, _index: ObjectIndex) {
            *self.hits.lock() += 1;
            self.listeners.remove_delete_listener(self);
        }

        fn on_registry_shutdown(&self, _listeners: &ListenerRegistry) {}
    }

    fn recorder(
        tag: &'static str,
        journal: &Arc<Mutex<Vec<(&'static str, ObjectIndex)>>>,
    ) -> Arc<Recorder> {
        Arc::new(Recorder {
            tag,
            journal: journal.clone(),
        })
    }

    fn thing() -> ObjectRef {
        Arc::new(Thing {
            header: ObjectHeader::new(TypeDescriptor::new("Thing"), "t"),
        })
    }

    #[test]
    fn test_create_in_order_delete_in_reverse() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let listeners = ListenerRegistry::new();
        let a = recorder("a", &journal);
        let b = recorder("b", &journal);
        listeners.add_create_listener(a.clone());
        listeners.add_create_listener(b.clone());
        listeners.add_delete_listener(a.clone());
        listeners.add_delete_listener(b.clone());

        let object = thing();
        listeners.notify_created(&object, 3);
        listeners.notify_deleted(object.as_ref(), 3);

        assert_eq!(*journal.lock(), vec![("a", 3), ("b", 3), ("b", 3), ("a", 3)]);
    }

    #[test]
    #[should_panic(expected = "create listener is already registered")]
    fn test_duplicate_create_listener_is_fatal() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let listeners = ListenerRegistry::new();
        let a = recorder("a", &journal);
        listeners.add_create_listener(a.clone());
        listeners.add_create_listener(a);
    }

    #[test]
    #[should_panic(expected = "delete listener is not registered")]
    fn test_removing_unknown_delete_listener_is_fatal() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let listeners = ListenerRegistry::new();
        let a = recorder("a", &journal);
        listeners.remove_delete_listener(a.as_ref());
    }

    #[test]
    fn test_self_removal_during_notification_does_not_skip() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let listeners = Arc::new(ListenerRegistry::new());
        let first = recorder("first", &journal);
        listeners.add_delete_listener(first.clone());
        let leaver = Arc::new(SelfRemoving {
            hits: Mutex::new(0),
            listeners: listeners.clone(),
        });
        listeners.add_delete_listener(leaver.clone());

        listeners.notify_deleted(thing().as_ref(), 1);
        assert_eq!(*leaver.hits.lock(), 1);
        assert_eq!(*journal.lock(), vec![("first", 1)]);
        assert_eq!(listeners.delete_listener_count(), 1);

        listeners.notify_deleted(thing().as_ref(), 2);
        assert_eq!(*leaver.hits.lock(), 1);
        listeners.remove_delete_listener(first.as_ref());
    }

    #[test]
    fn test_shutdown_with_cooperating_listeners() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let listeners = ListenerRegistry::new();
        let a = recorder("a", &journal);
        let b = recorder("b", &journal);
        listeners.add_delete_listener(a.clone());
        listeners.add_delete_listener(b.clone());
        listeners.add_create_listener(a.clone());

        listeners.shutdown();

        assert_eq!(
            *journal.lock(),
            vec![("b", -200), ("a", -200), ("a", -100)]
        );
        assert_eq!(listeners.create_listener_count(), 0);
        assert_eq!(listeners.delete_listener_count(), 0);
    }

    struct Stubborn;

    impl DeleteListener for Stubborn {
        fn on_object_deleted(&self, _object: &dyn ManagedObject, _index: ObjectIndex) {}
        fn on_registry_shutdown(&self, _listeners: &ListenerRegistry) {}
    }

    #[test]
    #[should_panic(expected = "delete listeners should be unregistered")]
    fn test_shutdown_with_lingering_listener_is_fatal() {
        let listeners = ListenerRegistry::new();
        listeners.add_delete_listener(Arc::new(Stubborn));
        listeners.shutdown();
    }
}
