//! # Diagnostic Names
//!
//! Objects name their owner by index ([`ObjectHeader::outer_index`]), so a
//! full path is built by walking parent indices through the slot table rather
//! than following pointers. The walk stops at [`MAX_OUTER_DEPTH`] links, which
//! keeps an accidental cycle from hanging a diagnostic.
//!
//! [`ObjectHeader::outer_index`]: crate::object::ObjectHeader::outer_index

use std::sync::Arc;

use crate::object::{ManagedObject, ObjectIndex};
use crate::slot_table::SlotTable;

/// Longest outer chain followed when building a path.
pub const MAX_OUTER_DEPTH: usize = 64;

/// Dot-separated path from the outermost reachable owner down to `object`.
pub(crate) fn path_of(slots: &SlotTable, object: &dyn ManagedObject) -> String {
    let mut parts = vec![object.header().name().to_string()];
    let mut outer = object.header().outer_index();

    while outer >= 0 && parts.len() <= MAX_OUTER_DEPTH {
        let Some(parent) = slots.get(outer).and_then(|slot| slot.object()) else {
            break;
        };
        parts.push(parent.header().name().to_string());
        outer = parent.header().outer_index();
    }

    parts.reverse();
    parts.join(".")
}

/// Path name of the object at `index`, or `None` if the slot is empty.
pub(crate) fn path_name(slots: &SlotTable, index: ObjectIndex) -> Option<String> {
    let object = slots.get(index)?.object()?;
    Some(path_of(slots, object.as_ref()))
}

/// `"{type} {path}"` for the object at `index`, computed once per occupant.
pub(crate) fn stat_name(slots: &SlotTable, index: ObjectIndex) -> Option<Arc<str>> {
    let slot = slots.get(index)?;
    if let Some(name) = slot.cached_stat_name() {
        return Some(name);
    }
    let object = slot.object()?;
    let name: Arc<str> = format!(
        "{} {}",
        object.header().type_descriptor(),
        path_of(slots, object.as_ref())
    )
    .into();
    Some(slot.cache_stat_name(object.as_ref(), name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::InternalObjectFlags;
    use crate::object::{ObjectHeader, ObjectRef, TypeDescriptor, INDEX_NONE};

    struct Thing {
        header: ObjectHeader,
    }

    impl ManagedObject for Thing {
        fn header(&self) -> &ObjectHeader {
            &self.header
        }
    }

    fn put(table: &SlotTable, name: &str, outer: ObjectIndex) -> ObjectRef {
        let object: ObjectRef = Arc::new(Thing {
            header: ObjectHeader::new(TypeDescriptor::new("Thing"), name).with_outer(outer),
        });
        let index = table.append_single().unwrap();
        table
            .at(index)
            .publish(Arc::downgrade(&object), InternalObjectFlags::empty(), 0);
        object
    }

    #[test]
    fn test_path_follows_outer_chain() {
        let table = SlotTable::reserve(8, false);
        let _pkg = put(&table, "Game", INDEX_NONE);
        let _level = put(&table, "Level", 0);
        let _actor = put(&table, "Door_3", 1);

        assert_eq!(path_name(&table, 2).as_deref(), Some("Game.Level.Door_3"));
        assert_eq!(path_name(&table, 0).as_deref(), Some("Game"));
        assert_eq!(path_name(&table, 5), None);
    }

    #[test]
    fn test_cycle_is_bounded() {
        let table = SlotTable::reserve(4, false);
        let _a = put(&table, "a", 1);
        let _b = put(&table, "b", 0);

        let path = path_name(&table, 0).unwrap();
        assert_eq!(path.split('.').count(), MAX_OUTER_DEPTH + 1);
    }

    #[test]
    fn test_stat_name_is_cached() {
        let table = SlotTable::reserve(4, false);
        let _root = put(&table, "Root", INDEX_NONE);
        let child = put(&table, "Child", 0);

        let first = stat_name(&table, 1).unwrap();
        assert_eq!(&*first, "Thing Root.Child");

        // Re-parenting after the first request does not change the cached name.
        child.header().set_outer_index(INDEX_NONE);
        assert_eq!(path_name(&table, 1).as_deref(), Some("Child"));
        let again = stat_name(&table, 1).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
    }
}
