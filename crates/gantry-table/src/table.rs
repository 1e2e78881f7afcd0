//! Dense per-category handle tables.

use tracing::trace;

use crate::error::{TableError, TableResult};

/// A small integer standing in for a host-owned object.
///
/// Handles are only meaningful within the category (table) that issued
/// them; shader handle 3 and buffer handle 3 are unrelated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u32);

impl Handle {
    /// Wrap a raw handle value from the wire.
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw wire value.
    pub fn raw(self) -> u32 {
        self.0
    }

    /// The backing-array index this handle denotes.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Handle {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One resource category's handle-to-object mapping.
///
/// Backed by an append-only `Vec`: the n-th `create` returns handle n-1,
/// with no gaps and no reuse. `delete` is a deliberate no-op (see the crate
/// docs for why).
pub struct HandleTable<T> {
    /// Category name, used in diagnostics and errors.
    category: &'static str,
    /// The host objects, indexed by handle.
    entries: Vec<T>,
}

impl<T> HandleTable<T> {
    /// Create an empty table for the given category.
    pub fn new(category: &'static str) -> Self {
        Self {
            category,
            entries: Vec::new(),
        }
    }

    /// The category name this table was created with.
    pub fn category(&self) -> &'static str {
        self.category
    }

    /// Number of handles ever allocated.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no handles have been allocated yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store `object` and return its newly assigned handle.
    pub fn create(&mut self, object: T) -> Handle {
        let handle = Handle(self.entries.len() as u32);
        self.entries.push(object);
        trace!(category = self.category, handle = handle.0, "Allocated handle");
        handle
    }

    /// Store a batch of objects, returning their handles in creation order.
    ///
    /// The output order matters: guests pair these positionally with their
    /// own side-channel bookkeeping.
    pub fn create_many(&mut self, objects: impl IntoIterator<Item = T>) -> Vec<Handle> {
        objects.into_iter().map(|obj| self.create(obj)).collect()
    }

    /// Resolve a handle to its host object.
    pub fn resolve(&self, handle: Handle) -> TableResult<&T> {
        self.entries
            .get(handle.index())
            .ok_or(TableError::UnknownHandle {
                category: self.category,
                handle: handle.raw(),
                live: self.entries.len(),
            })
    }

    /// Resolve a handle to its host object, mutably.
    pub fn resolve_mut(&mut self, handle: Handle) -> TableResult<&mut T> {
        let live = self.entries.len();
        self.entries
            .get_mut(handle.index())
            .ok_or(TableError::UnknownHandle {
                category: self.category,
                handle: handle.raw(),
                live,
            })
    }

    /// Accept a deletion request without releasing anything.
    ///
    /// The handle stays resolvable and is never reissued.
    pub fn delete(&mut self, handle: Handle) {
        trace!(
            category = self.category,
            handle = handle.raw(),
            "Delete accepted as no-op"
        );
    }
}

impl<T> std::fmt::Debug for HandleTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleTable")
            .field("category", &self.category)
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_dense_and_monotonic() {
        let mut table = HandleTable::new("shader");
        for expected in 0..8u32 {
            assert_eq!(table.create(expected * 10).raw(), expected);
        }
        assert_eq!(table.len(), 8);
    }

    #[test]
    fn test_resolve_round_trip() {
        let mut table = HandleTable::new("buffer");
        let a = table.create("first");
        let b = table.create("second");

        assert_eq!(*table.resolve(a).unwrap(), "first");
        assert_eq!(*table.resolve(b).unwrap(), "second");
    }

    #[test]
    fn test_unknown_handle() {
        let mut table = HandleTable::new("texture");
        table.create(1);

        let err = table.resolve(Handle::new(5)).unwrap_err();
        assert!(matches!(
            err,
            TableError::UnknownHandle {
                category: "texture",
                handle: 5,
                live: 1
            }
        ));
    }

    #[test]
    fn test_delete_does_not_recycle() {
        let mut table = HandleTable::new("buffer");
        let first = table.create("a");
        table.delete(first);

        // The deleted handle still resolves, and the next create does not
        // reuse its index.
        assert_eq!(*table.resolve(first).unwrap(), "a");
        assert_eq!(table.create("b").raw(), 1);
    }

    #[test]
    fn test_create_many_preserves_order() {
        let mut table = HandleTable::new("vertex array");
        table.create(0);

        let handles = table.create_many([10, 20, 30]);
        let raws: Vec<u32> = handles.iter().map(|h| h.raw()).collect();
        assert_eq!(raws, vec![1, 2, 3]);
        assert_eq!(*table.resolve(handles[2]).unwrap(), 30);
    }

    #[test]
    fn test_categories_are_independent() {
        let mut shaders = HandleTable::new("shader");
        let mut programs = HandleTable::new("program");
        shaders.create("vs");
        shaders.create("fs");

        // Numbering in one category is unaffected by the other.
        assert_eq!(programs.create("main").raw(), 0);
    }
}
