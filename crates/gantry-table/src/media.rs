//! Path-keyed caches for named media resources.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::debug;

use crate::error::{TableError, TableResult};

/// Cache of host media objects keyed by their source path.
///
/// Named media (images, sounds) skip the integer-handle indirection because
/// the guest already holds the path as a string constant. The cache
/// guarantees at most one live host object per distinct path: creation
/// happens once, on first reference, and entries are never evicted.
pub struct MediaCache<T> {
    /// Media kind, used in diagnostics and errors.
    kind: &'static str,
    /// Live objects by path.
    entries: HashMap<String, T>,
}

impl<T> MediaCache<T> {
    /// Create an empty cache for the given media kind.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    /// Number of distinct paths loaded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been loaded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `path` has a live object.
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Fetch the object for `path`, creating it on first reference.
    ///
    /// `create` runs at most once per distinct path for the life of the
    /// cache.
    pub fn get_or_insert_with(&mut self, path: &str, create: impl FnOnce() -> T) -> &mut T {
        match self.entries.entry(path.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                debug!(kind = self.kind, path = entry.key().as_str(), "Creating media resource");
                entry.insert(create())
            }
        }
    }

    /// Fetch the object for `path`, failing if it was never created.
    pub fn get_mut(&mut self, path: &str) -> TableResult<&mut T> {
        let kind = self.kind;
        self.entries
            .get_mut(path)
            .ok_or_else(|| TableError::UnknownMedia {
                kind,
                path: path.to_string(),
            })
    }

    /// Fetch the object for `path` immutably, failing if it was never created.
    pub fn get(&self, path: &str) -> TableResult<&T> {
        self.entries.get(path).ok_or_else(|| TableError::UnknownMedia {
            kind: self.kind,
            path: path.to_string(),
        })
    }
}

impl<T> std::fmt::Debug for MediaCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaCache")
            .field("kind", &self.kind)
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_instance_per_path() {
        let mut cache = MediaCache::new("image");
        let mut creations = 0;

        for _ in 0..3 {
            cache.get_or_insert_with("img/ship.png", || {
                creations += 1;
                creations
            });
        }

        assert_eq!(creations, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_paths_are_distinct_objects() {
        let mut cache = MediaCache::new("sound");
        *cache.get_or_insert_with("a.ogg", || 1) = 10;
        *cache.get_or_insert_with("b.ogg", || 2) = 20;

        assert_eq!(*cache.get_mut("a.ogg").unwrap(), 10);
        assert_eq!(*cache.get_mut("b.ogg").unwrap(), 20);
    }

    #[test]
    fn test_unknown_path() {
        let mut cache: MediaCache<()> = MediaCache::new("sound");
        let err = cache.get_mut("never-loaded.ogg").unwrap_err();
        assert!(matches!(err, TableError::UnknownMedia { kind: "sound", .. }));
    }
}
