//! Filesystem-backed file and storage backends.
//!
//! A native host serves the remote-file protocol from an asset directory
//! sitting next to the module, and persists storage keys as one file each
//! under a state directory. Reads block the calling thread; that is the
//! contract (see [`crate::io`]).
//!
//! In-memory equivalents ([`MemFiles`], [`MemStorage`]) back deterministic
//! tests and embedders that manage persistence themselves.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use gantry_mem::{decode_latin1, encode_latin1};

use crate::api::{FileApi, StorageApi};

/// Serves remote-file requests from a directory tree.
#[derive(Debug, Clone)]
pub struct DirFiles {
    root: PathBuf,
}

impl DirFiles {
    /// Serve files under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The asset root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileApi for DirFiles {
    fn fetch(&mut self, path: &str) -> Option<String> {
        let relative = sanitize_relative(path)?;
        let full = self.root.join(relative);
        match std::fs::read(&full) {
            Ok(bytes) => Some(decode_latin1(&bytes)),
            Err(err) => {
                debug!(path = %full.display(), %err, "Asset read failed");
                None
            }
        }
    }
}

/// Reject paths that would escape the asset root.
fn sanitize_relative(path: &str) -> Option<PathBuf> {
    let path = Path::new(path);
    if path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        Some(path.to_path_buf())
    } else {
        warn!(path = %path.display(), "Rejected non-relative asset path");
        None
    }
}

/// Persists storage keys as one file per key under a directory.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    /// Store keys under `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        // Keys are flat names; separators collapse so a key can never
        // address outside the storage directory.
        self.root.join(key.replace(['/', '\\'], "_"))
    }
}

impl StorageApi for DiskStorage {
    fn read(&self, key: &str) -> Option<String> {
        std::fs::read(self.key_path(key))
            .ok()
            .map(|bytes| decode_latin1(&bytes))
    }

    fn write(&mut self, key: &str, text: &str) -> bool {
        if let Err(err) = std::fs::create_dir_all(&self.root) {
            warn!(root = %self.root.display(), %err, "Storage directory unavailable");
            return false;
        }
        match std::fs::write(self.key_path(key), encode_latin1(text)) {
            Ok(()) => true,
            Err(err) => {
                warn!(key, %err, "Storage write failed");
                false
            }
        }
    }
}

/// In-memory file set for tests and self-contained embedders.
#[derive(Debug, Clone, Default)]
pub struct MemFiles {
    files: HashMap<String, String>,
}

impl MemFiles {
    /// Create an empty file set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, builder-style.
    pub fn with_file(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.files.insert(path.into(), text.into());
        self
    }

    /// Add or replace a file.
    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }
}

impl FileApi for MemFiles {
    fn fetch(&mut self, path: &str) -> Option<String> {
        self.files.get(path).cloned()
    }
}

/// In-memory storage for tests and self-contained embedders.
#[derive(Debug, Clone, Default)]
pub struct MemStorage {
    entries: HashMap<String, String>,
}

impl MemStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect a stored value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StorageApi for MemStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn write(&mut self, key: &str, text: &str) -> bool {
        self.entries.insert(key.to_string(), text.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gantry-fs-{}-{}", std::process::id(), name));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_dir_files_fetch() {
        let dir = scratch_dir("fetch");
        std::fs::write(dir.join("level1.txt"), b"12 34 56").unwrap();

        let mut files = DirFiles::new(&dir);
        assert_eq!(files.fetch("level1.txt").as_deref(), Some("12 34 56"));
        assert_eq!(files.fetch("missing.txt"), None);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_dir_files_rejects_escapes() {
        let dir = scratch_dir("escape");
        let mut files = DirFiles::new(&dir);
        assert_eq!(files.fetch("../outside.txt"), None);
        assert_eq!(files.fetch("/etc/hostname"), None);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_disk_storage_round_trip() {
        let dir = scratch_dir("storage");
        let mut storage = DiskStorage::new(&dir);

        assert_eq!(storage.read("save1"), None);
        assert!(storage.write("save1", "abc"));
        assert_eq!(storage.read("save1").as_deref(), Some("abc"));

        // A key with separators stays inside the storage directory.
        assert!(storage.write("a/b", "x"));
        assert!(dir.join("a_b").exists());

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_mem_storage_round_trip() {
        let mut storage = MemStorage::new();
        assert_eq!(storage.read("save1"), None);
        assert!(storage.write("save1", "abc"));
        assert_eq!(storage.read("save1").as_deref(), Some("abc"));
        assert_eq!(storage.get("save1"), Some("abc"));
    }
}
