//! Filesystem collaborator interface.
//!
//! Persistence layers never touch paths directly; they read and write raw
//! bytes through a [`FileStore`] keyed by a logical file name and a
//! directory category (`"archetypes"`, `"blueprints"`, …).

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::error::StoreError;

/// Byte-level file access by logical name and directory category.
pub trait FileStore {
    fn read(&self, name: &str, category: &str) -> Result<Vec<u8>, StoreError>;

    /// Write the full contents of a file. A failed write must leave any
    /// existing file intact — never truncated.
    fn write(&mut self, name: &str, category: &str, bytes: &[u8]) -> Result<(), StoreError>;

    fn exists(&self, name: &str, category: &str) -> bool;
}

/// Directory-backed store: `<root>/<category>/<name>`.
///
/// Writes go to a sibling temp file first and are moved into place with an
/// atomic rename, so an interrupted write leaves either the old content or
/// the new content on disk.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_of(&self, name: &str, category: &str) -> PathBuf {
        self.root.join(category).join(name)
    }
}

impl FileStore for DirStore {
    fn read(&self, name: &str, category: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_of(name, category);
        if !path.exists() {
            return Err(StoreError::NotFound {
                name: name.to_string(),
                category: category.to_string(),
            });
        }
        Ok(fs::read(path)?)
    }

    fn write(&mut self, name: &str, category: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let dir = self.root.join(category);
        fs::create_dir_all(&dir)?;

        let path = dir.join(name);
        let tmp = dir.join(format!("{}.tmp", name));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn exists(&self, name: &str, category: &str) -> bool {
        self.path_of(name, category).exists()
    }
}

/// HashMap-backed store for tests.
#[derive(Default)]
pub struct MemStore {
    files: HashMap<(String, String), Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileStore for MemStore {
    fn read(&self, name: &str, category: &str) -> Result<Vec<u8>, StoreError> {
        self.files
            .get(&(category.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
                category: category.to_string(),
            })
    }

    fn write(&mut self, name: &str, category: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.files
            .insert((category.to_string(), name.to_string()), bytes.to_vec());
        Ok(())
    }

    fn exists(&self, name: &str, category: &str) -> bool {
        self.files
            .contains_key(&(category.to_string(), name.to_string()))
    }
}
