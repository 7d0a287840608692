//! Document store
//!
//! The persisted state is a handful of whole documents. Writes are atomic:
//! the new bytes land in a temporary file in the target directory which is
//! then renamed over the old document, so a reader sees either the old or
//! the new content and never a torn write.

use anyhow::{anyhow, Context, Result};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub trait DocumentStore {
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Replace the document at `path`. Either fully succeeds or leaves the
    /// prior content intact.
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Remove `path` and everything below it. Missing paths are not an error.
    fn delete_tree(&self, path: &Path) -> Result<()>;
}

/// Documents on the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDocumentStore;

impl DocumentStore for FsDocumentStore {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;
        tmp.write_all(bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tmp.as_file()
            .sync_all()
            .with_context(|| format!("Failed to sync {}", path.display()))?;
        tmp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "document written");
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn delete_tree(&self, path: &Path) -> Result<()> {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
        }
    }
}

/// In-memory documents, for tests and dry runs.
///
/// Writes can be made to fail on demand to exercise persistence errors.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
    fail_writes: Cell<bool>,
    fail_deletes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.set(fail);
    }

    pub fn len(&self) -> usize {
        self.documents.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.borrow().is_empty()
    }

    /// Raw bytes currently stored at `path`.
    pub fn snapshot(&self, path: &Path) -> Option<Vec<u8>> {
        self.documents.borrow().get(path).cloned()
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.snapshot(path)
            .ok_or_else(|| anyhow!("Failed to read {}: no such document", path.display()))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if self.fail_writes.get() {
            return Err(anyhow!("Failed to write {}: store is read-only", path.display()));
        }
        self.documents
            .borrow_mut()
            .insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.documents
            .borrow()
            .keys()
            .any(|p| p.starts_with(path))
    }

    fn delete_tree(&self, path: &Path) -> Result<()> {
        if self.fail_deletes.get() {
            return Err(anyhow!("Failed to delete {}: permission denied", path.display()));
        }
        self.documents
            .borrow_mut()
            .retain(|p, _| !p.starts_with(path));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_write_replaces_content() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("project/state.yaml");
        let store = FsDocumentStore;

        store.write(&path, b"first").unwrap();
        store.write(&path, b"second").unwrap();
        assert_eq!(store.read(&path).unwrap(), b"second");

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_fs_delete_tree_tolerates_missing() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("project");
        let store = FsDocumentStore;

        store.write(&dir.join("state.yaml"), b"x").unwrap();
        assert!(store.exists(&dir));
        store.delete_tree(&dir).unwrap();
        assert!(!store.exists(&dir));
        store.delete_tree(&dir).unwrap();
    }

    #[test]
    fn test_memory_store_failure_keeps_prior_content() {
        let store = MemoryStore::new();
        let path = Path::new("/repo/.weft/project/state.yaml");
        store.write(path, b"v1").unwrap();

        store.fail_writes(true);
        assert!(store.write(path, b"v2").is_err());
        assert_eq!(store.read(path).unwrap(), b"v1");
    }

    #[test]
    fn test_memory_store_delete_tree() {
        let store = MemoryStore::new();
        store
            .write(Path::new("/repo/.weft/project/state.yaml"), b"x")
            .unwrap();
        store
            .write(Path::new("/repo/.weft/config.toml"), b"y")
            .unwrap();

        assert!(store.exists(Path::new("/repo/.weft/project")));
        store.delete_tree(Path::new("/repo/.weft/project")).unwrap();
        assert!(!store.exists(Path::new("/repo/.weft/project")));
        assert_eq!(store.len(), 1);
    }
}
