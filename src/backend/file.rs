//! File-backed storage medium.
//!
//! Keeps every key in one JSON object on disk, mirroring how browser local
//! storage persists a single origin's key space. Reads are served from memory.
//! Each write re-reads the file, applies its single key to that copy, rewrites
//! the file through a temporary sibling and a rename, and only then replaces
//! the in-memory map. A failed write leaves memory and disk unchanged.
//!
//! Within one process, clone a single `FileBackend` per path: clones share the
//! map and the lock. Separate instances on the same path see each other's keys
//! at their next write, but writes racing across instances are not serialized.

use super::CacheBackend;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Persistent storage medium backed by a single JSON file.
///
/// # Example
///
/// ```no_run
/// use portal_cache::backend::{CacheBackend, FileBackend};
///
/// # fn main() -> portal_cache::Result<()> {
/// let backend = FileBackend::open("/var/lib/portal/storage.json")?;
/// backend.set("cache_group_1", "{}".to_string())?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct FileBackend {
    path: PathBuf,
    entries: Arc<RwLock<BTreeMap<String, String>>>,
    quota_bytes: Option<usize>,
}

impl FileBackend {
    /// Open (or lazily create) the storage file at `path`.
    ///
    /// A missing file is an empty medium; the file is created on first write.
    ///
    /// # Errors
    /// Returns `Err` if the file exists but cannot be read or is not a JSON
    /// object of strings
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = load_file(&path)?;

        debug!("✓ File storage opened at {} ({} keys)", path.display(), entries.len());

        Ok(FileBackend {
            path,
            entries: Arc::new(RwLock::new(entries)),
            quota_bytes: None,
        })
    }

    /// Reject writes once keys plus values exceed `bytes`.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }

    /// Location of the storage file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .read()
            .map_err(|_| Error::BackendError("file storage lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .write()
            .map_err(|_| Error::BackendError("file storage lock poisoned".to_string()))
    }

    /// Apply one key change to the current file contents and persist it.
    /// Memory is only replaced once the file has been written.
    fn commit<F>(&self, change: F) -> Result<bool>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> Result<bool>,
    {
        let mut entries = self.write()?;
        let mut next = load_file(&self.path)?;
        if !change(&mut next)? {
            *entries = next;
            return Ok(false);
        }
        self.persist(&next)?;
        *entries = next;
        Ok(true)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let text = serde_json::to_string(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn load_file(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let text = fs::read_to_string(path)?;
    if text.trim().is_empty() {
        Ok(BTreeMap::new())
    } else {
        Ok(serde_json::from_str(&text)?)
    }
}

impl CacheBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let quota = self.quota_bytes;
        self.commit(|entries| {
            if let Some(limit) = quota {
                let used: usize = entries
                    .iter()
                    .filter(|(k, _)| k.as_str() != key)
                    .map(|(k, v)| k.len() + v.len())
                    .sum();
                let requested = used + key.len() + value.len();
                if requested > limit {
                    return Err(Error::QuotaExceeded { requested, limit });
                }
            }
            entries.insert(key.to_string(), value);
            Ok(true)
        })?;

        debug!("✓ File SET {}", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        if self.commit(|entries| Ok(entries.remove(key).is_some()))? {
            debug!("✓ File REMOVE {}", key);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}
