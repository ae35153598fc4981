//! Durable per-subject memory records with an in-memory cache.
//!
//! Layout: `<root>/memories/<code>.json`, one pretty-printed JSON record per
//! subject.
//!
//! [`MemoryStore::load`] hands out the cached `Arc` itself, so concurrent
//! loads of the same code share one instance. The record cannot be mutated
//! through the `Arc`; callers that want to change it take an owned copy and
//! [`save`](MemoryStore::save) it back, which replaces the cached instance.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tempfile::NamedTempFile;

use super::error::{MemoryError, MemoryResult};
use super::model::SubjectMemory;

const RECORD_EXT: &str = "json";

/// Keyed store of subject memory records.
pub trait MemoryStore: Send + Sync {
    /// Load the record for `code`. Returns [`MemoryError::NotFound`] if absent.
    fn load(&self, code: &str) -> MemoryResult<Arc<SubjectMemory>>;

    /// Durably write `memory`, then make it the cached copy.
    fn save(&self, memory: &SubjectMemory) -> MemoryResult<()>;

    /// Remove `code` from the cache and from durable storage.
    fn delete(&self, code: &str) -> MemoryResult<()>;

    /// Codes with a durable record, independent of cache contents.
    fn list(&self) -> MemoryResult<Vec<String>>;

    /// Drop the cached copy of `code`, if any.
    fn invalidate(&self, code: &str);
}

/// Reject codes that would escape the records directory.
pub fn validate_code(code: &str) -> MemoryResult<()> {
    let bad = code.is_empty()
        || code == "."
        || code == ".."
        || code.contains(['/', '\\', '\0']);
    if bad {
        return Err(MemoryError::InvalidCode(code.to_string()));
    }
    Ok(())
}

fn poisoned<T>(_: T) -> MemoryError {
    MemoryError::Io(std::io::Error::other("memory cache lock poisoned"))
}

/// Filesystem-backed [`MemoryStore`].
///
/// A single reader/writer lock guards the cache: loads run concurrently,
/// saves and deletes are exclusive with everything else.
#[derive(Debug)]
pub struct FileMemoryStore {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Arc<SubjectMemory>>>,
}

impl FileMemoryStore {
    /// Create a store rooted at `root`. Creates `root/memories/` if needed.
    pub fn new(root: impl AsRef<Path>) -> MemoryResult<Self> {
        let dir = root.as_ref().join("memories");
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Directory holding the record files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether `code` currently has a cached copy.
    pub fn is_cached(&self, code: &str) -> bool {
        self.read_cache()
            .map(|cache| cache.contains_key(code))
            .unwrap_or(false)
    }

    fn record_path(&self, code: &str) -> PathBuf {
        self.dir.join(format!("{code}.{RECORD_EXT}"))
    }

    fn read_cache(&self) -> MemoryResult<RwLockReadGuard<'_, HashMap<String, Arc<SubjectMemory>>>> {
        self.cache.read().map_err(poisoned)
    }

    fn write_cache(
        &self,
    ) -> MemoryResult<RwLockWriteGuard<'_, HashMap<String, Arc<SubjectMemory>>>> {
        self.cache.write().map_err(poisoned)
    }

    fn not_found_or_io(code: &str, e: std::io::Error) -> MemoryError {
        if e.kind() == std::io::ErrorKind::NotFound {
            MemoryError::NotFound {
                code: code.to_string(),
            }
        } else {
            MemoryError::Io(e)
        }
    }
}

impl MemoryStore for FileMemoryStore {
    fn load(&self, code: &str) -> MemoryResult<Arc<SubjectMemory>> {
        validate_code(code)?;

        if let Some(hit) = self.read_cache()?.get(code) {
            return Ok(Arc::clone(hit));
        }

        let data = fs::read(self.record_path(code)).map_err(|e| Self::not_found_or_io(code, e))?;
        let memory: SubjectMemory = serde_json::from_slice(&data)?;
        let memory = Arc::new(memory);

        // A save that raced this read has already cached newer state.
        let mut cache = self.write_cache()?;
        let cached = cache.entry(code.to_string()).or_insert(memory);
        Ok(Arc::clone(cached))
    }

    fn save(&self, memory: &SubjectMemory) -> MemoryResult<()> {
        validate_code(&memory.code)?;
        let mut cache = self.write_cache()?;

        let data = serde_json::to_vec_pretty(memory)?;

        // Atomic write: temp file in the same directory, then rename.
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&data)?;
        tmp.persist(self.record_path(&memory.code))
            .map_err(|e| e.error)?;

        cache.insert(memory.code.clone(), Arc::new(memory.clone()));
        Ok(())
    }

    fn delete(&self, code: &str) -> MemoryResult<()> {
        validate_code(code)?;
        let mut cache = self.write_cache()?;

        // The cache entry stays gone even if the file removal fails.
        cache.remove(code);
        fs::remove_file(self.record_path(code)).map_err(|e| Self::not_found_or_io(code, e))
    }

    fn list(&self) -> MemoryResult<Vec<String>> {
        let mut codes = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                codes.push(stem.to_string());
            }
        }
        codes.sort();
        Ok(codes)
    }

    fn invalidate(&self, code: &str) {
        if let Ok(mut cache) = self.write_cache() {
            cache.remove(code);
        }
    }
}
