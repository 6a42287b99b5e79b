//! Process-wide cache of loaded artifacts
//!
//! Entries are keyed by the source file's identity (canonical path, size
//! and modification time). A loaded value is shared behind an `Arc` and is
//! never replaced: when the file changes its key changes, and the next
//! lookup loads it under the new key.

use crate::error::{ForecastError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use tracing::{debug, info};

/// Identity of an artifact on disk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl ArtifactKey {
    /// Identity of the file at `path` as it is right now
    pub fn of<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = fs::canonicalize(path)?;
        let meta = fs::metadata(&path)?;
        Ok(Self {
            path,
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Lazily populated cache of values loaded from files
#[derive(Debug)]
pub struct ArtifactCache<T> {
    entries: RwLock<HashMap<ArtifactKey, Arc<T>>>,
}

impl<T> Default for ArtifactCache<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

fn poisoned() -> ForecastError {
    ForecastError::DataError("artifact cache lock poisoned".to_string())
}

impl<T> ArtifactCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `path`, loading it on first use of its identity
    pub fn get_or_load<P, F>(&self, path: P, loader: F) -> Result<Arc<T>>
    where
        P: AsRef<Path>,
        F: FnOnce(&Path) -> Result<T>,
    {
        let key = ArtifactKey::of(path)?;

        if let Some(hit) = self.entries.read().map_err(|_| poisoned())?.get(&key) {
            debug!(path = %key.path.display(), "artifact cache hit");
            return Ok(Arc::clone(hit));
        }

        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        // Another caller may have loaded it between the two locks
        if let Some(hit) = entries.get(&key) {
            return Ok(Arc::clone(hit));
        }

        info!(path = %key.path.display(), bytes = key.len, "loading artifact");
        let value = Arc::new(loader(&key.path)?);
        entries.insert(key, Arc::clone(&value));
        Ok(value)
    }

    /// Whether a value is cached under `key`
    pub fn contains(&self, key: &ArtifactKey) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    /// Number of cached identities
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
