//! Load-once dataset cache
//!
//! The report is read on first use and kept for the life of the process.
//! The entry is keyed by the file's modification time, so rewriting the
//! report is picked up on the next request; `invalidate` forces a reload.

use crate::dataset::Dataset;
use crate::error::{DashboardError, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use tracing::{info, warn};

#[derive(Debug, Clone)]
struct CacheEntry {
    dataset: Arc<Dataset>,
    modified: Option<SystemTime>,
    loaded_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct DatasetCache {
    path: PathBuf,
    entry: RwLock<Option<CacheEntry>>,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entry: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached dataset, loading it when absent or when the file has changed
    /// since it was read.
    pub fn get(&self) -> Result<Arc<Dataset>> {
        let modified = self.modified_time();

        {
            let guard = self.entry.read().map_err(|_| poisoned())?;
            if let Some(entry) = guard.as_ref() {
                if entry.modified == modified {
                    return Ok(Arc::clone(&entry.dataset));
                }
                info!("{} changed on disk, reloading", self.path.display());
            }
        }

        let mut guard = self.entry.write().map_err(|_| poisoned())?;
        // Another caller may have reloaded while we waited for the write lock
        if let Some(entry) = guard.as_ref() {
            if entry.modified == modified {
                return Ok(Arc::clone(&entry.dataset));
            }
        }

        let dataset = Arc::new(Dataset::load(&self.path)?);
        *guard = Some(CacheEntry {
            dataset: Arc::clone(&dataset),
            modified,
            loaded_at: Utc::now(),
        });
        Ok(dataset)
    }

    /// Drop the cached dataset; the next `get` reads the file again
    pub fn invalidate(&self) -> Result<()> {
        let mut guard = self.entry.write().map_err(|_| poisoned())?;
        if guard.take().is_some() {
            info!("Dataset cache for {} invalidated", self.path.display());
        }
        Ok(())
    }

    /// When the current entry was loaded, `None` if nothing is cached
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.entry
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|entry| entry.loaded_at))
    }

    fn modified_time(&self) -> Option<SystemTime> {
        match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(time) => Some(time),
            Err(e) => {
                warn!("Cannot stat {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

fn poisoned() -> DashboardError {
    DashboardError::Cache("dataset cache lock poisoned".to_string())
}
