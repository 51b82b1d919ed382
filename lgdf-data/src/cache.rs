//! Memoized dataset loading.
//!
//! The source CSV is static for the life of a session, so each distinct file
//! is parsed once and the resulting [`Dataset`] is shared read-only.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use lgdf_core::Dataset;
use tracing::debug;

use crate::loader::{DatasetLoader, LoadError};

/// Caches loaded datasets by canonical source path.
///
/// All entries are loaded with the same [`DatasetLoader`], so the tax
/// category is fixed per cache.
#[derive(Debug)]
pub struct DatasetCache {
    loader: DatasetLoader,
    entries: Mutex<HashMap<PathBuf, Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new(loader: DatasetLoader) -> Self {
        Self {
            loader,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn loader(&self) -> &DatasetLoader {
        &self.loader
    }

    /// Returns the cached dataset for `path`, loading it on first use.
    ///
    /// Different spellings of the same file (relative, `..`, symlinks) share
    /// one entry. Failed loads are not cached.
    ///
    /// # Errors
    ///
    /// [`LoadError::DataUnavailable`] if the path cannot be resolved, or any
    /// error from [`DatasetLoader::load`].
    pub fn get_or_load(
        &self,
        path: &Path,
    ) -> Result<Arc<Dataset>, LoadError> {
        let key = path
            .canonicalize()
            .map_err(|source| LoadError::DataUnavailable {
                path: path.to_path_buf(),
                source,
            })?;

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(dataset) = entries.get(&key) {
            debug!(path = %key.display(), "dataset cache hit");
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(self.loader.load(&key)?);
        entries.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Number of cached datasets.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached dataset. Outstanding `Arc`s stay valid.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
