//! Storage layer for recipebox.
//!
//! The catalog is a single pretty-printed JSON array on disk. Every call
//! re-reads the file, and every mutation replaces it atomically by writing
//! a sibling `.tmp` file and renaming it over the catalog.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::recipe::Recipe;

/// Default catalog file name inside the data directory.
pub const CATALOG_FILE_NAME: &str = "recipes.json";

/// JSON-file backed recipe catalog.
///
/// Reads take no lock: the rename keeps the file whole for concurrent
/// readers. Read-modify-write cycles hold `write_lock`, so mutations made
/// through one `RecipeStore` never lose each other's updates. Writers in
/// other processes still race, and the last rename wins.
#[derive(Debug)]
pub struct RecipeStore {
    /// Path to the catalog file.
    path: PathBuf,
    /// Serializes mutations made through this store.
    write_lock: Mutex<()>,
}

/// Outcome of [`RecipeStore::remove_by_indices`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalSummary {
    /// Number of entries removed.
    pub removed: usize,
    /// Number of entries left in the catalog.
    pub remaining: usize,
}

impl RecipeStore {
    /// Create a store backed by the catalog file at `path`.
    ///
    /// Nothing is touched on disk until the first mutation.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store for [`CATALOG_FILE_NAME`] inside `data_dir`.
    #[must_use]
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(CATALOG_FILE_NAME))
    }

    /// Get the path to the catalog file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the catalog.
    ///
    /// A missing or unparsable file yields an empty catalog. Array elements
    /// that are not recipes are left out of the result but stay on disk.
    #[must_use]
    pub fn load(&self) -> Vec<Recipe> {
        self.load_entries()
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(recipe) => Some(recipe),
                Err(e) => {
                    warn!("Skipping catalog entry {index} that is not a recipe: {e}");
                    None
                }
            })
            .collect()
    }

    /// Append an entry to the catalog and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the
    /// catalog cannot be written.
    pub fn append(&self, entry: Recipe) -> Result<Recipe> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut entries = self.load_entries();
        entries.push(serde_json::to_value(&entry)?);
        self.persist(&entries)?;

        info!(
            "Added recipe \"{}\" at index {}",
            entry.name,
            entries.len() - 1
        );
        Ok(entry)
    }

    /// Remove every entry whose position is in `indices`.
    ///
    /// Positions outside the catalog, negative ones included, are ignored.
    /// The catalog is rewritten even when nothing matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the
    /// catalog cannot be written.
    pub fn remove_by_indices(&self, indices: &BTreeSet<i64>) -> Result<RemovalSummary> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let entries = self.load_entries();
        let before = entries.len();
        let kept: Vec<Value> = entries
            .into_iter()
            .enumerate()
            .filter(|(position, _)| {
                i64::try_from(*position).map_or(true, |position| !indices.contains(&position))
            })
            .map(|(_, entry)| entry)
            .collect();

        self.persist(&kept)?;

        let summary = RemovalSummary {
            removed: before - kept.len(),
            remaining: kept.len(),
        };
        info!(
            "Removed {} recipes, {} remaining",
            summary.removed, summary.remaining
        );
        Ok(summary)
    }

    /// Read the raw catalog array, treating any failure as empty.
    fn load_entries(&self) -> Vec<Value> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No catalog at {}, starting empty", self.path.display());
                return Vec::new();
            }
            Err(e) => {
                warn!(
                    "Failed to read catalog at {}: {e}; treating as empty",
                    self.path.display()
                );
                return Vec::new();
            }
        };

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                warn!(
                    "Catalog at {} is not a JSON array; treating as empty",
                    self.path.display()
                );
                Vec::new()
            }
            Err(e) => {
                warn!(
                    "Catalog at {} is not valid JSON ({e}); treating as empty",
                    self.path.display()
                );
                Vec::new()
            }
        }
    }

    /// Write `entries` to the sibling temp file, then rename it over the catalog.
    fn persist(&self, entries: &[Value]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let json = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.temp_path();

        std::fs::write(&tmp_path, json).map_err(|source| Error::CatalogWrite {
            path: tmp_path.clone(),
            source,
        })?;

        if let Err(source) = std::fs::rename(&tmp_path, &self.path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(Error::CatalogReplace {
                path: self.path.clone(),
                source,
            });
        }

        debug!(
            "Wrote {} entries to {}",
            entries.len(),
            self.path.display()
        );
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}
