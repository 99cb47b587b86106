use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use locsync_config::SyncConfig;
use locsync_core::{Catalog, Result, SyncError};
use once_cell::sync::Lazy;

use crate::util::write_atomic;

/// One mutex per catalog file; saves of the same path never overlap.
static SAVE_LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    let mut locks = SAVE_LOCKS.lock().unwrap_or_else(|e| e.into_inner());
    locks.entry(path.to_path_buf()).or_default().clone()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    /// The file already held exactly these bytes.
    Unchanged,
}

/// Loads and saves per-language catalogs at the paths the configuration's
/// template resolves to. Knows nothing about dry runs; callers decide
/// whether to call [`CatalogStore::save`].
#[derive(Debug, Clone, Copy)]
pub struct CatalogStore<'a> {
    config: &'a SyncConfig,
}

impl<'a> CatalogStore<'a> {
    pub fn new(config: &'a SyncConfig) -> Self {
        Self { config }
    }

    pub fn path(&self, language: &str) -> PathBuf {
        self.config.catalog_path(language)
    }

    /// Load `language`'s catalog. A missing file is an empty catalog when
    /// `create_if_missing` is set and [`SyncError::CatalogNotFound`] otherwise.
    pub fn load(&self, language: &str, create_if_missing: bool) -> Result<Catalog> {
        let path = self.path(language);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if create_if_missing {
                    tracing::debug!(event = "catalog_absent", lang = language, path = %path.display());
                    return Ok(Catalog::new());
                }
                return Err(SyncError::CatalogNotFound {
                    language: language.to_string(),
                    path,
                });
            }
            Err(source) => {
                return Err(SyncError::CatalogIo {
                    language: language.to_string(),
                    path,
                    source,
                })
            }
        };
        let catalog = Catalog::from_json_str(&text).map_err(|e| SyncError::MalformedCatalog {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        tracing::debug!(event = "catalog_loaded", lang = language, path = %path.display(), top_level = catalog.len());
        Ok(catalog)
    }

    /// Persist `catalog`, creating parent directories. Skips the write when
    /// the file already holds the same bytes.
    pub fn save(&self, language: &str, catalog: &Catalog) -> Result<SaveOutcome> {
        let path = self.path(language);
        let io_err = |source: std::io::Error| SyncError::CatalogIo {
            language: language.to_string(),
            path: path.clone(),
            source,
        };
        let text = catalog
            .to_json_pretty()
            .map_err(|e| io_err(std::io::Error::new(ErrorKind::InvalidData, e)))?;

        let lock = lock_for(&path);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        match std::fs::read(&path) {
            Ok(current) if current == text.as_bytes() => {
                tracing::debug!(event = "catalog_unchanged", lang = language, path = %path.display());
                return Ok(SaveOutcome::Unchanged);
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(io_err(e)),
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        write_atomic(&path, text.as_bytes()).map_err(io_err)?;
        tracing::info!(event = "catalog_saved", lang = language, path = %path.display(), bytes = text.len());
        Ok(SaveOutcome::Written)
    }
}
