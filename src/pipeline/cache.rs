//! Side-car persistence of analysis results.
//!
//! A [`TransactionSet`] is stored as pretty-printed JSON next to the PDF it
//! was computed from, named `<stem><suffix>` (default
//! `auszug.pdf` → `auszug_transactions.json`). Its presence means "this
//! document has been analysed".
//!
//! The cache assumes a single user and a single process: there is no
//! locking, and two processes writing the same cache concurrently end with
//! whichever rename lands last. Writes go to a temporary file in the same
//! directory followed by a rename, so a crash never leaves a half-written
//! cache behind.
//!
//! Reading is forgiving. A missing, unreadable or malformed cache file is
//! logged and treated exactly like "not analysed".

use crate::config::TaggerConfig;
use crate::error::TaggerError;
use crate::model::TransactionSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// `<dir>/<stem><suffix>` for a PDF at `source`.
pub fn cache_path(source: &Path, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{stem}{suffix}"))
}

/// Reads and writes side-car transaction files.
#[derive(Debug, Clone)]
pub struct TransactionCache {
    suffix: String,
}

impl TransactionCache {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn from_config(config: &TaggerConfig) -> Self {
        Self::new(config.cache_suffix.clone())
    }

    pub fn path_for(&self, source: &Path) -> PathBuf {
        cache_path(source, &self.suffix)
    }

    pub fn exists(&self, source: &Path) -> bool {
        self.path_for(source).is_file()
    }

    /// Write `set` next to `set.source_path`, replacing any earlier cache.
    pub fn save(&self, set: &TransactionSet) -> Result<PathBuf, TaggerError> {
        let path = self.path_for(&set.source_path);
        let write_err = |source: std::io::Error| TaggerError::CacheWriteFailed {
            path: path.clone(),
            source,
        };

        let json = serde_json::to_string_pretty(set)
            .map_err(|e| write_err(std::io::Error::other(e)))?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json).map_err(write_err)?;
        if let Err(e) = std::fs::rename(&tmp_path, &path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(write_err(e));
        }

        info!(
            "Saved {} transactions to {}",
            set.records.len(),
            path.display()
        );
        Ok(path)
    }

    /// The cached set for `source`, or `None` when there is no usable cache.
    pub fn load(&self, source: &Path) -> Option<TransactionSet> {
        let path = self.path_for(source);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No transaction cache at {}", path.display());
                return None;
            }
            Err(e) => {
                warn!("Cannot read transaction cache {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<TransactionSet>(&raw) {
            Ok(set) => {
                debug!(
                    "Loaded {} transactions from {}",
                    set.records.len(),
                    path.display()
                );
                Some(set)
            }
            Err(e) => {
                warn!("Ignoring malformed transaction cache {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Like [`Self::load`], but only if the cache was written for a file
    /// with content hash `current_hash`.
    pub fn load_verified(&self, source: &Path, current_hash: &str) -> Option<TransactionSet> {
        let set = self.load(source)?;
        if set.content_hash.eq_ignore_ascii_case(current_hash) {
            Some(set)
        } else {
            info!(
                "Transaction cache for {} is stale (hash {} != {})",
                source.display(),
                set.content_hash,
                current_hash
            );
            None
        }
    }
}

impl Default for TransactionCache {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CACHE_SUFFIX)
    }
}
