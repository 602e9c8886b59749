//! Input validation and content hashing.
//!
//! pdfium gives poor diagnostics for files that are not PDFs at all, so the
//! path is checked for existence, read permission and the `%PDF` magic bytes
//! before a document is opened.

use crate::error::TaggerError;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` names a readable PDF and return it as an owned path.
pub fn resolve_local(path: &Path) -> Result<PathBuf, TaggerError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(TaggerError::FileNotFound { path });
    }

    let mut file = open(&path)?;
    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
        return Err(TaggerError::NotAPdf { path, magic });
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// Lowercase hex SHA-256 of the file's bytes.
pub fn content_hash(path: &Path) -> Result<String, TaggerError> {
    let mut file = open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| {
        TaggerError::Internal(format!("Failed to hash '{}': {}", path.display(), e))
    })?;
    Ok(hex::encode(hasher.finalize()))
}

fn open(path: &Path) -> Result<File, TaggerError> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::PermissionDenied => TaggerError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => TaggerError::FileNotFound {
            path: path.to_path_buf(),
        },
    })
}
