//! Error types for the pdftag library.
//!
//! Two error types reflect two failure modes:
//!
//! * [`TaggerError`]: the current operation (one analysis run, one page
//!   render, one burn, one cache write) cannot complete. The process keeps
//!   running; the caller turns the error into a message for the user.
//!
//! * [`PageError`]: a single page could not be read during analysis. It is
//!   reported through [`crate::progress::AnalysisProgress::on_page_error`]
//!   and the page is skipped. Only when no page at all can be read does it
//!   become a [`TaggerError::AnalysisFailed`].
//!
//! Several failures are deliberately *not* errors: a date anchored on a
//! character without geometry, an unparsable amount or date, an annotation
//! dragged completely off the page, and an unreadable cache file. Those are
//! skipped where they occur.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by pdftag operations.
#[derive(Debug, Error)]
pub enum TaggerError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Requested page index exceeds the page count (1-indexed in the message).
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// A page could not be loaded or rasterised.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// No page of the document could be read; nothing was kept.
    #[error("Analysis of '{path}' failed, no page could be read: {source}")]
    AnalysisFailed {
        path: PathBuf,
        #[source]
        source: PageError,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// The side-car transaction file could not be written.
    #[error("Failed to write transaction cache '{path}': {source}")]
    CacheWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output PDF.
    #[error("Failed to write output file '{path}': {detail}")]
    OutputWriteFailed { path: PathBuf, detail: String },

    /// An editing session file could not be read or parsed.
    #[error("Invalid session file '{path}': {detail}")]
    InvalidSession { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install libpdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failure confined to one page (0-indexed `page`, printed 1-indexed).
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The page or its text layer could not be loaded.
    #[error("Page {}: text geometry unavailable: {detail}", .page + 1)]
    GeometryUnavailable { page: usize, detail: String },

    /// Page rasterisation failed.
    #[error("Page {}: rasterisation failed: {detail}", .page + 1)]
    RenderFailed { page: usize, detail: String },
}

impl PageError {
    pub fn page(&self) -> usize {
        match self {
            PageError::GeometryUnavailable { page, .. } | PageError::RenderFailed { page, .. } => {
                *page
            }
        }
    }
}

impl From<PageError> for TaggerError {
    fn from(e: PageError) -> Self {
        match e {
            PageError::GeometryUnavailable { page, detail }
            | PageError::RenderFailed { page, detail } => TaggerError::RasterisationFailed {
                page: page + 1,
                detail,
            },
        }
    }
}
