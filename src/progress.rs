//! Progress callbacks for full-document analysis.
//!
//! Analysis is single-threaded and scans pages in order. Between pages it
//! calls back into an [`AnalysisProgress`] implementation; this is the one
//! point where a host application may pump its event loop or redraw a
//! progress bar. The callback must not touch the document, the page raster
//! or the transaction set while the analysis is running.
//!
//! # Example
//!
//! ```rust
//! use pdftag::AnalysisProgress;
//! use std::cell::Cell;
//!
//! struct Counter {
//!     pages: Cell<usize>,
//! }
//!
//! impl AnalysisProgress for Counter {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, found: usize) {
//!         self.pages.set(self.pages.get() + 1);
//!         eprintln!("page {page_num}/{total_pages}: {found} transactions");
//!     }
//! }
//! ```

/// Receives events while a document is analysed.
///
/// All methods default to no-ops. Page numbers are 1-indexed.
pub trait AnalysisProgress {
    /// Called once before the first page is scanned.
    fn on_analysis_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after each page, with the number of records found on it.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, found: usize) {
        let _ = (page_num, total_pages, found);
    }

    /// Called when a page fails; the analysis stops right after.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after every page has been scanned.
    fn on_analysis_complete(&self, total_pages: usize, total_found: usize) {
        let _ = (total_pages, total_found);
    }
}

/// The default when no callback is supplied.
pub struct NoopProgress;

impl AnalysisProgress for NoopProgress {}
