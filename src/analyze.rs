//! Full-document analysis entry points.
//!
//! [`analyze_document`] scans every page of a document and returns the
//! [`TransactionSet`]. A page whose geometry cannot be read is reported and
//! contributes no records; the remaining pages are still scanned. Only a
//! document where no page could be read at all fails the run.
//!
//! [`load_or_analyze`] is what opening a document does: reuse the side-car
//! cache when there is one, otherwise analyse and write the cache.

use crate::backend::GeometrySource;
use crate::config::TaggerConfig;
use crate::error::{PageError, TaggerError};
use crate::model::{PageTextIndex, TransactionSet};
use crate::pipeline::cache::TransactionCache;
use crate::pipeline::detect::TransactionDetector;
use crate::pipeline::input;
use crate::progress::AnalysisProgress;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Where a [`TransactionSet`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOrigin {
    /// Read from the side-car cache.
    Cache,
    /// Produced by a fresh analysis.
    Analysis,
}

/// Result of [`load_or_analyze`].
#[derive(Debug, Clone)]
pub struct LoadedTransactions {
    pub set: TransactionSet,
    pub origin: SetOrigin,
    /// The cache file backing `set`, `None` if writing it failed.
    pub cache_path: Option<PathBuf>,
}

/// Scan every page of `source` for transactions.
///
/// `pdf_path` is the file `source` was opened from; it is hashed and
/// recorded in the set.
///
/// # Errors
/// - [`TaggerError::AnalysisFailed`] when the document has pages but none of
///   them could be read. Nothing is returned or cached in that case.
/// - I/O errors from hashing `pdf_path`.
pub fn analyze_document<G>(
    source: &G,
    pdf_path: &Path,
    config: &TaggerConfig,
    progress: &dyn AnalysisProgress,
) -> Result<TransactionSet, TaggerError>
where
    G: GeometrySource + ?Sized,
{
    let content_hash = input::content_hash(pdf_path)?;
    analyze_with_hash(source, pdf_path, content_hash, config, progress)
}

fn analyze_with_hash<G>(
    source: &G,
    pdf_path: &Path,
    content_hash: String,
    config: &TaggerConfig,
    progress: &dyn AnalysisProgress,
) -> Result<TransactionSet, TaggerError>
where
    G: GeometrySource + ?Sized,
{
    let start = Instant::now();
    let detector = TransactionDetector::from_config(config);
    let total_pages = source.page_count();
    info!("Analysing {} ({} pages)", pdf_path.display(), total_pages);
    progress.on_analysis_start(total_pages);

    let mut records = Vec::new();
    let mut first_failure: Option<PageError> = None;
    let mut failed_pages = 0;
    for page_index in 0..total_pages {
        let samples = match source.text_geometry(page_index) {
            Ok(samples) => samples,
            Err(e) => {
                warn!("{}, skipping page", e);
                progress.on_page_error(page_index + 1, total_pages, &e.to_string());
                failed_pages += 1;
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
                continue;
            }
        };

        let page = PageTextIndex::from_samples(samples);
        let found = detector.detect(&page, page_index);
        progress.on_page_complete(page_index + 1, total_pages, found.len());
        records.extend(found);
    }

    if failed_pages == total_pages {
        if let Some(source) = first_failure {
            return Err(TaggerError::AnalysisFailed {
                path: pdf_path.to_path_buf(),
                source,
            });
        }
    }

    progress.on_analysis_complete(total_pages, records.len());
    info!(
        "Analysis complete: {} transactions on {} pages ({} unreadable) in {}ms",
        records.len(),
        total_pages,
        failed_pages,
        start.elapsed().as_millis()
    );

    Ok(TransactionSet {
        content_hash,
        source_path: pdf_path.to_path_buf(),
        analyzed_at: Utc::now(),
        records,
    })
}

/// Return the cached transactions for `pdf_path`, analysing on a miss.
///
/// With `force` the cache is ignored and overwritten. With
/// [`TaggerConfig::verify_cache_hash`] a cache whose hash differs from the
/// file's current hash counts as a miss.
///
/// A cache that cannot be written is logged; the fresh set is still
/// returned.
pub fn load_or_analyze<G>(
    source: &G,
    pdf_path: &Path,
    config: &TaggerConfig,
    progress: &dyn AnalysisProgress,
    force: bool,
) -> Result<LoadedTransactions, TaggerError>
where
    G: GeometrySource + ?Sized,
{
    let cache = TransactionCache::from_config(config);
    let mut known_hash = None;

    if !force {
        let cached = if config.verify_cache_hash {
            let hash = input::content_hash(pdf_path)?;
            let set = cache.load_verified(pdf_path, &hash);
            known_hash = Some(hash);
            set
        } else {
            cache.load(pdf_path)
        };

        if let Some(set) = cached {
            info!(
                "Using cached analysis of {} ({} transactions)",
                pdf_path.display(),
                set.records.len()
            );
            return Ok(LoadedTransactions {
                set,
                origin: SetOrigin::Cache,
                cache_path: Some(cache.path_for(pdf_path)),
            });
        }
    } else {
        debug!("Ignoring cache for {} (forced)", pdf_path.display());
    }

    let hash = match known_hash {
        Some(hash) => hash,
        None => input::content_hash(pdf_path)?,
    };
    let set = analyze_with_hash(source, pdf_path, hash, config, progress)?;

    let cache_path = match cache.save(&set) {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("{}", e);
            None
        }
    };

    Ok(LoadedTransactions {
        set,
        origin: SetOrigin::Analysis,
        cache_path,
    })
}
