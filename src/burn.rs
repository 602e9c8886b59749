//! Burning an editing session into a new PDF.

use crate::annotation::Session;
use crate::backend::{GeometrySource, PageReplacer, Rasterizer};
use crate::config::TaggerConfig;
use crate::error::TaggerError;
use crate::pipeline::compose::AnnotationCompositor;
use std::path::{Path, PathBuf};
use tracing::info;

/// Render the session's page, burn its annotations in and write `output`
/// with that page replaced. The source document is not modified.
///
/// # Errors
/// - [`TaggerError::PageOutOfRange`] if the session points past the last page.
/// - [`TaggerError::RasterisationFailed`] if the page cannot be rendered.
/// - [`TaggerError::OutputWriteFailed`] if the output cannot be written.
pub fn burn_page<D>(
    document: &D,
    session: &Session,
    output: &Path,
    config: &TaggerConfig,
) -> Result<(), TaggerError>
where
    D: GeometrySource + Rasterizer + PageReplacer + ?Sized,
{
    let total = document.page_count();
    if session.page_index >= total {
        return Err(TaggerError::PageOutOfRange {
            page: session.page_index + 1,
            total,
        });
    }

    let rendered = document.render_page(session.page_index, config.dpi)?;
    let composed = AnnotationCompositor::from_config(config).compose(
        &rendered.image,
        &session.primary,
        &session.placed,
        session.viewport_origin,
    );

    document.replace_page(
        output,
        session.page_index,
        &composed,
        rendered.width_pt,
        rendered.height_pt,
    )?;

    info!(
        "Burned {} tags into page {} → {}",
        session.placed.iter().filter(|t| !t.text.is_empty()).count(),
        session.page_index + 1,
        output.display()
    );
    Ok(())
}

/// First `<stem>_marked<N>.pdf` next to `source` that does not exist yet,
/// counting from 1.
pub fn suggest_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    (1u32..)
        .map(|n| source.with_file_name(format!("{stem}_marked{n}.pdf")))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| source.with_file_name(format!("{stem}_marked.pdf")))
}
