//! Writing the burned document.
//!
//! The output is a new document holding every page of the source, with the
//! burned page swapped for a single full-page image at the source page
//! size. Untouched pages are imported from the source as-is.

use crate::backend::{GeometrySource, PageReplacer};
use crate::error::TaggerError;
use crate::pipeline::render::PdfiumDocument;
use image::{DynamicImage, RgbaImage};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::info;

impl PageReplacer for PdfiumDocument<'_> {
    fn replace_page(
        &self,
        output: &Path,
        page_index: usize,
        raster: &RgbaImage,
        width_pt: f64,
        height_pt: f64,
    ) -> Result<(), TaggerError> {
        let total = self.page_count();
        let index = u16::try_from(page_index)
            .ok()
            .filter(|_| page_index < total)
            .ok_or(TaggerError::PageOutOfRange {
                page: page_index + 1,
                total,
            })?;
        let failed = |detail: String| TaggerError::OutputWriteFailed {
            path: output.to_path_buf(),
            detail,
        };

        let mut out = self
            .pdfium
            .create_new_pdf()
            .map_err(|e| failed(format!("{:?}", e)))?;
        out.pages_mut()
            .append(&self.document)
            .map_err(|e| failed(format!("Copying pages failed: {:?}", e)))?;
        out.pages()
            .get(index)
            .and_then(|p| p.delete())
            .map_err(|e| failed(format!("Removing page {} failed: {:?}", page_index + 1, e)))?;

        let width = PdfPoints::new(width_pt as f32);
        let height = PdfPoints::new(height_pt as f32);
        {
            let mut page = out
                .pages_mut()
                .create_page_at_index(PdfPagePaperSize::Custom(width, height), index)
                .map_err(|e| failed(format!("{:?}", e)))?;
            let image = DynamicImage::ImageRgba8(raster.clone());
            page.objects_mut()
                .create_image_object(PdfPoints::ZERO, PdfPoints::ZERO, &image, Some(width), Some(height))
                .map_err(|e| failed(format!("Embedding page image failed: {:?}", e)))?;
        }

        // Atomic write: save to temp, then rename
        let tmp_path = output.with_extension("pdf.tmp");
        out.save_to_file(&tmp_path)
            .map_err(|e| failed(format!("{:?}", e)))?;
        if let Err(e) = std::fs::rename(&tmp_path, output) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(failed(e.to_string()));
        }

        info!(
            "Wrote {} (page {} of {} replaced)",
            output.display(),
            page_index + 1,
            total
        );
        Ok(())
    }
}
