//! pdfium-backed document access: text geometry, rasterisation and
//! document info.
//!
//! pdfium reports character boxes with a bottom-left origin. Everything
//! downstream (detection, raster pixels, screen overlays) works top-down, so
//! boxes are flipped here, once: `top = page_height - pdf_top`.
//!
//! pdfium is not thread-safe and neither is this module; a
//! [`PdfiumDocument`] is used from one thread at a time.

use crate::backend::{GeometrySource, RenderedPage, Rasterizer};
use crate::error::{PageError, TaggerError};
use crate::geometry::{page_pixel_size, PointRect};
use crate::model::CharacterSample;
use pdfium_render::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Bind to a pdfium library.
///
/// Lookup order: `PDFIUM_LIB_PATH`, the working directory, then the system
/// library path.
pub fn bind_pdfium() -> Result<Pdfium, TaggerError> {
    if let Ok(path) = std::env::var("PDFIUM_LIB_PATH") {
        debug!("Binding pdfium from PDFIUM_LIB_PATH={}", path);
        return Pdfium::bind_to_library(&path)
            .map(Pdfium::new)
            .map_err(|e| TaggerError::PdfiumBindingFailed(format!("{path}: {e:?}")));
    }

    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| TaggerError::PdfiumBindingFailed(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}

/// Size of one page in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSize {
    pub width_pt: f64,
    pub height_pt: f64,
}

/// Facts about an opened document, for display.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub path: PathBuf,
    pub page_count: usize,
    pub pages: Vec<PageSize>,
    pub title: Option<String>,
    pub producer: Option<String>,
    pub pdf_version: String,
}

/// An open PDF document.
pub struct PdfiumDocument<'a> {
    pub(crate) pdfium: &'a Pdfium,
    pub(crate) document: PdfDocument<'a>,
    path: PathBuf,
}

impl<'a> PdfiumDocument<'a> {
    /// Open `path`, mapping pdfium's load errors onto [`TaggerError`].
    pub fn open(
        pdfium: &'a Pdfium,
        path: &Path,
        password: Option<&'a str>,
    ) -> Result<Self, TaggerError> {
        let document = pdfium.load_pdf_from_file(path, password).map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    TaggerError::WrongPassword {
                        path: path.to_path_buf(),
                    }
                } else {
                    TaggerError::PasswordRequired {
                        path: path.to_path_buf(),
                    }
                }
            } else {
                TaggerError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: err_str,
                }
            }
        })?;

        info!(
            "PDF loaded: {} ({} pages)",
            path.display(),
            document.pages().len()
        );
        Ok(Self {
            pdfium,
            document,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn page(&self, page_index: usize) -> Result<PdfPage<'a>, String> {
        let idx = u16::try_from(page_index)
            .map_err(|_| format!("page index {} exceeds pdfium's page limit", page_index))?;
        self.document.pages().get(idx).map_err(|e| format!("{:?}", e))
    }

    /// Page count, page sizes and a few metadata fields.
    pub fn info(&self) -> DocumentInfo {
        let metadata = self.document.metadata();
        let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
            metadata.get(tag).and_then(|t| {
                let v = t.value().to_string();
                if v.is_empty() {
                    None
                } else {
                    Some(v)
                }
            })
        };

        let pages = self
            .document
            .pages()
            .iter()
            .map(|p| PageSize {
                width_pt: p.width().value as f64,
                height_pt: p.height().value as f64,
            })
            .collect::<Vec<_>>();

        DocumentInfo {
            path: self.path.clone(),
            page_count: pages.len(),
            pages,
            title: get_meta(PdfDocumentMetadataTagType::Title),
            producer: get_meta(PdfDocumentMetadataTagType::Producer),
            pdf_version: format!("{:?}", self.document.version()),
        }
    }
}

impl GeometrySource for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn text_geometry(&self, page_index: usize) -> Result<Vec<CharacterSample>, PageError> {
        let unavailable = |detail: String| PageError::GeometryUnavailable {
            page: page_index,
            detail,
        };

        let page = self.page(page_index).map_err(unavailable)?;
        let page_height = page.height().value as f64;
        let text = page.text().map_err(|e| unavailable(format!("{:?}", e)))?;

        let samples: Vec<CharacterSample> = text
            .chars()
            .iter()
            .enumerate()
            .map(|(i, ch)| {
                let bounds = ch
                    .loose_bounds()
                    .ok()
                    .map(|r| flip_to_top_left(&r, page_height));
                CharacterSample::new(i, ch.unicode_value(), bounds)
            })
            .collect();

        debug!(
            "Page {}: {} characters, {} without geometry",
            page_index + 1,
            samples.len(),
            samples.iter().filter(|s| s.bounds.is_none()).count()
        );
        Ok(samples)
    }
}

impl Rasterizer for PdfiumDocument<'_> {
    fn render_page(&self, page_index: usize, dpi: u32) -> Result<RenderedPage, PageError> {
        let failed = |detail: String| PageError::RenderFailed {
            page: page_index,
            detail,
        };

        let page = self.page(page_index).map_err(failed)?;
        let width_pt = page.width().value as f64;
        let height_pt = page.height().value as f64;
        let (width_px, height_px) = page_pixel_size(width_pt, height_pt, dpi);

        let render_config = PdfRenderConfig::new()
            .set_target_width(width_px as i32)
            .set_target_height(height_px as i32)
            .set_clear_color(PdfColor::WHITE);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| failed(format!("{:?}", e)))?;

        let image = bitmap.as_image().to_rgba8();
        debug!(
            "Rendered page {} → {}x{} px at {} dpi",
            page_index + 1,
            image.width(),
            image.height(),
            dpi
        );

        Ok(RenderedPage {
            image,
            width_pt,
            height_pt,
        })
    }
}

/// Convert a pdfium rectangle (bottom-left origin) to a top-left one.
fn flip_to_top_left(rect: &PdfRect, page_height: f64) -> PointRect {
    let left = rect.left().value as f64;
    let right = rect.right().value as f64;
    let top = rect.top().value as f64;
    let bottom = rect.bottom().value as f64;
    PointRect::new(left, page_height - top, right - left, top - bottom)
}
