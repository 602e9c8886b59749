//! Boundaries to the PDF engine.
//!
//! The extraction and compositing code never talks to pdfium directly. It
//! consumes three narrow services:
//!
//! * [`GeometrySource`]: "for page N, the characters and their boxes"
//! * [`Rasterizer`]: "render page N at D dpi"
//! * [`PageReplacer`]: "write a copy of the document with page N replaced by
//!   this image"
//!
//! [`crate::pipeline::render::PdfiumDocument`] implements all three on top of
//! `pdfium-render`; tests plug in in-memory implementations.

use crate::error::{PageError, TaggerError};
use crate::model::CharacterSample;
use image::RgbaImage;
use std::path::Path;

/// Supplies per-character text geometry.
pub trait GeometrySource {
    fn page_count(&self) -> usize;

    /// Every character of page `page_index` (0-indexed) in stream order,
    /// zero codepoints included. Boxes are in PDF points with a top-left
    /// origin.
    fn text_geometry(&self, page_index: usize) -> Result<Vec<CharacterSample>, PageError>;
}

/// A page rendered to RGBA pixels, with the page size it was rendered from.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub image: RgbaImage,
    pub width_pt: f64,
    pub height_pt: f64,
}

/// Renders pages to bitmaps on a white background.
pub trait Rasterizer {
    fn render_page(&self, page_index: usize, dpi: u32) -> Result<RenderedPage, PageError>;
}

/// Produces the output document for a burned page.
pub trait PageReplacer {
    /// Write `output`: a copy of the source document in which page
    /// `page_index` is replaced by `raster` stretched over a
    /// `width_pt` x `height_pt` page. All other pages are copied unchanged.
    fn replace_page(
        &self,
        output: &Path,
        page_index: usize,
        raster: &RgbaImage,
        width_pt: f64,
        height_pt: f64,
    ) -> Result<(), TaggerError>;
}
