//! Pipeline stages for analysing and burning.
//!
//! Each submodule implements one step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ detect ──▶ cache            (analysis)
//! (path)    (pdfium)   (regex)    (side-car JSON)
//!
//! render ──▶ compose ──▶ replace                   (burning)
//! (RGBA)     (annotations) (pdfium)
//! ```
//!
//! 1. [`input`]: validate the PDF path and hash its bytes
//! 2. [`render`]: open the document; text geometry and page rasters
//! 3. [`detect`]: dates and amounts anchored to raster pixels
//! 4. [`cache`]: persist and restore transaction sets
//! 5. [`compose`]: burn screen-space annotations into a page raster
//! 6. [`replace`]: write a copy of the document with one page replaced

pub mod cache;
pub mod compose;
pub mod detect;
pub mod input;
pub mod render;
pub mod replace;
