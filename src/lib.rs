//! # pdftag
//!
//! Find transactions in bank-statement PDFs and burn coloured tag markers
//! into the page.
//!
//! ## What it does
//!
//! Statements list one booking per line, each starting with a date such as
//! `12.03.2024` and carrying an amount like `1.234,56 €`. This crate reads the
//! characters of every page together with their boxes, finds each date and
//! the amount after it, and anchors the result at the date's position in
//! raster pixels. Results are cached next to the PDF so a document is only
//! analysed once.
//!
//! Tags are small labelled rectangles positioned in screen space over a
//! rendered page. Burning renders the page, draws the tags at the matching
//! raster pixels and writes a new PDF with that page replaced by the image.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Extraction                          Burning
//!
//! GeometrySource (pdfium)             Session (screen-space annotations)
//!  ├─ detect   dates, amounts, anchor  ├─ render   page → RGBA at DPI
//!  └─ cache    <stem>_transactions.json├─ compose  viewport-relative, clip, draw
//!                                      └─ replace  page N → image page
//! ```
//!
//! Both flows share the DPI in [`TaggerConfig`] and the coordinate
//! conversions in [`geometry`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdftag::pipeline::render::{bind_pdfium, PdfiumDocument};
//! use pdftag::{load_or_analyze, NoopProgress, TaggerConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TaggerConfig::default();
//!     let pdfium = bind_pdfium()?;
//!     let path = Path::new("auszug.pdf");
//!     let doc = PdfiumDocument::open(&pdfium, path, None)?;
//!     let loaded = load_or_analyze(&doc, path, &config, &NoopProgress, false)?;
//!     for r in &loaded.set.records {
//!         println!("page {} {:?} {:?}", r.page_index + 1, r.date, r.amount);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdftag` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod annotation;
pub mod backend;
pub mod burn;
pub mod config;
pub mod error;
pub mod geometry;
pub mod model;
pub mod navigate;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze_document, load_or_analyze, LoadedTransactions, SetOrigin};
pub use annotation::{Annotation, Color, Session, SizingRule, SizingTable, TagKind};
pub use backend::{GeometrySource, PageReplacer, Rasterizer, RenderedPage};
pub use burn::{burn_page, suggest_output_path};
pub use config::{TaggerConfig, TaggerConfigBuilder};
pub use error::{PageError, TaggerError};
pub use model::{Amount, CharacterSample, PageTextIndex, TransactionRecord, TransactionSet};
pub use navigate::{JumpTarget, TransactionCursor};
pub use pipeline::compose::AnnotationCompositor;
pub use pipeline::detect::TransactionDetector;
pub use pipeline::cache::TransactionCache;
pub use progress::{AnalysisProgress, NoopProgress};
