//! End-to-end tests for pdftag.
//!
//! Most tests drive the full analyse → navigate → burn flow against an
//! in-memory document, so they need neither pdfium nor sample files.
//!
//! Tests that exercise the real pdfium backend are gated behind the
//! `E2E_ENABLED` environment variable. They build their own PDF with pdfium
//! and need a pdfium library (`PDFIUM_LIB_PATH` or system-wide).
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=./libpdfium.so cargo test --test e2e -- --nocapture

use image::{Rgba, RgbaImage};
use pdftag::geometry::{page_pixel_size, points_to_pixels, PointRect, ScreenPoint, ScreenRect};
use pdftag::pipeline::cache::cache_path;
use pdftag::{
    burn_page, load_or_analyze, Annotation, CharacterSample, Color, GeometrySource, NoopProgress,
    PageError, PageReplacer, Rasterizer, RenderedPage, Session, SetOrigin, SizingTable, TagKind,
    TaggerConfig, TaggerError, TransactionCursor,
};
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ── In-memory document ───────────────────────────────────────────────────────

const A4: (f64, f64) = (595.0, 842.0);
const CHAR_W: f64 = 6.0;

/// A line of text whose first character's top-left corner is at `(x, y)`.
struct Line {
    x: f64,
    y: f64,
    text: &'static str,
}

struct FakePage {
    lines: Vec<Line>,
}

struct Replaced {
    output: PathBuf,
    page_index: usize,
    raster: RgbaImage,
    width_pt: f64,
    height_pt: f64,
}

#[derive(Default)]
struct FakeDocument {
    pages: Vec<FakePage>,
    geometry_calls: Cell<usize>,
    replaced: RefCell<Vec<Replaced>>,
}

impl FakeDocument {
    fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }
}

impl GeometrySource for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn text_geometry(&self, page_index: usize) -> Result<Vec<CharacterSample>, PageError> {
        self.geometry_calls.set(self.geometry_calls.get() + 1);
        let page = self
            .pages
            .get(page_index)
            .ok_or(PageError::GeometryUnavailable {
                page: page_index,
                detail: "no such page".into(),
            })?;

        let mut samples = Vec::new();
        for line in &page.lines {
            for (i, c) in line.text.chars().enumerate() {
                let bounds = PointRect::new(line.x + i as f64 * CHAR_W, line.y, CHAR_W, 10.0);
                samples.push(CharacterSample::new(samples.len(), c as u32, Some(bounds)));
            }
            // Line breaks carry no geometry, like generated newlines in pdfium.
            samples.push(CharacterSample::new(samples.len(), '\n' as u32, None));
        }
        Ok(samples)
    }
}

impl Rasterizer for FakeDocument {
    fn render_page(&self, page_index: usize, dpi: u32) -> Result<RenderedPage, PageError> {
        if page_index >= self.pages.len() {
            return Err(PageError::RenderFailed {
                page: page_index,
                detail: "no such page".into(),
            });
        }
        let (w, h) = page_pixel_size(A4.0, A4.1, dpi);
        Ok(RenderedPage {
            image: RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255])),
            width_pt: A4.0,
            height_pt: A4.1,
        })
    }
}

impl PageReplacer for FakeDocument {
    fn replace_page(
        &self,
        output: &Path,
        page_index: usize,
        raster: &RgbaImage,
        width_pt: f64,
        height_pt: f64,
    ) -> Result<(), TaggerError> {
        std::fs::write(output, b"%PDF-1.7 fake").map_err(|e| TaggerError::OutputWriteFailed {
            path: output.to_path_buf(),
            detail: e.to_string(),
        })?;
        self.replaced.borrow_mut().push(Replaced {
            output: output.to_path_buf(),
            page_index,
            raster: raster.clone(),
            width_pt,
            height_pt,
        });
        Ok(())
    }
}

fn statement() -> FakeDocument {
    FakeDocument::new(vec![
        FakePage {
            lines: vec![
                Line {
                    x: 56.0,
                    y: 60.0,
                    text: "Kontoauszug Nr. 3/2024",
                },
                Line {
                    x: 56.0,
                    y: 200.0,
                    text: "01.03.2024 Gehalt Firma GmbH 2.500,00 €",
                },
            ],
        },
        FakePage {
            lines: vec![Line {
                x: 56.0,
                y: 120.0,
                text: "12.03.2024 Miete Wohnung -1.234,56 €",
            }],
        },
    ])
}

/// Route library logs to the test output; `RUST_LOG=pdftag=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn pdf_in(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("auszug.pdf");
    std::fs::write(&path, b"%PDF-1.7\n% statement\n").unwrap();
    path
}

// ── Analysis and caching ─────────────────────────────────────────────────────

#[test]
fn analysis_finds_records_on_every_page() {
    let dir = TempDir::new().unwrap();
    let pdf = pdf_in(&dir);
    let doc = statement();
    let config = TaggerConfig::default();

    let loaded = load_or_analyze(&doc, &pdf, &config, &NoopProgress, false).unwrap();

    assert_eq!(loaded.origin, SetOrigin::Analysis);
    let records = &loaded.set.records;
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].page_index, 0);
    assert_eq!(records[0].amount.map(|a| a.cents()), Some(250_000));

    let second = &records[1];
    assert_eq!(second.page_index, 1);
    assert_eq!(second.pixel_x, points_to_pixels(56.0, 150));
    assert_eq!(second.pixel_y, points_to_pixels(120.0, 150));
    assert_eq!(second.pixel_y, 250);
    assert_eq!(second.amount.map(|a| a.cents()), Some(-123_456));
    assert_eq!(
        second.date.map(|d| d.to_string()),
        Some("2024-03-12".to_string())
    );
}

#[test]
fn reopening_loads_cache_without_geometry() {
    let dir = TempDir::new().unwrap();
    let pdf = pdf_in(&dir);
    let config = TaggerConfig::default();

    let first_doc = statement();
    let first = load_or_analyze(&first_doc, &pdf, &config, &NoopProgress, false).unwrap();
    assert_eq!(first_doc.geometry_calls.get(), 2);
    assert_eq!(
        first.cache_path.as_deref(),
        Some(dir.path().join("auszug_transactions.json").as_path())
    );

    let reopened = statement();
    let second = load_or_analyze(&reopened, &pdf, &config, &NoopProgress, false).unwrap();
    assert_eq!(second.origin, SetOrigin::Cache);
    assert_eq!(reopened.geometry_calls.get(), 0);
    assert_eq!(second.set.records, first.set.records);
}

#[test]
fn cache_file_uses_camel_case_fields() {
    let dir = TempDir::new().unwrap();
    let pdf = pdf_in(&dir);
    load_or_analyze(&statement(), &pdf, &TaggerConfig::default(), &NoopProgress, false).unwrap();

    let raw = std::fs::read_to_string(cache_path(&pdf, "_transactions.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(json["contentHash"].as_str().unwrap().len() == 64);
    assert!(json["records"][1]["pageIndex"] == 1);
    assert!(json["records"][1]["rawText"]
        .as_str()
        .unwrap()
        .starts_with("12.03.2024"));
}

#[test]
fn legacy_cache_is_reused() {
    let dir = TempDir::new().unwrap();
    let pdf = pdf_in(&dir);
    let legacy = format!(
        r#"{{
  "PdfHash": "00",
  "OriginalFilePath": {:?},
  "AnalyzedAt": "2024-05-01T10:22:33.1234567+02:00",
  "Transactions": [
    {{ "X": 117, "Y": 250, "PageIndex": 1, "TransactionText": "12.03.2024 Miete",
       "Date": "2024-03-12T00:00:00", "Amount": -1234.56 }}
  ]
}}"#,
        pdf.display().to_string()
    );
    std::fs::write(dir.path().join("auszug_transactions.json"), legacy).unwrap();

    let doc = statement();
    let loaded = load_or_analyze(&doc, &pdf, &TaggerConfig::default(), &NoopProgress, false)
        .unwrap();
    assert_eq!(loaded.origin, SetOrigin::Cache);
    assert_eq!(doc.geometry_calls.get(), 0);
    assert_eq!(loaded.set.records[0].pixel_x, 117);
    assert_eq!(loaded.set.records[0].amount.map(|a| a.cents()), Some(-123_456));
}

#[test]
fn unreadable_page_does_not_hide_the_others() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let pdf = pdf_in(&dir);

    /// Reports three pages but only has geometry for two.
    struct Truncated(FakeDocument);
    impl GeometrySource for Truncated {
        fn page_count(&self) -> usize {
            3
        }
        fn text_geometry(&self, page_index: usize) -> Result<Vec<CharacterSample>, PageError> {
            self.0.text_geometry(page_index)
        }
    }

    let loaded = load_or_analyze(
        &Truncated(statement()),
        &pdf,
        &TaggerConfig::default(),
        &NoopProgress,
        false,
    )
    .unwrap();
    let pages: Vec<usize> = loaded.set.records.iter().map(|r| r.page_index).collect();
    assert_eq!(pages, vec![0, 1]);
    assert!(cache_path(&pdf, "_transactions.json").exists());
}

// ── Navigate and burn ────────────────────────────────────────────────────────

#[test]
fn tag_placed_at_jump_target_lands_on_the_record() {
    let dir = TempDir::new().unwrap();
    let pdf = pdf_in(&dir);
    let doc = statement();
    let config = TaggerConfig::default();
    let loaded = load_or_analyze(&doc, &pdf, &config, &NoopProgress, false).unwrap();

    // Viewport sits on a monitor left of the primary one.
    let viewport = ScreenPoint::new(-1500, 40);
    let mut cursor = TransactionCursor::new(&loaded.set);
    cursor.next();
    cursor.next();
    let target = cursor.jump_target(viewport).unwrap();
    assert_eq!(target.page_index, 1);

    let origin = target.overlay_origin;
    let session = Session {
        page_index: target.page_index,
        viewport_origin: viewport,
        primary: Annotation::primary(
            ScreenRect::new(origin.x, origin.y, 500, 30),
            Color::GUIDE_YELLOW,
        ),
        placed: vec![Annotation::from_tag(
            TagKind::R,
            ScreenPoint::new(origin.x, origin.y),
            &SizingTable::placed(),
        )],
    };

    let output = dir.path().join("out.pdf");
    burn_page(&doc, &session, &output, &config).unwrap();

    let replaced = doc.replaced.borrow();
    assert_eq!(replaced.len(), 1);
    let r = &replaced[0];
    assert_eq!(r.output, output);
    assert_eq!(r.page_index, 1);
    assert_eq!((r.width_pt, r.height_pt), A4);
    assert_eq!(
        r.raster.dimensions(),
        page_pixel_size(A4.0, A4.1, config.dpi)
    );

    // The tag's fill starts just inside its 3px border at the record anchor.
    let record = cursor.current().unwrap();
    let x = (record.pixel_x + 4) as u32;
    let y = (record.pixel_y + 4) as u32;
    assert_eq!(*r.raster.get_pixel(x, y), Rgba([200, 40, 40, 255]));

    // Outside both annotations the page is untouched.
    assert_eq!(*r.raster.get_pixel(5, 5), Rgba([255, 255, 255, 255]));
}

#[test]
fn burning_a_missing_page_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let doc = statement();
    let session = Session {
        page_index: 7,
        viewport_origin: ScreenPoint::new(0, 0),
        primary: Annotation::primary(ScreenRect::new(0, 0, 10, 10), Color::GUIDE_YELLOW),
        placed: Vec::new(),
    };
    let output = dir.path().join("out.pdf");

    let err = burn_page(&doc, &session, &output, &TaggerConfig::default()).unwrap_err();
    assert!(matches!(err, TaggerError::PageOutOfRange { page: 8, total: 2 }));
    assert!(!output.exists());
    assert!(doc.replaced.borrow().is_empty());
}

#[test]
fn session_file_round_trips_through_burn() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let session_path = dir.path().join("session.json");
    std::fs::write(
        &session_path,
        r#"{
  "pageIndex": 0,
  "viewportOrigin": { "x": 100, "y": 100 },
  "primary": { "screenRect": { "x": 2000, "y": 2000, "width": 10, "height": 10 },
               "fillColor": { "r": 255, "g": 255, "b": 0 } },
  "placed": [ { "screenRect": { "x": 110, "y": 110, "width": 58, "height": 42 },
                "fillColor": { "r": 0, "g": 160, "b": 80 }, "text": "P" } ]
}"#,
    )
    .unwrap();

    let session = Session::load(&session_path).unwrap();
    let doc = statement();
    burn_page(
        &doc,
        &session,
        &dir.path().join("out.pdf"),
        &TaggerConfig::default(),
    )
    .unwrap();

    let replaced = doc.replaced.borrow();
    assert_eq!(*replaced[0].raster.get_pixel(14, 14), Rgba([0, 160, 80, 255]));
    assert_eq!(*replaced[0].raster.get_pixel(11, 11), Rgba([0, 0, 0, 255]));
}

#[test]
fn malformed_session_is_rejected() {
    let dir = TempDir::new().unwrap();
    let session_path = dir.path().join("session.json");
    std::fs::write(&session_path, "{ \"pageIndex\": \"one\" }").unwrap();
    let err = Session::load(&session_path).unwrap_err();
    assert!(matches!(err, TaggerError::InvalidSession { .. }));
}

// ── pdfium-backed tests (E2E_ENABLED) ────────────────────────────────────────

macro_rules! e2e_skip_unless_enabled {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run pdfium tests");
            return;
        }
    }};
}

/// Build a two-page statement PDF with pdfium's built-in Helvetica.
fn write_statement_pdf(pdfium: &pdfium_render::prelude::Pdfium, path: &Path) {
    use pdfium_render::prelude::*;

    let mut doc = pdfium.create_new_pdf().unwrap();
    let font = doc.fonts_mut().helvetica();
    for text in ["Kontoauszug", "12.03.2024 Miete Wohnung 1.234,56 EUR"] {
        let mut page = doc
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::a4())
            .unwrap();
        // 100pt from the left, 742pt from the bottom = 100pt from the top.
        page.objects_mut()
            .create_text_object(
                PdfPoints::new(100.0),
                PdfPoints::new(742.0),
                text,
                font,
                PdfPoints::new(12.0),
            )
            .unwrap();
    }
    doc.save_to_file(path).unwrap();
}

#[test]
fn pdfium_analysis_anchors_date_from_the_top() {
    e2e_skip_unless_enabled!();
    init_tracing();
    use pdftag::pipeline::render::{bind_pdfium, PdfiumDocument};

    let dir = TempDir::new().unwrap();
    let pdf = dir.path().join("generated.pdf");
    let pdfium = bind_pdfium().expect("pdfium library");
    write_statement_pdf(&pdfium, &pdf);

    let doc = PdfiumDocument::open(&pdfium, &pdf, None).unwrap();
    let config = TaggerConfig::default();
    let loaded = load_or_analyze(&doc, &pdf, &config, &NoopProgress, false).unwrap();

    assert_eq!(loaded.set.records.len(), 1);
    let r = &loaded.set.records[0];
    assert_eq!(r.page_index, 1);
    assert_eq!(r.amount.map(|a| a.cents()), Some(123_456));
    // x ≈ 100pt → 208px; the glyph top sits a little below 100pt from the top.
    assert!((r.pixel_x - 208).abs() <= 4, "pixel_x = {}", r.pixel_x);
    assert!(r.pixel_y > 170 && r.pixel_y < 215, "pixel_y = {}", r.pixel_y);
}

#[test]
fn pdfium_burn_replaces_only_the_target_page() {
    e2e_skip_unless_enabled!();
    init_tracing();
    use pdftag::pipeline::render::{bind_pdfium, PdfiumDocument};

    let dir = TempDir::new().unwrap();
    let pdf = dir.path().join("generated.pdf");
    let pdfium = bind_pdfium().expect("pdfium library");
    write_statement_pdf(&pdfium, &pdf);

    let doc = PdfiumDocument::open(&pdfium, &pdf, None).unwrap();
    let session = Session {
        page_index: 1,
        viewport_origin: ScreenPoint::new(0, 0),
        primary: Annotation::primary(ScreenRect::new(200, 190, 400, 30), Color::GUIDE_YELLOW),
        placed: vec![Annotation::from_tag(
            TagKind::M,
            ScreenPoint::new(620, 190),
            &SizingTable::placed(),
        )],
    };
    let output = pdftag::suggest_output_path(&pdf);
    assert!(output.ends_with("generated_marked1.pdf"));
    burn_page(&doc, &session, &output, &TaggerConfig::default()).unwrap();

    let burned = PdfiumDocument::open(&pdfium, &output, None).unwrap();
    let info = burned.info();
    assert_eq!(info.page_count, 2);
    assert!((info.pages[1].width_pt - 595.0).abs() < 1.0);
    // The burned page is an image: no text layer left.
    assert!(burned.text_geometry(1).unwrap().is_empty());
    assert!(!burned.text_geometry(0).unwrap().is_empty());
}

#[test]
fn pdfium_open_keeps_document_loaded_with_password() {
    e2e_skip_unless_enabled!();
    init_tracing();
    use pdftag::pipeline::render::{bind_pdfium, PdfiumDocument};

    let dir = TempDir::new().unwrap();
    let pdf = dir.path().join("generated.pdf");
    let pdfium = bind_pdfium().expect("pdfium library");
    write_statement_pdf(&pdfium, &pdf);

    // Unencrypted documents ignore the password.
    let password = String::from("geheim");
    let doc = PdfiumDocument::open(&pdfium, &pdf, Some(password.as_str())).unwrap();
    assert_eq!(doc.page_count(), 2);
    assert!(!doc.text_geometry(1).unwrap().is_empty());
}
