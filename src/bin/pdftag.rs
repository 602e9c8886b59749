//! CLI binary for pdftag.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `TaggerConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdftag::geometry::ScreenPoint;
use pdftag::pipeline::input::resolve_local;
use pdftag::pipeline::render::{bind_pdfium, PdfiumDocument};
use pdftag::{
    burn_page, load_or_analyze, suggest_output_path, AnalysisProgress, NoopProgress, SetOrigin,
    Session, TaggerConfig, TransactionCursor,
};
use std::cell::Cell;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Progress bar over the pages of one analysis run.
struct CliProgress {
    bar: ProgressBar,
    found: Cell<usize>,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix("Opening");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self {
            bar,
            found: Cell::new(0),
        }
    }
}

impl AnalysisProgress for CliProgress {
    fn on_analysis_start(&self, total_pages: usize) {
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} pages  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        self.bar.set_length(total_pages as u64);
        self.bar.set_prefix("Analysing");
    }

    fn on_page_complete(&self, _page_num: usize, _total_pages: usize, found: usize) {
        self.found.set(self.found.get() + found);
        self.bar
            .set_message(format!("{} transactions", self.found.get()));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total_pages,
            red(error)
        ));
    }

    fn on_analysis_complete(&self, total_pages: usize, total_found: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} transactions on {} pages",
            green("✔"),
            bold(&total_found.to_string()),
            total_pages
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Find transactions (analyses once, then reads auszug_transactions.json)
  pdftag analyze auszug.pdf

  # Re-analyse and print JSON
  pdftag analyze --force --json auszug.pdf

  # Where does the 3rd transaction go on screen?
  pdftag show auszug.pdf --index 3 --viewport-x 120 --viewport-y 80

  # Burn an editing session into auszug_marked1.pdf
  pdftag burn auszug.pdf --session session.json

SESSION FILE:
  {
    "pageIndex": 0,
    "viewportOrigin": { "x": 120, "y": 80 },
    "primary": { "screenRect": { "x": 200, "y": 497, "width": 600, "height": 30 },
                 "fillColor": { "r": 255, "g": 255, "b": 0 } },
    "placed":  [ { "screenRect": { "x": 820, "y": 490, "width": 58, "height": 42 },
                   "fillColor": { "r": 220, "g": 120, "b": 0 }, "text": "M" } ]
  }

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to an existing libpdfium
  RUST_LOG          Overrides the log filter (e.g. pdftag=debug)
"#;

/// Find transactions in bank statements and burn tag markers into PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "pdftag",
    version,
    about = "Find transactions in bank statements and burn tag markers into PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Raster DPI shared by detection and rendering (72–400).
    #[arg(long, global = true, env = "PDFTAG_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, global = true, env = "PDFTAG_PASSWORD")]
    password: Option<String>,

    /// Suffix of the side-car transaction file.
    #[arg(long, global = true, env = "PDFTAG_CACHE_SUFFIX", default_value = "_transactions.json")]
    cache_suffix: String,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDFTAG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDFTAG_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load cached transactions or analyse the document.
    Analyze {
        pdf: PathBuf,

        /// Ignore and overwrite an existing cache.
        #[arg(long)]
        force: bool,

        /// Print the transaction set as JSON.
        #[arg(long)]
        json: bool,

        /// Discard the cache when the PDF's content hash changed.
        #[arg(long, env = "PDFTAG_VERIFY_CACHE")]
        verify_cache: bool,
    },

    /// Show where the N-th transaction (1-indexed, wraps around) lands.
    Show {
        pdf: PathBuf,

        #[arg(long, default_value_t = 1)]
        index: usize,

        /// Screen position of the page viewport's top-left corner.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        viewport_x: i32,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        viewport_y: i32,
    },

    /// Burn a session's annotations into a copy of the PDF.
    Burn {
        pdf: PathBuf,

        /// Session JSON describing the page and its annotations.
        #[arg(long)]
        session: PathBuf,

        /// Output PDF. Default: first free <stem>_marked<N>.pdf.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print page count and page sizes.
    Inspect {
        pdf: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.common.verbose {
        "debug"
    } else if cli.common.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let verify_cache = matches!(
        cli.command,
        Command::Analyze {
            verify_cache: true,
            ..
        }
    );
    let config = build_config(&cli.common, verify_cache)?;
    let pdfium = bind_pdfium().context("PDF engine unavailable")?;

    match &cli.command {
        Command::Analyze {
            pdf, force, json, ..
        } => {
            let path = resolve_local(pdf)?;
            let doc = PdfiumDocument::open(&pdfium, &path, config.password.as_deref())?;
            let progress: Box<dyn AnalysisProgress> = if cli.common.quiet || *json {
                Box::new(NoopProgress)
            } else {
                Box::new(CliProgress::new())
            };
            let loaded = load_or_analyze(&doc, &path, &config, progress.as_ref(), *force)
                .context("Analysis failed")?;

            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&loaded.set)
                        .context("Failed to serialise transactions")?
                );
                return Ok(());
            }

            if !cli.common.quiet && loaded.origin == SetOrigin::Cache {
                eprintln!(
                    "{}",
                    dim(&format!(
                        "cached analysis from {}",
                        loaded.set.analyzed_at.format("%Y-%m-%d %H:%M")
                    ))
                );
            }
            for (i, r) in loaded.set.records.iter().enumerate() {
                println!(
                    "{:>4}  p{:<3} ({:>5},{:>5})  {:<10}  {:>12}  {}",
                    i + 1,
                    r.page_index + 1,
                    r.pixel_x,
                    r.pixel_y,
                    r.date
                        .map(|d| d.format("%d.%m.%Y").to_string())
                        .unwrap_or_else(|| "-".into()),
                    r.amount.map(|a| a.to_string()).unwrap_or_else(|| "-".into()),
                    r.raw_text
                );
            }
        }

        Command::Show {
            pdf,
            index,
            viewport_x,
            viewport_y,
        } => {
            let path = resolve_local(pdf)?;
            let doc = PdfiumDocument::open(&pdfium, &path, config.password.as_deref())?;
            let loaded = load_or_analyze(&doc, &path, &config, &NoopProgress, false)
                .context("Analysis failed")?;

            let mut cursor = TransactionCursor::new(&loaded.set);
            if cursor.is_empty() {
                anyhow::bail!("No transactions found in {}", path.display());
            }
            cursor.seek(index.saturating_sub(1));
            let origin = ScreenPoint::new(*viewport_x, *viewport_y);
            let target = cursor
                .jump_target(origin)
                .context("Transaction cursor is empty")?;
            let record = cursor.current().context("Transaction cursor is empty")?;

            println!("{}", cursor.status());
            println!("Page:         {}", target.page_index + 1);
            println!(
                "Overlay:      ({}, {})",
                target.overlay_origin.x, target.overlay_origin.y
            );
            println!("Text:         {}", record.raw_text);
        }

        Command::Burn {
            pdf,
            session,
            output,
        } => {
            let path = resolve_local(pdf)?;
            let session = Session::load(session)?;
            let output = output
                .clone()
                .unwrap_or_else(|| suggest_output_path(&path));
            let doc = PdfiumDocument::open(&pdfium, &path, config.password.as_deref())?;

            burn_page(&doc, &session, &output, &config).context("Burning failed")?;

            if !cli.common.quiet {
                eprintln!(
                    "{}  page {}  →  {}",
                    green("✔"),
                    session.page_index + 1,
                    bold(&output.display().to_string())
                );
            }
        }

        Command::Inspect { pdf, json } => {
            let path = resolve_local(pdf)?;
            let doc = PdfiumDocument::open(&pdfium, &path, config.password.as_deref())?;
            let info = doc.info();

            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&info).context("Failed to serialise info")?
                );
            } else {
                print_info(&path, &info);
            }
        }
    }

    Ok(())
}

fn print_info(path: &Path, info: &pdftag::pipeline::render::DocumentInfo) {
    println!("File:         {}", path.display());
    if let Some(ref t) = info.title {
        println!("Title:        {}", t);
    }
    println!("Pages:        {}", info.page_count);
    println!("PDF Version:  {}", info.pdf_version);
    if let Some(ref p) = info.producer {
        println!("Producer:     {}", p);
    }
    for (i, page) in info.pages.iter().enumerate() {
        println!(
            "  {:>3}  {:.1} x {:.1} pt",
            i + 1,
            page.width_pt,
            page.height_pt
        );
    }
}

/// Map CLI args to `TaggerConfig`.
fn build_config(common: &CommonArgs, verify_cache: bool) -> Result<TaggerConfig> {
    let mut builder = TaggerConfig::builder()
        .dpi(common.dpi)
        .cache_suffix(common.cache_suffix.clone())
        .verify_cache_hash(verify_cache);
    if let Some(ref pwd) = common.password {
        builder = builder.password(pwd.clone());
    }
    builder.build().context("Invalid configuration")
}
