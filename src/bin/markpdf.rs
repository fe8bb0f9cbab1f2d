//! CLI binary for markpdf.
//!
//! A thin shim over the library crate that maps CLI flags to the run
//! configuration, drives the sequential conversion loop, and prints
//! progress and the final summary.

use anyhow::{Context, Result};
use clap::Parser;
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use markpdf::{config, picker, report, validate, ConvertProgress, Converter, MarkpdfError};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Interactive mode (file picker)
  markpdf

  # Convert a single PDF
  markpdf document.pdf

  # Convert multiple PDFs
  markpdf doc1.pdf doc2.pdf doc3.pdf

  # Custom output directory
  markpdf document.pdf --output-dir ./my_outputs

  # Fast mode (no LLM)
  markpdf document.pdf --no-llm

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY      Gemini API key (mandatory; prompted for on first run)
  MARKPDF_OUTPUT_DIR  Default output directory
  MARKPDF_USE_LLM     Default for LLM-assisted mode (true/1/yes)
  MARKPDF_MARKER_BIN  Path to an existing marker_single binary — skips PATH lookup
  MARKPDF_CONFIG_DIR  Override the settings-file directory

EXIT CODES:
  0    all conversions succeeded (or partially succeeded)
  1    configuration, selection, or validation error; or every file failed
  130  interrupted by Ctrl-C

SETUP:
  1. Install the converter:  pip install marker-pdf[full]
  2. Set the API key:        export GEMINI_API_KEY=AIza...
  3. Convert:                markpdf document.pdf
"#;

/// Convert PDF files to Markdown using marker with the Gemini API.
#[derive(Parser, Debug)]
#[command(
    name = "markpdf",
    version,
    about = "Convert PDF files to Markdown using marker with the Gemini API",
    long_about = "Convert PDF documents to clean Markdown by orchestrating the external \
marker_single converter, optionally in LLM-assisted mode for maximum accuracy. \
Run without arguments to pick files interactively.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files to convert. Opens a file picker when omitted.
    pdf_paths: Vec<PathBuf>,

    /// Output directory for Markdown files.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Disable LLM-assisted conversion for faster (but less accurate) processing.
    #[arg(long)]
    no_llm: bool,

    /// Accepted for compatibility; processing is always one file at a time.
    #[arg(long, hide_short_help = true)]
    batch: bool,

    /// Suppress the banner and per-file progress output.
    #[arg(short, long)]
    quiet: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,
}

// ── CLI progress callback using indicatif ────────────────────────────────

/// Terminal progress: a spinner whose message follows the converter's
/// status lines.
struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg} {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
        );
        bar.set_message("Converting…");
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

impl ConvertProgress for SpinnerProgress {
    fn on_status(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn on_finish(&self, _pdf_name: &str, _success: bool) {
        self.bar.finish_and_clear();
    }
}

/// Silent progress for `--quiet` runs.
struct QuietProgress;

impl ConvertProgress for QuietProgress {}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback that matters; suppress INFO-level
    // library logs unless the user asks for them.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
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

    // ── Ctrl-C → clean exit 130, no summary ──────────────────────────────
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            let term = Term::stderr();
            term.write_line("").ok();
            term.write_line(&format!("{}", style("⚠ Interrupted by user.").yellow()))
                .ok();
            std::process::exit(130);
        }
    });

    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let term = Term::stderr();

    if !cli.quiet {
        print_banner(&term);
    }
    if cli.batch {
        tracing::debug!("--batch accepted but has no effect; processing is always sequential");
    }

    // ── Configuration ────────────────────────────────────────────────────
    let use_llm_override = cli.no_llm.then_some(false);
    let settings = config::load(cli.output_dir.clone(), use_llm_override)
        .context("Configuration error")?;
    if !cli.quiet {
        display_config(&term, &settings);
    }

    // ── Converter presence & output directory ────────────────────────────
    let converter = Converter::locate(&settings)?;
    validate::ensure_directory(&settings.output_dir).map_err(|source| {
        MarkpdfError::OutputDirFailed {
            path: settings.output_dir.clone(),
            source,
        }
    })?;

    // ── Candidate files: explicit args or picker ─────────────────────────
    let candidates = if cli.pdf_paths.is_empty() {
        if !cli.quiet {
            term.write_line(&format!("{}", style("Opening file picker…").yellow()))
                .ok();
        }
        picker::select_files(&term)?
    } else {
        cli.pdf_paths.clone()
    };

    // ── Validation ───────────────────────────────────────────────────────
    let (files, skipped) = validate::filter_pdfs(&candidates);
    for path in &skipped {
        term.write_line(&format!(
            "{} Skipping invalid PDF: {}",
            style("⚠").yellow(),
            path.display()
        ))
        .ok();
    }
    if files.is_empty() {
        return Err(MarkpdfError::NoValidPdfs {
            candidates: candidates.len(),
        }
        .into());
    }

    if !cli.quiet {
        report::display_files(&term, &files);
    }

    // ── Sequential conversion loop ───────────────────────────────────────
    let mut summary = report::RunSummary::new(files.len());
    let start = Instant::now();

    for (idx, pdf) in files.iter().enumerate() {
        let name = pdf
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| pdf.display().to_string());

        term.write_line(&format!(
            "{} {}",
            style(format!("Processing ({}/{}):", idx + 1, files.len()))
                .cyan()
                .bold(),
            name
        ))
        .ok();

        let progress: Box<dyn ConvertProgress> = if cli.quiet {
            Box::new(QuietProgress)
        } else {
            Box::new(SpinnerProgress::new())
        };

        match converter.convert(pdf, progress.as_ref()).await {
            Ok(output) => {
                term.write_line(&format!(
                    "{} Output: {}",
                    style("✅ Success!").green().bold(),
                    output.display()
                ))
                .ok();
                summary.record_success(output);
            }
            Err(e) => {
                term.write_line(&format!("{} {}", style("❌ Failed:").red().bold(), e))
                    .ok();
                summary.record_failure(pdf, &e);
            }
        }
    }
    summary.elapsed = start.elapsed();

    // ── Summary ──────────────────────────────────────────────────────────
    summary.display(&term);

    if !summary.any_succeeded() {
        anyhow::bail!("all {} conversion(s) failed", summary.total);
    }
    Ok(())
}

fn print_banner(term: &Term) {
    term.write_line("").ok();
    term.write_line(&format!(
        "{}",
        style("📄 PDF to Markdown Converter").cyan().bold()
    ))
    .ok();
    term.write_line(&format!("{}", style("Powered by marker + Gemini API").dim()))
        .ok();
    term.write_line("").ok();
}

fn display_config(term: &Term, settings: &config::Settings) {
    let w = |line: &str| {
        term.write_line(line).ok();
    };
    w(&format!(
        "  🔑 API key     {}",
        style("✓ configured").green()
    ));
    w(&format!(
        "  📁 Output dir  {}",
        style(settings.output_dir.display()).cyan()
    ));
    w(&format!(
        "  🤖 Use LLM     {}",
        if settings.use_llm {
            style("yes (maximum accuracy)").green()
        } else {
            style("no (faster)").yellow()
        }
    ));
}
