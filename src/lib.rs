//! # markpdf
//!
//! Convert PDF documents to Markdown by orchestrating the external
//! [marker](https://github.com/VikParuchuri/marker) converter, optionally in
//! LLM-assisted mode backed by the Gemini API.
//!
//! This crate deliberately does **no** PDF parsing, layout analysis, or
//! document-structure inference of its own — `marker_single` owns all of
//! that. What lives here is the thin orchestration around it:
//!
//! ```text
//! ┌─ 1. Config    GEMINI_API_KEY + settings file → immutable Settings
//! ├─ 2. Select    native file dialog, terminal prompt fallback
//! ├─ 3. Validate  keep existing, regular, .pdf files (order preserved)
//! ├─ 4. Convert   spawn marker_single per file, sequentially, stream status
//! └─ 5. Report    counts + output/failure lists as a summary table
//! ```
//!
//! Files are processed one at a time; a single file's failure is recorded
//! and the run continues, so a batch reports partial success rather than
//! dying on the first bad document.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use markpdf::{config, marker::Converter, progress::NoopProgress};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = config::load(None, None)?;
//!     let converter = Converter::locate(&settings)?;
//!     let output = converter
//!         .convert(Path::new("document.pdf"), &NoopProgress)
//!         .await?;
//!     println!("wrote {}", output.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `markpdf` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod marker;
pub mod picker;
pub mod progress;
pub mod report;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{load as load_settings, Settings};
pub use error::{ConversionError, MarkpdfError};
pub use marker::Converter;
pub use picker::{select_files, DialogPicker, FilePicker, PickError, PromptPicker};
pub use progress::{ConvertProgress, NoopProgress, ProgressSink};
pub use report::RunSummary;
pub use validate::filter_pdfs;
