//! Error types for the markpdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`MarkpdfError`] — **Fatal**: the run cannot proceed at all (bad or
//!   missing credential, nothing selected, converter not installed).
//!   Returned as `Err(MarkpdfError)` from the top-level operations.
//!
//! * [`ConversionError`] — **Non-fatal**: converting a single PDF failed
//!   (non-zero exit, output file never appeared) but the remaining files are
//!   unaffected. Stored in [`crate::report::RunSummary`] so callers can
//!   inspect partial success rather than losing the whole batch to one bad
//!   document.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the markpdf library.
///
/// Per-file failures use [`ConversionError`] and are accumulated in the
/// run summary rather than propagated here.
#[derive(Debug, Error)]
pub enum MarkpdfError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// The credential environment variable is unset and no settings file
    /// supplies one.
    #[error(
        "GEMINI_API_KEY is not set.\n\
         Export it, or run markpdf interactively once to store it in the settings file.\n\
         Get a key from: https://aistudio.google.com/app/apikey"
    )]
    ApiKeyMissing,

    /// The credential is empty, the known placeholder, or too short to be real.
    #[error(
        "GEMINI_API_KEY is invalid (empty or placeholder value).\n\
         Replace it with a real key from: https://aistudio.google.com/app/apikey"
    )]
    ApiKeyInvalid,

    /// Interactive first-run setup was cancelled or produced no usable key.
    #[error("Configuration setup cancelled")]
    SetupCancelled,

    /// The settings file exists but could not be read or parsed.
    #[error("Failed to read settings file '{path}': {detail}")]
    SettingsUnreadable { path: PathBuf, detail: String },

    /// The settings file could not be written during first-run setup.
    #[error("Failed to write settings file '{path}': {source}")]
    SettingsWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Selection errors ──────────────────────────────────────────────────
    /// The picker (dialog or prompt) produced zero paths.
    #[error("No files selected")]
    NoFilesSelected,

    // ── Validation errors ─────────────────────────────────────────────────
    /// Every candidate path was dropped during validation.
    #[error("No valid PDF files to process ({candidates} candidate(s) were skipped)")]
    NoValidPdfs { candidates: usize },

    // ── Converter errors ──────────────────────────────────────────────────
    /// The external converter binary is not on the PATH.
    #[error(
        "'{program}' command not found.\n\
         Install marker-pdf:  pip install marker-pdf[full]\n\
         Or point MARKPDF_MARKER_BIN at an existing binary."
    )]
    ConverterNotFound { program: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the output directory.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A non-fatal error for a single PDF.
///
/// Stored in [`crate::report::RunSummary`] when a file fails. The overall
/// run continues with the next file.
#[derive(Debug, Clone, Error)]
pub enum ConversionError {
    /// The child process could not be spawned at all.
    #[error("failed to launch '{program}': {detail}")]
    SpawnFailed { program: String, detail: String },

    /// The converter exited with a non-zero status.
    #[error("converter exited with {status}: {detail}")]
    ToolFailed { status: String, detail: String },

    /// The converter reported success but no output file was produced.
    #[error("converter exited cleanly but no Markdown output was found under '{output_dir}'")]
    OutputMissing { output_dir: PathBuf },
}
