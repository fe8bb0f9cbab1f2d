//! Candidate-path validation and small filesystem helpers.
//!
//! Validation is deliberately forgiving at the item level and strict at the
//! set level: an individual bad path is reported and dropped, but a run with
//! zero surviving paths is a fatal [`crate::error::MarkpdfError::NoValidPdfs`]
//! raised by the caller.

use std::path::{Path, PathBuf};

/// Whether a path points at an existing, regular, `.pdf` file.
///
/// The extension check is case-insensitive (`.PDF` scans from cameras and
/// scanners are common). Directories and dangling paths fail.
pub fn is_pdf_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Split candidates into valid PDFs and skipped entries, preserving order.
pub fn filter_pdfs(candidates: &[PathBuf]) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut valid = Vec::new();
    let mut skipped = Vec::new();
    for path in candidates {
        if is_pdf_file(path) {
            valid.push(path.clone());
        } else {
            tracing::debug!("Skipping invalid candidate: {}", path.display());
            skipped.push(path.clone());
        }
    }
    (valid, skipped)
}

/// Create a directory (and parents) if it does not already exist.
pub fn ensure_directory(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}

/// Format a byte count for humans: `512 B`, `1.5 KB`, `3.2 MB`, …
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return if unit == "B" {
                format!("{bytes} B")
            } else {
                format!("{size:.1} {unit}")
            };
        }
        size /= 1024.0;
    }
    format!("{size:.1} TB")
}

/// Size of a file in bytes, `None` when unreadable.
pub fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).ok().map(|m| m.len())
}
