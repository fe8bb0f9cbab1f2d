//! File selection: native dialog with a terminal-prompt fallback.
//!
//! Two [`FilePicker`] strategies exist. [`DialogPicker`] drives a platform
//! file-choice helper (`osascript` on macOS, `zenity` or `kdialog`
//! elsewhere) as a subprocess; [`PromptPicker`] reads paths from stdin.
//! [`select_files`] probes the dialog first and demotes any dialog problem
//! to an informational notice before falling back to the prompt — only a
//! prompt that yields zero paths is fatal.
//!
//! The terminal strategy tolerates drag-and-drop paste: wrapping single or
//! double quotes are stripped, and a line may carry one path or several
//! comma-separated ones. Input ends at end-of-stream.

use crate::error::MarkpdfError;
use console::{style, Term};
use std::ffi::OsString;
use std::io::BufRead;
use std::path::PathBuf;
use std::process::Command;

/// Why a picker strategy produced nothing.
#[derive(Debug)]
pub enum PickError {
    /// The strategy cannot run here (helper missing, no display, …).
    Unavailable(String),
    /// The strategy ran but the user selected nothing.
    Empty,
}

/// A strategy for obtaining candidate file paths from the user.
pub trait FilePicker {
    /// Short human-readable strategy name, used in notices.
    fn label(&self) -> &'static str;

    /// Run the strategy once and return the chosen paths.
    fn pick(&self) -> Result<Vec<PathBuf>, PickError>;
}

// ── Dialog strategy ──────────────────────────────────────────────────────

/// Which external dialog helper is driving the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DialogHelper {
    Osascript,
    Zenity,
    Kdialog,
}

impl DialogHelper {
    fn program(self) -> &'static str {
        match self {
            DialogHelper::Osascript => "osascript",
            DialogHelper::Zenity => "zenity",
            DialogHelper::Kdialog => "kdialog",
        }
    }

    /// Argument list asking the helper for a multi-file PDF selection with
    /// newline-separated POSIX paths on stdout.
    fn args(self) -> Vec<OsString> {
        let to_os = |v: &[&str]| v.iter().map(OsString::from).collect();
        match self {
            DialogHelper::Osascript => to_os(&[
                "-e",
                r#"set pdfs to choose file of type {"com.adobe.pdf"} with prompt "Select PDF files" with multiple selections allowed"#,
                "-e",
                "set out to \"\"",
                "-e",
                "repeat with f in pdfs",
                "-e",
                "set out to out & POSIX path of f & linefeed",
                "-e",
                "end repeat",
                "-e",
                "out",
            ]),
            DialogHelper::Zenity => to_os(&[
                "--file-selection",
                "--multiple",
                "--separator=\n",
                "--title=Select PDF files",
                "--file-filter=PDF files | *.pdf *.PDF",
            ]),
            DialogHelper::Kdialog => to_os(&[
                "--getopenfilename",
                ".",
                "application/pdf",
                "--multiple",
                "--separate-output",
                "--title",
                "Select PDF files",
            ]),
        }
    }
}

/// Native file-choice dialog, driven through an external helper binary.
#[derive(Debug, Default)]
pub struct DialogPicker;

impl DialogPicker {
    /// Probe the PATH for a usable dialog helper.
    fn helper() -> Option<DialogHelper> {
        let candidates: &[DialogHelper] = if cfg!(target_os = "macos") {
            &[DialogHelper::Osascript]
        } else {
            &[DialogHelper::Zenity, DialogHelper::Kdialog]
        };
        candidates
            .iter()
            .copied()
            .find(|h| which::which(h.program()).is_ok())
    }
}

impl FilePicker for DialogPicker {
    fn label(&self) -> &'static str {
        "file dialog"
    }

    fn pick(&self) -> Result<Vec<PathBuf>, PickError> {
        let helper = Self::helper().ok_or_else(|| {
            PickError::Unavailable("no dialog helper (zenity/kdialog/osascript) on PATH".into())
        })?;

        tracing::debug!("Opening file dialog via {}", helper.program());
        let output = Command::new(helper.program())
            .args(helper.args())
            .output()
            .map_err(|e| PickError::Unavailable(format!("{}: {e}", helper.program())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // Cancelled dialogs exit non-zero but quietly; real failures
            // (no display, Gtk init) complain on stderr.
            if stderr.trim().is_empty() {
                return Err(PickError::Empty);
            }
            return Err(PickError::Unavailable(stderr.trim().to_string()));
        }

        let paths = parse_selection(&String::from_utf8_lossy(&output.stdout));
        if paths.is_empty() {
            return Err(PickError::Empty);
        }
        Ok(paths)
    }
}

// ── Terminal strategy ────────────────────────────────────────────────────

/// Line-oriented terminal prompt: one path per line or comma-separated,
/// terminated by end-of-stream (Ctrl-D).
pub struct PromptPicker {
    term: Term,
}

impl PromptPicker {
    pub fn new(term: Term) -> Self {
        Self { term }
    }
}

impl FilePicker for PromptPicker {
    fn label(&self) -> &'static str {
        "terminal prompt"
    }

    fn pick(&self) -> Result<Vec<PathBuf>, PickError> {
        let t = &self.term;
        t.write_line("").ok();
        t.write_line(&format!(
            "{}",
            style("Enter PDF file paths (one per line, or comma-separated).").bold()
        ))
        .ok();
        t.write_line("You can also drag and drop files into the terminal.")
            .ok();
        t.write_line(&format!(
            "{}",
            style("Press Ctrl+D when done.").dim()
        ))
        .ok();
        t.write_line("").ok();

        let stdin = std::io::stdin();
        let mut raw = String::new();
        for line in stdin.lock().lines() {
            match line {
                Ok(l) => {
                    raw.push_str(&l);
                    raw.push('\n');
                }
                Err(_) => break,
            }
        }

        let paths = parse_selection(&raw);
        if paths.is_empty() {
            return Err(PickError::Empty);
        }
        Ok(paths)
    }
}

// ── Shared parsing helpers ───────────────────────────────────────────────

/// Strip surrounding whitespace and wrapping quote characters from one
/// pasted path token.
fn clean_token(token: &str) -> &str {
    token
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
}

/// Parse newline- and comma-separated path text into a list of paths.
fn parse_selection(text: &str) -> Vec<PathBuf> {
    text.lines()
        .flat_map(|line| line.split(','))
        .map(clean_token)
        .filter(|t| !t.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Obtain candidate paths: dialog first, terminal prompt as fallback.
///
/// Dialog failure is never fatal — it is logged and reported on `term` as a
/// notice. Zero paths from the fallback prompt is
/// [`MarkpdfError::NoFilesSelected`].
pub fn select_files(term: &Term) -> Result<Vec<PathBuf>, MarkpdfError> {
    let dialog = DialogPicker;
    match dialog.pick() {
        Ok(paths) => return Ok(paths),
        Err(PickError::Unavailable(reason)) => {
            tracing::info!("{} unavailable: {}", dialog.label(), reason);
            term.write_line(&format!(
                "{} File dialog unavailable, falling back to terminal input.",
                style("ℹ").blue()
            ))
            .ok();
        }
        Err(PickError::Empty) => {
            term.write_line(&format!(
                "{} Nothing chosen in the dialog, falling back to terminal input.",
                style("ℹ").blue()
            ))
            .ok();
        }
    }

    let prompt = PromptPicker::new(term.clone());
    prompt.pick().map_err(|_| MarkpdfError::NoFilesSelected)
}
