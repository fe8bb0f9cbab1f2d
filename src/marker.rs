//! Invocation of the external `marker_single` converter.
//!
//! This crate owns none of the conversion itself. For each PDF the
//! [`Converter`] builds a command line, forwards the credential through the
//! child's environment, and blocks the (strictly sequential) pipeline until
//! the child exits. Success means a zero exit status *and* a discoverable
//! Markdown file under the output directory; everything else is a non-fatal
//! [`ConversionError`] carrying a tail of the child's output as diagnostics.
//!
//! Status lines the converter prints are forwarded opportunistically to a
//! [`ConvertProgress`] callback. They are display strings only — nothing
//! here parses them as structured data.

use crate::config::{Settings, API_KEY_VAR};
use crate::error::{ConversionError, MarkpdfError};
use crate::progress::ConvertProgress;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

/// Environment variable pointing at an alternative converter binary.
///
/// Normally `marker_single` is looked up on the PATH; this override skips
/// the lookup, which is also how the test suite substitutes a stub.
pub const MARKER_BIN_VAR: &str = "MARKPDF_MARKER_BIN";

const DEFAULT_PROGRAM: &str = "marker_single";

/// Status strings longer than this are cut for display.
const STATUS_MAX_CHARS: usize = 50;

/// How many recent output lines are kept as failure diagnostics.
const DIAGNOSTIC_TAIL: usize = 20;

/// Handle to a resolved converter binary plus the run settings.
#[derive(Debug, Clone)]
pub struct Converter {
    program: PathBuf,
    settings: Settings,
}

impl Converter {
    /// Resolve the converter binary, failing fast when it is not installed.
    ///
    /// Resolution order: `MARKPDF_MARKER_BIN` (taken as-is when it names an
    /// existing file, otherwise looked up on the PATH), then `marker_single`
    /// on the PATH.
    pub fn locate(settings: &Settings) -> Result<Self, MarkpdfError> {
        let program = match std::env::var_os(MARKER_BIN_VAR) {
            Some(overridden) => {
                let candidate = PathBuf::from(&overridden);
                if candidate.is_file() {
                    candidate
                } else {
                    which::which(&candidate).map_err(|_| MarkpdfError::ConverterNotFound {
                        program: candidate.display().to_string(),
                    })?
                }
            }
            None => {
                which::which(DEFAULT_PROGRAM).map_err(|_| MarkpdfError::ConverterNotFound {
                    program: DEFAULT_PROGRAM.to_string(),
                })?
            }
        };
        debug!("Using converter binary: {}", program.display());
        Ok(Self {
            program,
            settings: settings.clone(),
        })
    }

    /// The resolved converter binary.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Argument list for converting one PDF.
    ///
    /// The credential is never placed on the command line (visible in `ps`);
    /// it travels via the child's environment instead.
    fn build_args(&self, pdf: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            pdf.as_os_str().to_os_string(),
            "--output_dir".into(),
            self.settings.output_dir.as_os_str().to_os_string(),
            "--output_format".into(),
            "markdown".into(),
        ];
        if self.settings.use_llm {
            args.push("--use_llm".into());
        }
        args
    }

    /// Convert one PDF, blocking until the child process exits.
    ///
    /// Returns the path of the produced Markdown file. Failures are
    /// per-file and non-fatal to the batch.
    pub async fn convert(
        &self,
        pdf: &Path,
        progress: &dyn ConvertProgress,
    ) -> Result<PathBuf, ConversionError> {
        let pdf_name = pdf
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| pdf.display().to_string());
        progress.on_start(&pdf_name);
        info!("Converting {}", pdf.display());

        let spawn_err = |e: std::io::Error| ConversionError::SpawnFailed {
            program: self.program.display().to_string(),
            detail: e.to_string(),
        };

        let mut child = Command::new(&self.program)
            .args(self.build_args(pdf))
            .env(API_KEY_VAR, &self.settings.api_key)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        // Both pipes must be drained while the child runs, or a chatty
        // converter deadlocks on a full pipe buffer.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (mut tail, tail_err) =
            tokio::join!(drain_lines(stdout, progress), drain_lines(stderr, progress));
        tail.extend(tail_err);
        if tail.len() > DIAGNOSTIC_TAIL {
            tail.drain(..tail.len() - DIAGNOSTIC_TAIL);
        }

        let status = child.wait().await.map_err(spawn_err)?;

        if !status.success() {
            progress.on_finish(&pdf_name, false);
            return Err(ConversionError::ToolFailed {
                status: status.to_string(),
                detail: tail.join("\n"),
            });
        }

        match discover_output(&self.settings.output_dir, pdf) {
            Some(output) => {
                info!("Converted {} -> {}", pdf.display(), output.display());
                progress.on_finish(&pdf_name, true);
                Ok(output)
            }
            None => {
                progress.on_finish(&pdf_name, false);
                Err(ConversionError::OutputMissing {
                    output_dir: self.settings.output_dir.clone(),
                })
            }
        }
    }
}

/// Forward non-empty lines to the progress callback, keeping a bounded tail.
async fn drain_lines<R>(reader: Option<R>, progress: &dyn ConvertProgress) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Vec::new();
    };
    let mut lines = BufReader::new(reader).lines();
    let mut tail: Vec<String> = Vec::new();
    while let Ok(Some(line)) = lines.next_line().await {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        progress.on_status(&truncate_status(trimmed));
        if tail.len() == DIAGNOSTIC_TAIL {
            tail.remove(0);
        }
        tail.push(trimmed.to_string());
    }
    tail
}

/// Cut a status line to a displayable length on a char boundary.
fn truncate_status(line: &str) -> String {
    if line.chars().count() <= STATUS_MAX_CHARS {
        return line.to_string();
    }
    let cut: String = line.chars().take(STATUS_MAX_CHARS - 1).collect();
    format!("{cut}…")
}

/// Locate the Markdown file the converter produced for `pdf`.
///
/// marker writes `<output_dir>/<stem>/<stem>.md`; older releases wrote the
/// flat `<output_dir>/<stem>.md`. Both are accepted.
pub fn discover_output(output_dir: &Path, pdf: &Path) -> Option<PathBuf> {
    let stem = pdf.file_stem()?.to_string_lossy();
    let nested = output_dir.join(&*stem).join(format!("{stem}.md"));
    if nested.is_file() {
        return Some(nested);
    }
    let flat = output_dir.join(format!("{stem}.md"));
    flat.is_file().then_some(flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopProgress;
    use std::sync::Mutex;

    fn settings(output_dir: &Path, use_llm: bool) -> Settings {
        Settings {
            api_key: "AIza-test-key-0123456789".into(),
            output_dir: output_dir.to_path_buf(),
            use_llm,
        }
    }

    struct CollectingProgress {
        statuses: Mutex<Vec<String>>,
    }

    impl ConvertProgress for CollectingProgress {
        fn on_status(&self, message: &str) {
            self.statuses.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn args_include_use_llm_flag_when_enabled() {
        let c = Converter {
            program: PathBuf::from("marker_single"),
            settings: settings(Path::new("/out"), true),
        };
        let args = c.build_args(Path::new("/docs/paper.pdf"));
        assert!(args.contains(&OsString::from("--use_llm")));
        assert!(args.contains(&OsString::from("--output_dir")));
        assert!(args.contains(&OsString::from("/out")));
        assert_eq!(args[0], OsString::from("/docs/paper.pdf"));
    }

    #[test]
    fn args_omit_use_llm_flag_when_disabled() {
        let c = Converter {
            program: PathBuf::from("marker_single"),
            settings: settings(Path::new("/out"), false),
        };
        let args = c.build_args(Path::new("/docs/paper.pdf"));
        assert!(!args.contains(&OsString::from("--use_llm")));
    }

    #[test]
    fn credential_stays_off_the_command_line() {
        let c = Converter {
            program: PathBuf::from("marker_single"),
            settings: settings(Path::new("/out"), true),
        };
        let args = c.build_args(Path::new("/docs/paper.pdf"));
        assert!(args.iter().all(|a| a != "AIza-test-key-0123456789"));
    }

    #[test]
    fn truncate_status_keeps_short_lines() {
        assert_eq!(truncate_status("Loading models"), "Loading models");
    }

    #[test]
    fn truncate_status_cuts_long_lines_with_ellipsis() {
        let long = "x".repeat(120);
        let cut = truncate_status(&long);
        assert_eq!(cut.chars().count(), STATUS_MAX_CHARS);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn discover_output_prefers_nested_layout() {
        let dir = tempfile::tempdir().unwrap();
        let nested_dir = dir.path().join("paper");
        std::fs::create_dir_all(&nested_dir).unwrap();
        std::fs::write(nested_dir.join("paper.md"), "# hi").unwrap();
        std::fs::write(dir.path().join("paper.md"), "# flat").unwrap();

        let found = discover_output(dir.path(), Path::new("/docs/paper.pdf")).unwrap();
        assert_eq!(found, nested_dir.join("paper.md"));
    }

    #[test]
    fn discover_output_accepts_flat_layout() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("paper.md"), "# flat").unwrap();
        let found = discover_output(dir.path(), Path::new("paper.pdf")).unwrap();
        assert_eq!(found, dir.path().join("paper.md"));
    }

    #[test]
    fn discover_output_none_when_nothing_produced() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_output(dir.path(), Path::new("paper.pdf")).is_none());
    }

    // ── Subprocess tests against a stub converter (unix shell) ───────────

    #[cfg(unix)]
    fn write_stub(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake_marker.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn convert_succeeds_and_reports_status_lines() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");
        std::fs::create_dir_all(out_dir.join("doc")).unwrap();
        let pdf = dir.path().join("doc.pdf");
        std::fs::write(&pdf, b"%PDF-1.4 stub").unwrap();

        let stub = write_stub(
            dir.path(),
            &format!(
                "echo 'Recognizing layout'\n\
                 echo 'Processing page 1' >&2\n\
                 echo '# converted' > '{}'",
                out_dir.join("doc").join("doc.md").display()
            ),
        );

        let c = Converter {
            program: stub,
            settings: settings(&out_dir, true),
        };
        let progress = CollectingProgress {
            statuses: Mutex::new(Vec::new()),
        };

        let output = c.convert(&pdf, &progress).await.expect("conversion ok");
        assert_eq!(output, out_dir.join("doc").join("doc.md"));

        let statuses = progress.statuses.lock().unwrap();
        assert!(statuses.iter().any(|s| s.contains("Recognizing layout")));
        assert!(statuses.iter().any(|s| s.contains("Processing page 1")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn convert_fails_with_diagnostics_on_nonzero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("doc.pdf");
        std::fs::write(&pdf, b"%PDF-1.4 stub").unwrap();

        let stub = write_stub(dir.path(), "echo 'model download failed' >&2\nexit 3");
        let c = Converter {
            program: stub,
            settings: settings(dir.path(), false),
        };

        let err = c.convert(&pdf, &NoopProgress).await.expect_err("must fail");
        match err {
            ConversionError::ToolFailed { detail, .. } => {
                assert!(detail.contains("model download failed"), "got: {detail}");
            }
            other => panic!("expected ToolFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn convert_fails_when_no_output_file_appears() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("doc.pdf");
        std::fs::write(&pdf, b"%PDF-1.4 stub").unwrap();

        let stub = write_stub(dir.path(), "echo 'done'");
        let c = Converter {
            program: stub,
            settings: settings(dir.path(), false),
        };

        let err = c.convert(&pdf, &NoopProgress).await.expect_err("must fail");
        assert!(matches!(err, ConversionError::OutputMissing { .. }));
    }

    #[tokio::test]
    async fn convert_reports_spawn_failure_for_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("doc.pdf");
        std::fs::write(&pdf, b"%PDF-1.4 stub").unwrap();

        let c = Converter {
            program: dir.path().join("no_such_binary"),
            settings: settings(dir.path(), false),
        };
        let err = c.convert(&pdf, &NoopProgress).await.expect_err("must fail");
        assert!(matches!(err, ConversionError::SpawnFailed { .. }));
    }
}
