//! Configuration loading for markpdf.
//!
//! All run behaviour is captured in one immutable [`Settings`] record,
//! constructed once at startup. Values come from three layers with a fixed
//! precedence per field:
//!
//! 1. explicit CLI override
//! 2. environment variable (`GEMINI_API_KEY`, `MARKPDF_OUTPUT_DIR`,
//!    `MARKPDF_USE_LLM`)
//! 3. the JSON settings file under `{config_dir}/markpdf/config.json`
//! 4. hard-coded default
//!
//! The credential is mandatory: an empty, placeholder, or implausibly short
//! key aborts the run before any conversion is attempted. An environment
//! credential that is set but empty is rejected outright; it never falls
//! through to a key stored in the settings file. When no credential
//! can be found and the session is attended, [`load`] offers an interactive
//! first-run setup that stores the key in the settings file.

use crate::error::MarkpdfError;
use console::style;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable holding the Gemini API credential.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Environment variable overriding the default output directory.
pub const OUTPUT_DIR_VAR: &str = "MARKPDF_OUTPUT_DIR";
/// Environment variable overriding the LLM-assisted default (`true`/`1`/`yes`).
pub const USE_LLM_VAR: &str = "MARKPDF_USE_LLM";
/// Environment variable relocating the settings directory (used by tests).
pub const CONFIG_DIR_VAR: &str = "MARKPDF_CONFIG_DIR";

/// Placeholder value shipped in documentation; never a real key.
const PLACEHOLDER_KEY: &str = "your_api_key_here";
const DEFAULT_OUTPUT_DIR: &str = "./output";

/// Immutable configuration for one conversion run.
#[derive(Clone)]
pub struct Settings {
    /// Gemini API credential, forwarded to the converter subprocess.
    pub api_key: String,
    /// Directory the converter writes Markdown into.
    pub output_dir: PathBuf,
    /// Whether to request LLM-assisted (slower, higher-accuracy) conversion.
    pub use_llm: bool,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("output_dir", &self.output_dir)
            .field("use_llm", &self.use_llm)
            .finish()
    }
}

/// On-disk settings, all fields optional so a partial file still loads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_llm: Option<bool>,
}

impl SettingsFile {
    /// Read a settings file, returning defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, MarkpdfError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text =
            std::fs::read_to_string(path).map_err(|e| MarkpdfError::SettingsUnreadable {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
        serde_json::from_str(&text).map_err(|e| MarkpdfError::SettingsUnreadable {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }

    /// Write the settings file, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), MarkpdfError> {
        let write_err = |source: std::io::Error| MarkpdfError::SettingsWriteFailed {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| write_err(std::io::Error::other(e)))?;
        std::fs::write(path, json).map_err(write_err)
    }
}

/// Location of the settings file.
///
/// `MARKPDF_CONFIG_DIR` relocates the whole directory; otherwise the
/// platform config dir is used, falling back to the working directory.
pub fn settings_path() -> PathBuf {
    let root = std::env::var_os(CONFIG_DIR_VAR)
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|d| d.join("markpdf")))
        .unwrap_or_else(|| PathBuf::from("."));
    root.join("config.json")
}

/// Whether a credential value is plausible.
///
/// Rejects empty strings, the documentation placeholder, and anything too
/// short to be a real Gemini key.
pub fn validate_api_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && key != PLACEHOLDER_KEY && key.len() > 10
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Everything the resolver reads from the process environment, captured as
/// plain data so precedence rules stay unit-testable.
#[derive(Debug, Default)]
struct EnvSnapshot {
    api_key: Option<String>,
    output_dir: Option<String>,
    use_llm: Option<String>,
}

impl EnvSnapshot {
    fn capture() -> Self {
        Self {
            api_key: std::env::var(API_KEY_VAR).ok(),
            output_dir: std::env::var(OUTPUT_DIR_VAR).ok(),
            use_llm: std::env::var(USE_LLM_VAR).ok(),
        }
    }
}

/// Merge environment, settings file, and explicit overrides into [`Settings`].
///
/// The credential must already be present in `env` or `file`; interactive
/// acquisition happens in [`load`], not here.
fn resolve(
    env: EnvSnapshot,
    file: SettingsFile,
    output_dir: Option<PathBuf>,
    use_llm: Option<bool>,
) -> Result<Settings, MarkpdfError> {
    // A set-but-empty env credential is an explicit (broken) choice; it is
    // rejected rather than silently falling through to the settings file.
    let api_key = match env.api_key {
        Some(key) => key,
        None => file.api_key.ok_or(MarkpdfError::ApiKeyMissing)?,
    };
    if !validate_api_key(&api_key) {
        return Err(MarkpdfError::ApiKeyInvalid);
    }

    let output_dir = output_dir
        .or_else(|| env.output_dir.map(PathBuf::from))
        .or(file.output_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let use_llm = use_llm
        .or_else(|| env.use_llm.as_deref().map(parse_bool))
        .or(file.use_llm)
        .unwrap_or(true);

    Ok(Settings {
        api_key: api_key.trim().to_string(),
        output_dir,
        use_llm,
    })
}

/// Load the run configuration.
///
/// `output_dir` and `use_llm` are explicit overrides (normally from CLI
/// flags) and win over every other source. When the credential is missing
/// entirely and stdin is attended, the user is prompted once and the key is
/// persisted to the settings file.
pub fn load(
    output_dir: Option<PathBuf>,
    use_llm: Option<bool>,
) -> Result<Settings, MarkpdfError> {
    let path = settings_path();
    let mut file = SettingsFile::load(&path)?;
    let env = EnvSnapshot::capture();

    // Prompt only when no credential exists anywhere. A set-but-empty env
    // var counts as present so it fails validation instead of prompting.
    if env.api_key.is_none() && file.api_key.is_none() && console::user_attended() {
        first_run_setup(&path, &mut file)?;
    }

    resolve(env, file, output_dir, use_llm)
}

/// Interactive first-run setup: prompt for the credential and persist it.
fn first_run_setup(path: &Path, file: &mut SettingsFile) -> Result<(), MarkpdfError> {
    eprintln!();
    eprintln!(
        "{} No API key configured yet.",
        style("First-time setup:").cyan().bold()
    );
    eprintln!("Get your Gemini API key from: https://aistudio.google.com/app/apikey");
    eprintln!();

    let key: String = dialoguer::Input::new()
        .with_prompt("Enter your Gemini API key")
        .interact_text()
        .map_err(|_| MarkpdfError::SetupCancelled)?;
    let key = key.trim().to_string();

    if !validate_api_key(&key) {
        eprintln!("{} Invalid API key provided.", style("✗").red());
        return Err(MarkpdfError::SetupCancelled);
    }

    file.api_key = Some(key);
    file.save(path)?;
    tracing::info!("Stored credential in {}", path.display());
    eprintln!("{} Settings saved to {}", style("✓").green(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(key: Option<&str>) -> EnvSnapshot {
        EnvSnapshot {
            api_key: key.map(String::from),
            output_dir: None,
            use_llm: None,
        }
    }

    #[test]
    fn rejects_empty_key() {
        assert!(!validate_api_key(""));
        assert!(!validate_api_key("   "));
    }

    #[test]
    fn rejects_placeholder_key() {
        assert!(!validate_api_key("your_api_key_here"));
        assert!(!validate_api_key("  your_api_key_here  "));
    }

    #[test]
    fn rejects_implausibly_short_key() {
        assert!(!validate_api_key("AIza12"));
    }

    #[test]
    fn accepts_plausible_key() {
        assert!(validate_api_key("AIzaSyD-abcdefghijklmnop"));
    }

    #[test]
    fn parse_bool_accepts_known_truthy_values() {
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("1"));
        assert!(parse_bool("yes"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("on"));
    }

    #[test]
    fn resolve_fails_without_any_key() {
        let err = resolve(snapshot(None), SettingsFile::default(), None, None)
            .expect_err("missing key must fail");
        assert!(matches!(err, MarkpdfError::ApiKeyMissing));
    }

    #[test]
    fn resolve_fails_on_placeholder_env_key() {
        let err = resolve(
            snapshot(Some("your_api_key_here")),
            SettingsFile::default(),
            None,
            None,
        )
        .expect_err("placeholder key must fail");
        assert!(matches!(err, MarkpdfError::ApiKeyInvalid));
    }

    #[test]
    fn resolve_prefers_env_key_over_file_key() {
        let file = SettingsFile {
            api_key: Some("AIza-file-key-0123456789".into()),
            ..Default::default()
        };
        let settings = resolve(snapshot(Some("AIza-env-key-0123456789")), file, None, None)
            .expect("valid settings");
        assert_eq!(settings.api_key, "AIza-env-key-0123456789");
    }

    #[test]
    fn resolve_rejects_empty_env_key_even_with_file_key() {
        let file = SettingsFile {
            api_key: Some("AIza-file-key-0123456789".into()),
            ..Default::default()
        };
        let err = resolve(snapshot(Some("")), file.clone(), None, None)
            .expect_err("empty env key must not fall through to the file key");
        assert!(matches!(err, MarkpdfError::ApiKeyInvalid));

        let err = resolve(snapshot(Some("   ")), file, None, None)
            .expect_err("whitespace env key must not fall through either");
        assert!(matches!(err, MarkpdfError::ApiKeyInvalid));
    }

    #[test]
    fn resolve_falls_back_to_file_key() {
        let file = SettingsFile {
            api_key: Some("AIza-file-key-0123456789".into()),
            ..Default::default()
        };
        let settings = resolve(snapshot(None), file, None, None).expect("valid settings");
        assert_eq!(settings.api_key, "AIza-file-key-0123456789");
    }

    #[test]
    fn resolve_output_dir_precedence() {
        let file = SettingsFile {
            api_key: Some("AIza-file-key-0123456789".into()),
            output_dir: Some(PathBuf::from("/from/file")),
            use_llm: None,
        };
        let env = EnvSnapshot {
            api_key: None,
            output_dir: Some("/from/env".into()),
            use_llm: None,
        };

        // Explicit override wins over env and file.
        let s = resolve(
            EnvSnapshot {
                output_dir: Some("/from/env".into()),
                ..snapshot(None)
            },
            file.clone(),
            Some(PathBuf::from("/from/flag")),
            None,
        )
        .unwrap();
        assert_eq!(s.output_dir, PathBuf::from("/from/flag"));

        // Env wins over file.
        let s = resolve(env, file.clone(), None, None).unwrap();
        assert_eq!(s.output_dir, PathBuf::from("/from/env"));

        // File wins over the default.
        let s = resolve(snapshot(None), file, None, None).unwrap();
        assert_eq!(s.output_dir, PathBuf::from("/from/file"));
    }

    #[test]
    fn resolve_defaults_apply() {
        let file = SettingsFile {
            api_key: Some("AIza-file-key-0123456789".into()),
            ..Default::default()
        };
        let s = resolve(snapshot(None), file, None, None).unwrap();
        assert_eq!(s.output_dir, PathBuf::from("./output"));
        assert!(s.use_llm);
    }

    #[test]
    fn resolve_use_llm_env_and_override() {
        let file = SettingsFile {
            api_key: Some("AIza-file-key-0123456789".into()),
            ..Default::default()
        };
        let env = EnvSnapshot {
            use_llm: Some("no".into()),
            ..snapshot(None)
        };
        // Env "no" is not a truthy token → false.
        let s = resolve(env, file.clone(), None, None).unwrap();
        assert!(!s.use_llm);

        // Explicit override beats env.
        let env = EnvSnapshot {
            use_llm: Some("false".into()),
            ..snapshot(None)
        };
        let s = resolve(env, file, None, Some(true)).unwrap();
        assert!(s.use_llm);
    }

    #[test]
    fn settings_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let original = SettingsFile {
            api_key: Some("AIza-roundtrip-0123456789".into()),
            output_dir: Some(PathBuf::from("./md")),
            use_llm: Some(false),
        };
        original.save(&path).expect("save");

        let loaded = SettingsFile::load(&path).expect("load");
        assert_eq!(loaded.api_key, original.api_key);
        assert_eq!(loaded.output_dir, original.output_dir);
        assert_eq!(loaded.use_llm, Some(false));
    }

    #[test]
    fn settings_file_missing_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = SettingsFile::load(&dir.path().join("absent.json")).expect("load");
        assert!(loaded.api_key.is_none());
    }

    #[test]
    fn settings_file_garbage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json at all").unwrap();
        let err = SettingsFile::load(&path).expect_err("garbage must fail");
        assert!(matches!(err, MarkpdfError::SettingsUnreadable { .. }));
    }

    #[test]
    fn debug_redacts_credential() {
        let s = Settings {
            api_key: "AIza-super-secret-key".into(),
            output_dir: PathBuf::from("./output"),
            use_llm: true,
        };
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
