//! Progress-callback trait for converter status events.
//!
//! The external converter chats on stdout/stderr while it works. The invoker
//! forwards those lines (trimmed, truncated, best-effort) to a
//! [`ConvertProgress`] implementation. The CLI wraps an indicatif spinner
//! around it; a host application can drive a log or nothing at all. The
//! trait is `Send + Sync` because the invoker reads the child's stdout and
//! stderr from two tasks.

use std::sync::Arc;

/// Receives status events while one PDF is being converted.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConvertProgress: Send + Sync {
    /// Called just before the converter subprocess is spawned.
    fn on_start(&self, pdf_name: &str) {
        let _ = pdf_name;
    }

    /// Called for each non-empty line the converter prints.
    ///
    /// `message` is an opportunistic, human-readable status string. It is
    /// never structured data and may arrive in any order relative to the
    /// converter's actual internal state.
    fn on_status(&self, message: &str) {
        let _ = message;
    }

    /// Called once after the converter exits, successfully or not.
    fn on_finish(&self, pdf_name: &str, success: bool) {
        let _ = (pdf_name, success);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl ConvertProgress for NoopProgress {}

/// Convenience alias for a shared progress callback.
pub type ProgressSink = Arc<dyn ConvertProgress>;
