//! Per-run result accumulation and summary rendering.
//!
//! [`RunSummary`] is pure bookkeeping: counters and ordered lists, mutated
//! once per file and discarded after printing. Rendering goes through an
//! explicitly passed [`console::Term`] handle so callers (and tests) decide
//! where output lands — there is no module-global console state.

use crate::error::ConversionError;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::{style, Term};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Aggregated outcome of one conversion run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Number of files attempted.
    pub total: usize,
    /// Files converted successfully.
    pub success: usize,
    /// Files that failed conversion.
    pub failed: usize,
    /// Produced Markdown paths, in processing order.
    pub outputs: Vec<PathBuf>,
    /// Failed inputs with their error text, in processing order.
    pub failures: Vec<(PathBuf, String)>,
    /// Wall-clock time for the whole run.
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record_success(&mut self, output: PathBuf) {
        self.success += 1;
        self.outputs.push(output);
    }

    pub fn record_failure(&mut self, input: &Path, error: &ConversionError) {
        self.failed += 1;
        self.failures.push((input.to_path_buf(), error.to_string()));
    }

    /// True when at least one file converted.
    pub fn any_succeeded(&self) -> bool {
        self.success > 0
    }

    /// Render the summary table plus output/failure lists.
    pub fn display(&self, term: &Term) {
        let w = |line: &str| {
            term.write_line(line).ok();
        };

        w("");
        w(&format!(
            "{} {}",
            style("📊").cyan(),
            style("Processing Summary").white().bold()
        ));
        w(&format!("{}", style("─".repeat(50)).dim()));
        w("");

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.add_row(vec![Cell::new("Total files"), Cell::new(self.total)]);
        table.add_row(vec![
            Cell::new("Successful"),
            Cell::new(self.success)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("Failed"),
            Cell::new(self.failed).fg(if self.failed == 0 {
                Color::White
            } else {
                Color::Red
            }),
        ]);
        table.add_row(vec![
            Cell::new("Time"),
            Cell::new(format_elapsed(self.elapsed)),
        ]);
        for line in table.to_string().lines() {
            w(line);
        }

        if !self.outputs.is_empty() {
            w("");
            w(&format!("{}", style("Output files:").green().bold()));
            for output in &self.outputs {
                w(&format!("   📄 {}", output.display()));
            }
        }

        if !self.failures.is_empty() {
            w("");
            w(&format!("{}", style("Failed files:").red().bold()));
            for (input, error) in &self.failures {
                let name = input
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| input.display().to_string());
                w(&format!("   • {name}"));
                w(&format!("     {}", style(error).dim()));
            }
        }
        w("");
    }
}

/// Render the pre-run file listing: index, name, size.
pub fn display_files(term: &Term, files: &[PathBuf]) {
    let w = |line: &str| {
        term.write_line(line).ok();
    };

    w("");
    w(&format!(
        "{} {}",
        style("📋 Files to process:").bold(),
        files.len()
    ));
    w("");

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Filename").add_attribute(Attribute::Bold),
        Cell::new("Size").add_attribute(Attribute::Bold),
    ]);
    for (idx, file) in files.iter().enumerate() {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());
        let size = crate::validate::file_size(file)
            .map(crate::validate::format_size)
            .unwrap_or_else(|| "?".to_string());
        table.add_row(vec![
            Cell::new(idx + 1).fg(Color::DarkGrey),
            Cell::new(name).fg(Color::Cyan),
            Cell::new(size).fg(Color::Yellow),
        ]);
    }
    for line in table.to_string().lines() {
        w(line);
    }
    w("");
}

/// Format a wall-clock duration as `3m 12s` (or `45s` under a minute).
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
