// src/lint/report.rs

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::lint::{Diagnostic, Severity};

/// Diagnostics of one file. `path` is relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
    /// Whether `fix` rewrote the file.
    pub fixed: bool,
}

impl FileReport {
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }
}

/// Aggregated lint results across files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintReport {
    pub files: Vec<FileReport>,
}

impl LintReport {
    pub fn push(&mut self, file: FileReport) {
        self.files.push(file);
    }

    pub fn merge(&mut self, other: LintReport) {
        self.files.extend(other.files);
    }

    pub fn error_count(&self) -> usize {
        self.files.iter().map(FileReport::error_count).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.files.iter().map(FileReport::warning_count).sum()
    }

    pub fn files_with_errors(&self) -> usize {
        self.files.iter().filter(|f| f.error_count() > 0).count()
    }

    pub fn fixed_count(&self) -> usize {
        self.files.iter().filter(|f| f.fixed).count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Human-readable report:
    ///
    /// ```text
    /// src/js/app.js:3:5  error  'foo' is not defined.  no-undef
    ///
    /// 1 problem (1 error, 0 warnings)
    /// ```
    ///
    /// Empty when there is nothing to report.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for file in &self.files {
            let path = file.path.to_string_lossy().replace('\\', "/");
            for d in &file.diagnostics {
                let _ = writeln!(
                    out,
                    "{path}:{}:{}  {}  {}  {}",
                    d.line, d.col, d.severity, d.message, d.rule
                );
            }
        }

        let errors = self.error_count();
        let warnings = self.warning_count();
        let total = errors + warnings;
        if total > 0 {
            let _ = writeln!(
                out,
                "\n{total} problem{} ({errors} error{}, {warnings} warning{})",
                plural(total),
                plural(errors),
                plural(warnings)
            );
            let fixable = self
                .files
                .iter()
                .flat_map(|f| f.diagnostics.iter())
                .filter(|d| d.fixable)
                .count();
            if fixable > 0 {
                let _ = writeln!(
                    out,
                    "{fixable} problem{} potentially fixable with `assetpipe fix`",
                    plural(fixable)
                );
            }
        }
        out
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
