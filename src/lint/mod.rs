// src/lint/mod.rs

//! Static checks for scripts and stylesheets.
//!
//! Each language has a fixed rule set (see [`js`] and [`style`]); rules
//! report [`Diagnostic`]s and some of them can rewrite the source.

pub mod js;
pub mod report;
pub mod style;
pub mod text;

use std::fmt;
use std::path::Path;

pub use report::{FileReport, LintReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// One rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub col: usize,
    pub severity: Severity,
    pub message: String,
    pub rule: &'static str,
    /// Whether `fix` corrects it.
    pub fixable: bool,
}

impl Diagnostic {
    pub fn error(rule: &'static str, line: usize, col: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            col,
            severity: Severity::Error,
            message: message.into(),
            rule,
            fixable: false,
        }
    }

    pub fn warning(rule: &'static str, line: usize, col: usize, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(rule, line, col, message)
        }
    }

    pub fn fixable(mut self) -> Self {
        self.fixable = true;
        self
    }
}

/// Which rule set applies to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Script,
    Style,
}

impl Language {
    pub fn for_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "js" | "mjs" | "cjs" => Some(Language::Script),
            "css" | "scss" => Some(Language::Style),
            _ => None,
        }
    }
}

/// Run every rule of `lang` over `src`, sorted by position.
pub fn check(lang: Language, src: &str) -> Vec<Diagnostic> {
    let mut diags = match lang {
        Language::Script => js::check(src),
        Language::Style => style::check(src),
    };
    diags.sort_by_key(|d| (d.line, d.col));
    diags
}

/// Apply every automatic fix of `lang` to `src`.
pub fn fix(lang: Language, src: &str) -> String {
    match lang {
        Language::Script => js::fix(src),
        Language::Style => style::fix(src),
    }
}

/// 1-based line and column (in characters) of byte `offset`.
pub fn line_col(src: &str, offset: usize) -> (usize, usize) {
    let before = &src[..offset.min(src.len())];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let col = before[line_start..].chars().count() + 1;
    (line, col)
}
