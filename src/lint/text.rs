// src/lint/text.rs

//! Line-level rules shared by every language.

use std::collections::HashSet;

use crate::lint::Diagnostic;

/// Lines (1-based) whose end lies inside a multi-line literal; their
/// trailing whitespace is content, not style.
pub type ProtectedLines = HashSet<usize>;

fn lines(src: &str) -> impl Iterator<Item = (usize, &str)> {
    src.split('\n')
        .enumerate()
        .map(|(i, l)| (i + 1, l.strip_suffix('\r').unwrap_or(l)))
}

pub fn trailing_spaces(src: &str, protected: &ProtectedLines) -> Vec<Diagnostic> {
    lines(src)
        .filter(|(n, _)| !protected.contains(n))
        .filter_map(|(n, line)| {
            let trimmed = line.trim_end_matches([' ', '\t']);
            (trimmed.len() != line.len()).then(|| {
                Diagnostic::warning(
                    "no-trailing-spaces",
                    n,
                    trimmed.chars().count() + 1,
                    "Trailing spaces not allowed.",
                )
                .fixable()
            })
        })
        .collect()
}

pub fn eol_last(src: &str) -> Vec<Diagnostic> {
    if src.is_empty() || src.ends_with('\n') {
        return Vec::new();
    }
    let line = src.matches('\n').count() + 1;
    let last = src.rsplit('\n').next().unwrap_or_default();
    vec![
        Diagnostic::warning(
            "eol-last",
            line,
            last.chars().count() + 1,
            "Newline required at end of file but not found.",
        )
        .fixable(),
    ]
}

/// Runs of more than `max` blank lines, reported at the first extra line.
pub fn multiple_empty_lines(src: &str, max: usize, protected: &ProtectedLines) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    let mut run = 0usize;
    let all: Vec<(usize, &str)> = lines(src).collect();
    // A trailing '\n' produces one empty pseudo-line that is not a blank line.
    let count = if src.ends_with('\n') { all.len() - 1 } else { all.len() };

    for &(n, line) in all.iter().take(count) {
        if line.trim().is_empty() && !protected.contains(&n) {
            run += 1;
            if run == max + 1 {
                let plural = if max == 1 { "" } else { "s" };
                diags.push(
                    Diagnostic::warning(
                        "no-multiple-empty-lines",
                        n,
                        1,
                        format!("More than {max} blank line{plural} not allowed."),
                    )
                    .fixable(),
                );
            }
        } else {
            run = 0;
        }
    }
    diags
}

/// Trim trailing whitespace, optionally squeeze blank-line runs down to
/// `max_blank`, and end the file with a newline. Line endings are kept.
pub fn fix_lines(src: &str, protected: &ProtectedLines, max_blank: Option<usize>) -> String {
    if src.is_empty() {
        return String::new();
    }
    let crlf = src.contains("\r\n");
    let newline = if crlf { "\r\n" } else { "\n" };

    let mut body: Vec<(usize, &str)> = lines(src).collect();
    if src.ends_with('\n') {
        body.pop();
    }

    let mut out: Vec<&str> = Vec::with_capacity(body.len());
    let mut run = 0usize;
    for (n, line) in body {
        if protected.contains(&n) {
            out.push(line);
            run = 0;
            continue;
        }
        let trimmed = line.trim_end_matches([' ', '\t']);
        if trimmed.trim().is_empty() {
            run += 1;
            if max_blank.is_some_and(|max| run > max) {
                continue;
            }
            out.push("");
        } else {
            run = 0;
            out.push(trimmed);
        }
    }

    let mut fixed = out.join(newline);
    fixed.push_str(newline);
    fixed
}
