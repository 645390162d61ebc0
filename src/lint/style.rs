// src/lint/style.rs

//! Stylesheet rules for `.css` and `.scss` sources.

use std::sync::LazyLock;

use regex::Regex;

use crate::lint::text::{self, ProtectedLines};
use crate::lint::{Diagnostic, line_col};

// Literal patterns; a typo fails the first lint of any stylesheet.
static EMPTY_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\s*\}").expect("empty block pattern"));
static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[0-9a-fA-F]{3,8}\b").expect("hex color pattern"));
static IMPORTANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\s*important").expect("important pattern"));

pub fn check(src: &str) -> Vec<Diagnostic> {
    let masked = mask(src);
    let mut diags = Vec::new();

    for m in EMPTY_BLOCK.find_iter(&masked) {
        let (line, col) = line_col(src, m.start());
        diags.push(Diagnostic::error("block-no-empty", line, col, "Unexpected empty block"));
    }

    for (start, end) in uppercase_hex_colors(&masked) {
        let (line, col) = line_col(src, start);
        let found = &src[start..end];
        diags.push(
            Diagnostic::warning(
                "color-hex-case",
                line,
                col,
                format!("Expected \"{found}\" to be \"{}\"", found.to_ascii_lowercase()),
            )
            .fixable(),
        );
    }

    for m in IMPORTANT.find_iter(&masked) {
        let (line, col) = line_col(src, m.start());
        diags.push(Diagnostic::warning(
            "declaration-no-important",
            line,
            col,
            "Unexpected !important",
        ));
    }

    let protected = ProtectedLines::new();
    diags.extend(text::trailing_spaces(src, &protected));
    diags.extend(text::eol_last(src));
    diags
}

/// Lowercase hex colors, then apply the line fixes.
pub fn fix(src: &str) -> String {
    let masked = mask(src);
    let mut out = src.to_string();
    for (start, end) in uppercase_hex_colors(&masked) {
        let lower = src[start..end].to_ascii_lowercase();
        out.replace_range(start..end, &lower);
    }
    text::fix_lines(&out, &ProtectedLines::new(), None)
}

/// Byte ranges of hex colors with uppercase digits that sit in a
/// declaration value (not an `#Id` selector).
fn uppercase_hex_colors(masked: &str) -> Vec<(usize, usize)> {
    HEX_COLOR
        .find_iter(masked)
        .filter(|m| m.as_str().chars().any(|c| c.is_ascii_uppercase()))
        .filter(|m| in_declaration(masked, m.start(), m.end()))
        .map(|m| (m.start(), m.end()))
        .collect()
}

fn in_declaration(masked: &str, start: usize, end: usize) -> bool {
    let before = &masked[..start];
    let stmt_start = before.rfind(['{', ';', '}']).map(|i| i + 1).unwrap_or(0);
    if !before[stmt_start..].contains(':') {
        return false;
    }
    let after = &masked[end..];
    !matches!(after.find(['{', ';', '}']).map(|i| &after[i..i + 1]), Some("{"))
}

/// Replace comments, strings and `url(...)` bodies with spaces, keeping
/// byte offsets and newlines.
fn mask(src: &str) -> String {
    let bytes = src.as_bytes();
    let mut out = bytes.to_vec();
    let mut i = 0;

    let blank = |out: &mut Vec<u8>, from: usize, to: usize| {
        for b in out.iter_mut().take(to).skip(from) {
            if *b != b'\n' {
                *b = b' ';
            }
        }
    };

    while i < bytes.len() {
        let rest = &bytes[i..];
        if rest.starts_with(b"/*") {
            let end = find_from(bytes, i + 2, b"*/").map(|p| p + 2).unwrap_or(bytes.len());
            blank(&mut out, i, end);
            i = end;
        } else if rest.starts_with(b"//") && (i == 0 || bytes[i - 1] != b':') {
            let end = find_from(bytes, i, b"\n").unwrap_or(bytes.len());
            blank(&mut out, i, end);
            i = end;
        } else if bytes[i] == b'"' || bytes[i] == b'\'' {
            let quote = bytes[i];
            let mut j = i + 1;
            while j < bytes.len() && bytes[j] != quote && bytes[j] != b'\n' {
                if bytes[j] == b'\\' {
                    j += 1;
                }
                j += 1;
            }
            let end = (j + 1).min(bytes.len());
            blank(&mut out, i + 1, end.saturating_sub(1).max(i + 1));
            i = end;
        } else if rest.len() >= 4 && rest[..4].eq_ignore_ascii_case(b"url(") {
            let end = find_from(bytes, i + 4, b")").unwrap_or(bytes.len());
            blank(&mut out, i + 4, end);
            i = end;
        } else {
            i += 1;
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn find_from(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p)
}
