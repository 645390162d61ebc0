// src/lint/js.rs

//! Script rules: `no-undef`, `no-debugger`, `eqeqeq`, plus the shared
//! line rules and `no-multiple-empty-lines` (max 1).
//!
//! Scoping is file-level: a name declared anywhere in the file (or in a
//! `/* global name */` comment) counts as declared everywhere in it.

use std::collections::HashSet;

use crate::lint::text::{self, ProtectedLines};
use crate::lint::Diagnostic;
use crate::transform::js_lexer::{
    LexError, Token, TokenKind, declarators, is_keyword, matching_close, matching_open,
    pattern_bindings, significant, tokenize,
};

/// Browser and CommonJS globals.
const KNOWN_GLOBALS: &[&str] = &[
    "AbortController", "Array", "ArrayBuffer", "Audio", "BigInt", "Blob", "Boolean", "Buffer",
    "CustomEvent", "DataView", "Date", "Document", "DOMParser", "Element", "Error", "Event",
    "EventSource", "EvalError", "File", "FileReader", "Float32Array", "Float64Array", "FormData",
    "Function", "Headers", "HTMLElement", "Image", "Infinity", "Int16Array", "Int32Array",
    "Int8Array", "IntersectionObserver", "Intl", "JSON", "KeyboardEvent", "Map", "Math",
    "MouseEvent", "MutationObserver", "NaN", "Node", "NodeList", "Number", "Object", "Promise",
    "Proxy", "RangeError", "ReferenceError", "Reflect", "RegExp", "Request", "ResizeObserver",
    "Response", "Set", "String", "Symbol", "SyntaxError", "TextDecoder", "TextEncoder",
    "TypeError", "URIError", "URL", "URLSearchParams", "Uint16Array", "Uint32Array", "Uint8Array",
    "Uint8ClampedArray", "WeakMap", "WeakSet", "WebSocket", "Worker", "XMLHttpRequest",
    "__dirname", "__filename", "alert", "arguments", "atob", "btoa", "cancelAnimationFrame",
    "clearInterval", "clearTimeout", "confirm", "console", "crypto", "decodeURI",
    "decodeURIComponent", "document", "encodeURI", "encodeURIComponent", "exports", "fetch",
    "getComputedStyle", "globalThis", "history", "isFinite", "isNaN", "localStorage",
    "location", "matchMedia", "module", "navigator", "parseFloat", "parseInt", "performance",
    "process", "prompt", "queueMicrotask", "require", "requestAnimationFrame", "screen",
    "self", "sessionStorage", "setInterval", "setTimeout", "structuredClone", "undefined",
    "window",
];

pub fn check(src: &str) -> Vec<Diagnostic> {
    let tokens = match tokenize(src) {
        Ok(tokens) => tokens,
        Err(e) => return vec![parse_error(&e)],
    };
    let sig = significant(&tokens);
    let protected = protected_lines(&tokens);

    let mut diags = no_undef(&tokens, &sig);
    diags.extend(no_debugger(&sig));
    diags.extend(eqeqeq(&sig));
    diags.extend(text::trailing_spaces(src, &protected));
    diags.extend(text::multiple_empty_lines(src, 1, &protected));
    diags.extend(text::eol_last(src));
    diags
}

/// Remove `debugger` statements, then apply the line fixes. A file that
/// does not tokenize is returned unchanged.
pub fn fix(src: &str) -> String {
    let Ok(tokens) = tokenize(src) else {
        return src.to_string();
    };
    let without_debugger = remove_debugger(src, &tokens);

    let protected = tokenize(&without_debugger)
        .map(|t| protected_lines(&t))
        .unwrap_or_default();
    text::fix_lines(&without_debugger, &protected, Some(1))
}

fn parse_error(e: &LexError) -> Diagnostic {
    Diagnostic::error("parse", e.line, e.col, format!("Parsing error: {}", e.message))
}

fn protected_lines(tokens: &[Token<'_>]) -> ProtectedLines {
    let mut lines = ProtectedLines::new();
    for tok in tokens {
        if matches!(tok.kind, TokenKind::Template | TokenKind::Str) {
            lines.extend(tok.line..tok.end_line());
        }
    }
    lines
}

fn after_dot(sig: &[Token<'_>], i: usize) -> bool {
    i > 0 && (sig[i - 1].is_punct(".") || sig[i - 1].is_punct("?."))
}

fn no_debugger(sig: &[Token<'_>]) -> Vec<Diagnostic> {
    sig.iter()
        .enumerate()
        .filter(|(i, t)| t.is_ident("debugger") && !after_dot(sig, *i))
        .map(|(_, t)| {
            Diagnostic::error("no-debugger", t.line, t.col, "Unexpected 'debugger' statement.")
                .fixable()
        })
        .collect()
}

fn eqeqeq(sig: &[Token<'_>]) -> Vec<Diagnostic> {
    sig.iter()
        .filter(|t| t.is_punct("==") || t.is_punct("!="))
        .map(|t| {
            Diagnostic::warning(
                "eqeqeq",
                t.line,
                t.col,
                format!("Expected '{}=' and instead saw '{}'.", t.text, t.text),
            )
        })
        .collect()
}

/// Names from `/* global a, b:writable */` comments.
fn comment_globals<'a>(tokens: &[Token<'a>]) -> Vec<&'a str> {
    let mut out = Vec::new();
    for tok in tokens.iter().filter(|t| t.kind == TokenKind::BlockComment) {
        let body = tok.text[2..tok.text.len() - 2].trim();
        let rest = body
            .strip_prefix("globals")
            .or_else(|| body.strip_prefix("global"));
        let Some(rest) = rest.filter(|r| r.starts_with(char::is_whitespace)) else {
            continue;
        };
        for item in rest.split(',') {
            let name = item.split(':').next().unwrap_or_default().trim();
            if !name.is_empty() {
                out.push(name);
            }
        }
    }
    out
}

struct Scope<'a> {
    declared: HashSet<&'a str>,
    /// Significant-token indices that are names but not references.
    not_refs: HashSet<usize>,
}

fn collect_declarations<'a>(tokens: &[Token<'a>], sig: &[Token<'a>]) -> Scope<'a> {
    let mut declared: HashSet<&'a str> = comment_globals(tokens).into_iter().collect();
    let mut not_refs = HashSet::new();
    let declare = |idxs: Vec<usize>, declared: &mut HashSet<&'a str>| {
        for i in idxs {
            declared.insert(sig[i].text);
        }
    };

    for i in 0..sig.len() {
        let tok = sig[i];

        if tok.is_punct("=>") && i > 0 {
            let prev = sig[i - 1];
            if prev.kind == TokenKind::Ident && !is_keyword(prev.text) {
                declared.insert(prev.text);
            } else if prev.is_punct(")") {
                if let Some(open) = matching_open(sig, i - 1) {
                    declare(pattern_bindings(sig, open + 1, i - 1), &mut declared);
                }
            }
            continue;
        }

        if tok.kind != TokenKind::Ident || after_dot(sig, i) {
            continue;
        }

        match tok.text {
            "var" | "let" | "const" => {
                let (names, _) = declarators(sig, i);
                declare(names, &mut declared);
            }
            "function" => {
                let mut j = i + 1;
                if sig.get(j).is_some_and(|t| t.is_punct("*")) {
                    j += 1;
                }
                if let Some(name) = sig.get(j).filter(|t| t.kind == TokenKind::Ident) {
                    declared.insert(name.text);
                    not_refs.insert(j);
                    j += 1;
                }
                if sig.get(j).is_some_and(|t| t.is_punct("(")) {
                    if let Some(close) = matching_close(sig, j) {
                        declare(pattern_bindings(sig, j + 1, close), &mut declared);
                    }
                }
            }
            "class" => {
                if let Some(name) = sig
                    .get(i + 1)
                    .filter(|t| t.kind == TokenKind::Ident && !is_keyword(t.text))
                {
                    declared.insert(name.text);
                }
                mark_class_members(sig, i, &mut not_refs);
            }
            "catch" => {
                if sig.get(i + 1).is_some_and(|t| t.is_punct("(")) {
                    if let Some(close) = matching_close(sig, i + 1) {
                        declare(pattern_bindings(sig, i + 2, close), &mut declared);
                    }
                }
            }
            "import" => {
                if sig.get(i + 1).is_some_and(|t| t.is_punct("(") || t.is_punct(".")) {
                    continue;
                }
                let mut j = i + 1;
                while let Some(t) = sig.get(j) {
                    if t.kind == TokenKind::Str || t.is_punct(";") {
                        break;
                    }
                    if t.kind == TokenKind::Ident {
                        not_refs.insert(j);
                        let aliased = sig.get(j + 1).is_some_and(|n| n.is_ident("as"));
                        if !aliased && !is_keyword(t.text) {
                            declared.insert(t.text);
                        }
                    }
                    j += 1;
                }
            }
            "export" => {
                // `export { a } from '...'` names are not local.
                if sig.get(i + 1).is_some_and(|t| t.is_punct("{")) {
                    if let Some(close) = matching_close(sig, i + 1) {
                        if sig.get(close + 1).is_some_and(|t| t.is_ident("from")) {
                            not_refs.extend(i + 2..close);
                        }
                    }
                }
            }
            _ => {
                // Method definition: `name(params) {`.
                if is_keyword(tok.text) || !sig.get(i + 1).is_some_and(|t| t.is_punct("(")) {
                    continue;
                }
                if let Some(close) = matching_close(sig, i + 1) {
                    if sig.get(close + 1).is_some_and(|t| t.is_punct("{")) {
                        not_refs.insert(i);
                        declare(pattern_bindings(sig, i + 2, close), &mut declared);
                    }
                }
            }
        }
    }

    Scope { declared, not_refs }
}

/// Field and method names directly inside a class body.
fn mark_class_members(sig: &[Token<'_>], class_idx: usize, not_refs: &mut HashSet<usize>) {
    let Some(open) = (class_idx + 1..sig.len()).find(|&j| sig[j].is_punct("{")) else {
        return;
    };
    let Some(close) = matching_close(sig, open) else {
        return;
    };

    let mut j = open + 1;
    while j < close {
        let tok = sig[j];
        if tok.is_punct("{") || tok.is_punct("(") || tok.is_punct("[") {
            j = matching_close(sig, j).map(|c| c + 1).unwrap_or(close);
            continue;
        }
        if tok.kind == TokenKind::Ident
            && sig
                .get(j + 1)
                .is_some_and(|n| n.is_punct("=") || n.is_punct(";") || n.is_punct("("))
        {
            not_refs.insert(j);
        }
        j += 1;
    }
}

fn no_undef(tokens: &[Token<'_>], sig: &[Token<'_>]) -> Vec<Diagnostic> {
    let scope = collect_declarations(tokens, sig);
    let mut diags = Vec::new();

    for (i, tok) in sig.iter().enumerate() {
        if tok.kind != TokenKind::Ident
            || is_keyword(tok.text)
            || after_dot(sig, i)
            || scope.not_refs.contains(&i)
            || scope.declared.contains(tok.text)
            || KNOWN_GLOBALS.contains(&tok.text)
        {
            continue;
        }

        let prev = if i > 0 { sig.get(i - 1) } else { None };
        let next = sig.get(i + 1);

        if next.is_some_and(|n| n.is_punct(":")) {
            // Object key or label.
            let keyish = match prev {
                None => true,
                Some(p) => p.is_punct("{") || p.is_punct(",") || p.is_punct(";") || p.is_punct("}"),
            };
            if keyish {
                continue;
            }
        }
        if prev.is_some_and(|p| {
            p.is_ident("typeof") || p.is_ident("break") || p.is_ident("continue") || p.is_ident("as")
        }) {
            continue;
        }

        diags.push(Diagnostic::error(
            "no-undef",
            tok.line,
            tok.col,
            format!("'{}' is not defined.", tok.text),
        ));
    }
    diags
}

/// Delete `debugger` statements; a statement alone on its line takes the
/// whole line with it. One that is the body of a braceless `if`/`else`/loop
/// is replaced by `;` so the following statement keeps its meaning.
fn remove_debugger(src: &str, tokens: &[Token<'_>]) -> String {
    let sig_idx: Vec<usize> = (0..tokens.len()).filter(|&i| !tokens[i].is_trivia()).collect();
    let mut edits: Vec<(usize, usize, &str)> = Vec::new();

    for (s, &ti) in sig_idx.iter().enumerate() {
        let tok = tokens[ti];
        if !tok.is_ident("debugger") {
            continue;
        }
        let prev = if s > 0 { Some(tokens[sig_idx[s - 1]]) } else { None };
        if prev.is_some_and(|p| p.is_punct(".") || p.is_punct("?.")) {
            continue;
        }
        let mut end = tok.end();
        if let Some(&next) = sig_idx.get(s + 1) {
            if tokens[next].is_punct(";") {
                end = tokens[next].end();
            }
        }
        let start = tok.start;

        if let Some(prev) = prev.filter(|p| p.precedes_statement_body()) {
            if src[prev.end()..start].trim().is_empty() {
                edits.push((prev.end(), end, ";"));
            } else {
                edits.push((start, end, ";"));
            }
            continue;
        }

        let line_start = src[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line_end = src[end..].find('\n').map(|i| end + i + 1).unwrap_or(src.len());
        if src[line_start..start].trim().is_empty() && src[end..line_end].trim().is_empty() {
            edits.push((line_start, line_end, ""));
        } else {
            edits.push((start, end, ""));
        }
    }

    let mut out = String::with_capacity(src.len());
    let mut cursor = 0;
    for (start, end, replacement) in edits {
        if start < cursor {
            continue;
        }
        out.push_str(&src[cursor..start]);
        out.push_str(replacement);
        cursor = end;
    }
    out.push_str(&src[cursor..]);
    out
}
