// src/transform/downlevel.rs

//! Rewrite newer script syntax into ES5 forms for older browsers:
//!
//! - `let` / `const` declarations become `var`
//! - arrow functions become `function` expressions, with `.bind(this)`
//!   when the body uses `this`
//! - untagged template literals become `"...".concat(...)` calls
//!
//! Arrows whose body mentions `arguments` are left as they are, since a
//! plain function would rebind it. Block scoping of `let` inside loops,
//! classes, destructuring, spread and default parameters pass through.

use crate::transform::js_lexer::{
    LexError, Token, TokenKind, is_keyword, matching_close, matching_open, significant,
    skip_expression, tokenize,
};

/// Edits are applied in `(start, rank)` order; at one offset, closing
/// inserts go first (innermost arrow first), then everything else
/// (outermost arrow first).
#[derive(Debug)]
struct Edit {
    start: usize,
    end: usize,
    rank: (u8, isize),
    text: String,
}

impl Edit {
    fn replace(start: usize, end: usize, order: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            rank: (1, order as isize),
            text: text.into(),
        }
    }

    fn close(at: usize, order: usize, text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            rank: (0, -(order as isize)),
            text: text.into(),
        }
    }
}

pub fn downlevel(src: &str) -> Result<String, LexError> {
    let tokens = tokenize(src)?;
    let sig = significant(&tokens);
    let mut edits = Vec::new();

    for (k, tok) in sig.iter().enumerate() {
        let prev = if k > 0 { sig.get(k - 1) } else { None };
        let after_dot = prev.is_some_and(|p| p.is_punct(".") || p.is_punct("?."));

        match tok.kind {
            TokenKind::Ident if after_dot => {}
            TokenKind::Ident if tok.text == "const" || tok.text == "let" => {
                if is_declaration(&sig, k) {
                    edits.push(Edit::replace(tok.start, tok.end(), k, "var"));
                }
            }
            TokenKind::Template if !is_tagged(prev) => {
                edits.push(Edit::replace(tok.start, tok.end(), k, template_to_concat(tok.text)?));
            }
            TokenKind::Punct if tok.text == "=>" => lower_arrow(&sig, k, &mut edits),
            _ => {}
        }
    }

    edits.sort_by_key(|e| (e.start, e.rank));
    let mut out = String::with_capacity(src.len() + edits.len() * 8);
    let mut cursor = 0usize;
    for edit in edits {
        if edit.start < cursor {
            continue;
        }
        out.push_str(&src[cursor..edit.start]);
        out.push_str(&edit.text);
        cursor = edit.end;
    }
    out.push_str(&src[cursor..]);
    Ok(out)
}

fn is_declaration(sig: &[Token<'_>], k: usize) -> bool {
    let Some(next) = sig.get(k + 1) else {
        return false;
    };
    if sig[k].text == "const" {
        return !next.is_punct(":");
    }
    (next.kind == TokenKind::Ident && !matches!(next.text, "in" | "instanceof"))
        || next.is_punct("[")
        || next.is_punct("{")
}

fn is_tagged(prev: Option<&Token<'_>>) -> bool {
    prev.is_some_and(|p| {
        (p.kind == TokenKind::Ident && !is_keyword(p.text))
            || p.is_punct(")")
            || p.is_punct("]")
            || p.kind == TokenKind::Template
    })
}

fn lower_arrow(sig: &[Token<'_>], k: usize, edits: &mut Vec<Edit>) {
    let param_end = k.checked_sub(1).and_then(|i| sig.get(i));
    let (Some(param_end), Some(body)) = (param_end, sig.get(k + 1)) else {
        return;
    };
    let block = body.is_punct("{");

    let last = if block {
        match matching_close(sig, k + 1) {
            Some(close) => close,
            None => return,
        }
    } else {
        let stop = skip_expression(sig, k + 1);
        if stop <= k + 1 {
            return;
        }
        stop - 1
    };

    let body_tokens = &sig[k + 1..=last];
    let mentions = |word: &str| {
        body_tokens.iter().enumerate().any(|(i, t)| {
            let after_dot = i > 0 && body_tokens[i - 1].is_punct(".");
            (t.is_ident(word) && !after_dot)
                || (t.kind == TokenKind::Template && t.text.contains(word))
        })
    };
    if mentions("arguments") {
        return;
    }

    let open_body = if block { " " } else { " { return " };
    if param_end.is_punct(")") {
        let Some(open) = matching_open(sig, k - 1) else {
            return;
        };
        edits.push(Edit::replace(sig[open].start, sig[open].start, k, "function "));
        edits.push(Edit::replace(param_end.end(), body.start, k, open_body));
    } else if param_end.kind == TokenKind::Ident && !is_keyword(param_end.text) {
        edits.push(Edit::replace(
            param_end.start,
            body.start,
            k,
            format!("function ({}){open_body}", param_end.text),
        ));
    } else {
        return;
    }

    let mut close = String::new();
    if !block {
        close.push_str("; }");
    }
    if mentions("this") {
        close.push_str(".bind(this)");
    }
    if !close.is_empty() {
        edits.push(Edit::close(sig[last].end(), k, close));
    }
}

/// `` `a ${b} c` `` -> `"a ".concat(b, " c")`.
fn template_to_concat(text: &str) -> Result<String, LexError> {
    let inner = text
        .strip_prefix('`')
        .and_then(|t| t.strip_suffix('`'))
        .unwrap_or(text);

    let mut quasis = vec![String::new()];
    let mut exprs = Vec::new();
    let mut chars = inner.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, '\r')) => {
                    chars.next_if(|(_, n)| *n == '\n');
                }
                Some((_, next)) => push_escaped(last_quasi(&mut quasis), next),
                None => {}
            },
            '$' if chars.peek().is_some_and(|(_, n)| *n == '{') => {
                chars.next();
                let start = i + 2;
                let end = substitution_end(inner, start);
                exprs.push(downlevel(&inner[start..end])?);
                while chars.peek().is_some_and(|(j, _)| *j <= end) {
                    chars.next();
                }
                quasis.push(String::new());
            }
            '"' => last_quasi(&mut quasis).push_str("\\\""),
            '\n' => last_quasi(&mut quasis).push_str("\\n"),
            '\r' => last_quasi(&mut quasis).push_str("\\r"),
            '\u{2028}' => last_quasi(&mut quasis).push_str("\\u2028"),
            '\u{2029}' => last_quasi(&mut quasis).push_str("\\u2029"),
            c => last_quasi(&mut quasis).push(c),
        }
    }

    let mut out = format!("\"{}\"", quasis[0]);
    if exprs.is_empty() {
        return Ok(out);
    }
    let mut args = Vec::new();
    for (expr, quasi) in exprs.iter().zip(quasis.iter().skip(1)) {
        let expr = expr.trim();
        if expr.contains(',') {
            args.push(format!("({expr})"));
        } else {
            args.push(expr.to_string());
        }
        if !quasi.is_empty() {
            args.push(format!("\"{quasi}\""));
        }
    }
    out.push_str(&format!(".concat({})", args.join(", ")));
    Ok(out)
}

fn last_quasi(quasis: &mut Vec<String>) -> &mut String {
    if quasis.is_empty() {
        quasis.push(String::new());
    }
    let last = quasis.len() - 1;
    &mut quasis[last]
}

/// Escapes that mean the same inside double quotes are kept; the
/// template-only ones are unwrapped.
fn push_escaped(quasi: &mut String, next: char) {
    match next {
        '`' | '$' => quasi.push(next),
        '\n' => {}
        _ => {
            quasi.push('\\');
            quasi.push(next);
        }
    }
}

/// Offset of the `}` closing a substitution whose body starts at `from`.
fn substitution_end(text: &str, from: usize) -> usize {
    let bytes = text.as_bytes();
    let mut depth = 1usize;
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'\'' | b'"' => i = skip_quoted(text, i),
            b'`' => i = skip_template(text, i),
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// Offset of the closing quote of the string starting at `start`.
fn skip_quoted(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() && bytes[i] != quote {
        if bytes[i] == b'\\' {
            i += 1;
        }
        i += 1;
    }
    i
}

/// Offset of the closing backtick of the nested template starting at `start`.
fn skip_template(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'`' => return i,
            b'$' if bytes.get(i + 1) == Some(&b'{') => i = substitution_end(text, i + 2),
            _ => {}
        }
        i += 1;
    }
    i
}
