// src/transform/js_minify.rs

use crate::transform::js_lexer::{LexError, Token, TokenKind, matching_close, tokenize};

/// Production pass over a script: drop comments, `debugger` statements and
/// `console.*(...)` calls, strip indentation and blank lines.
///
/// A `debugger` that is the whole body of a braceless `if`/`else`/loop
/// becomes an empty statement.
///
/// Line breaks between statements are kept (one per line) so automatic
/// semicolon insertion still sees them.
pub fn minify_js(src: &str) -> Result<String, LexError> {
    let tokens = tokenize(src)?;
    let stripped = strip_debug(&tokens);
    Ok(squeeze(&stripped))
}

enum Piece<'a> {
    Tok(Token<'a>),
    Text(&'static str),
}

/// Remove debugging statements from a token stream.
fn strip_debug<'a>(tokens: &[Token<'a>]) -> Vec<Piece<'a>> {
    // Indices of significant tokens, to look ahead past trivia.
    let sig: Vec<usize> = (0..tokens.len()).filter(|&i| !tokens[i].is_trivia()).collect();
    let sig_tokens: Vec<Token<'a>> = sig.iter().map(|&i| tokens[i]).collect();

    let mut out = Vec::with_capacity(tokens.len());
    let mut skip_until: Option<usize> = None;

    let mut s = 0usize;
    let mut i = 0usize;
    while i < tokens.len() {
        if let Some(end) = skip_until {
            if i <= end {
                i += 1;
                continue;
            }
            skip_until = None;
        }

        let tok = tokens[i];
        if tok.is_trivia() {
            out.push(Piece::Tok(tok));
            i += 1;
            continue;
        }

        // Keep `s` pointing at this token's position among significant ones.
        while s < sig.len() && sig[s] < i {
            s += 1;
        }
        let prev = if s > 0 { sig_tokens.get(s - 1) } else { None };
        let prev_is_dot = prev.is_some_and(|p| p.is_punct(".") || p.is_punct("?."));

        if tok.is_ident("debugger") && !prev_is_dot {
            let end = match sig_tokens.get(s + 1) {
                Some(next) if next.is_punct(";") => sig[s + 1],
                _ => i,
            };
            if prev.is_some_and(|p| p.precedes_statement_body()) {
                out.push(Piece::Text(";"));
            }
            skip_until = Some(end);
            i += 1;
            continue;
        }

        if tok.is_ident("console") && !prev_is_dot {
            if let Some(end) = console_call_end(&sig_tokens, s) {
                // `void 0` keeps expression positions (`a && console.log(x)`) valid.
                out.push(Piece::Text("void 0"));
                skip_until = Some(sig[end]);
                i += 1;
                continue;
            }
        }

        out.push(Piece::Tok(tok));
        i += 1;
    }
    out
}

/// `console.name(...)` (or `console["name"](...)`) starting at `s`; returns
/// the index of the closing parenthesis.
fn console_call_end(sig: &[Token<'_>], s: usize) -> Option<usize> {
    let open = match (sig.get(s + 1), sig.get(s + 2), sig.get(s + 3)) {
        (Some(dot), Some(name), Some(paren))
            if dot.is_punct(".") && name.kind == TokenKind::Ident && paren.is_punct("(") =>
        {
            s + 3
        }
        (Some(br), Some(name), _) if br.is_punct("[") && name.kind == TokenKind::Str => {
            let close = matching_close(sig, s + 1)?;
            let paren = sig.get(close + 1)?;
            if !paren.is_punct("(") {
                return None;
            }
            close + 1
        }
        _ => return None,
    };
    matching_close(sig, open)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || !c.is_ascii()
}

/// Whether two adjacent pieces would fuse into something else without a
/// space between them.
fn needs_space(prev: char, next: char) -> bool {
    (is_word_char(prev) && is_word_char(next))
        || (prev == '+' && next == '+')
        || (prev == '-' && next == '-')
        || (prev == '/' && (next == '/' || next == '*'))
}

/// `1 .toString()` must keep its space; `1.toString()` does not lex.
fn is_integer_literal(tok: &Token<'_>) -> bool {
    tok.kind == TokenKind::Number && tok.text.chars().all(|c| c.is_ascii_digit() || c == '_')
}

fn squeeze(pieces: &[Piece<'_>]) -> String {
    let mut out = String::new();
    let mut pending_newline = false;
    let mut after_integer = false;

    for piece in pieces {
        let text = match piece {
            Piece::Tok(tok) if tok.kind == TokenKind::Whitespace => {
                if tok.text.contains('\n') {
                    pending_newline = true;
                }
                continue;
            }
            Piece::Tok(tok) if tok.is_comment() => {
                if tok.kind == TokenKind::BlockComment && tok.text.contains('\n') {
                    pending_newline = true;
                }
                continue;
            }
            Piece::Tok(tok) => tok.text,
            Piece::Text(text) => *text,
        };

        if let (Some(last), Some(first)) = (out.chars().next_back(), text.chars().next()) {
            if pending_newline {
                out.push('\n');
            } else if needs_space(last, first) || (after_integer && first == '.') {
                out.push(' ');
            }
        }
        pending_newline = false;
        after_integer = matches!(piece, Piece::Tok(tok) if is_integer_literal(tok));
        out.push_str(text);
    }

    if !out.is_empty() {
        out.push('\n');
    }
    out
}
