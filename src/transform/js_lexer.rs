// src/transform/js_lexer.rs

//! A lossless JavaScript tokenizer.
//!
//! Concatenating the `text` of every token reproduces the input exactly,
//! which lets the bundler, the minifier and the lint fixer edit token
//! streams and write them back. It is not a parser: it only knows enough
//! to tell regex literals from division and to skip over strings, template
//! literals and comments.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Whitespace,
    LineComment,
    BlockComment,
    Ident,
    Number,
    Str,
    Template,
    Regex,
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset into the source.
    pub start: usize,
    /// 1-based line of the first character.
    pub line: usize,
    /// 1-based column (in characters) of the first character.
    pub col: usize,
}

impl<'a> Token<'a> {
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    /// Line of the last character.
    pub fn end_line(&self) -> usize {
        self.line + self.text.matches('\n').count()
    }

    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }

    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == name
    }

    pub fn is_punct(&self, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == p
    }

    /// Whether a statement following this token may be the body of a
    /// braceless `if`/`for`/`while`/`else`/`do` or a label, so removing that
    /// statement must leave an empty `;` behind.
    pub fn precedes_statement_body(&self) -> bool {
        self.is_punct(")") || self.is_punct(":") || self.is_ident("else") || self.is_ident("do")
    }

    /// Content of a string literal without its quotes (escapes untouched).
    pub fn string_value(&self) -> Option<&'a str> {
        if self.kind != TokenKind::Str || self.text.len() < 2 {
            return None;
        }
        Some(&self.text[1..self.text.len() - 1])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.col, self.message)
    }
}

impl std::error::Error for LexError {}

/// Punctuators, longest first.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "**", "<<", ">>",
];

/// Keywords after which a `/` starts a regex literal.
const KEYWORDS_BEFORE_EXPR: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

/// Reserved words and literals that are never identifier references.
pub const KEYWORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "let", "new", "null", "return", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with", "yield", "async", "await", "of",
    "static", "get", "set", "from", "as", "implements", "interface", "package", "private",
    "protected", "public",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || (!c.is_ascii() && !c.is_whitespace())
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn error(&self, message: impl Into<String>, line: usize, col: usize) -> LexError {
        LexError {
            message: message.into(),
            line,
            col,
        }
    }

    fn string(&mut self, quote: char) -> Result<(), LexError> {
        let (line, col) = (self.line, self.col);
        self.bump();
        loop {
            match self.bump() {
                Some('\\') => {
                    self.bump();
                }
                Some(c) if c == quote => return Ok(()),
                Some('\n') | None => {
                    return Err(self.error("unterminated string literal", line, col));
                }
                Some(_) => {}
            }
        }
    }

    fn template(&mut self) -> Result<(), LexError> {
        let (line, col) = (self.line, self.col);
        self.bump();
        loop {
            match self.peek() {
                Some('\\') => self.bump_n(2),
                Some('`') => {
                    self.bump();
                    return Ok(());
                }
                Some('$') if self.peek_at(1) == Some('{') => {
                    self.bump_n(2);
                    self.template_expr(line, col)?;
                }
                Some(_) => {
                    self.bump();
                }
                None => return Err(self.error("unterminated template literal", line, col)),
            }
        }
    }

    /// Skip a `${ ... }` substitution, including nested braces and literals.
    fn template_expr(&mut self, line: usize, col: usize) -> Result<(), LexError> {
        let mut depth = 1usize;
        while let Some(c) = self.peek() {
            match c {
                '\'' | '"' => self.string(c)?,
                '`' => self.template()?,
                '{' => {
                    depth += 1;
                    self.bump();
                }
                '}' => {
                    depth -= 1;
                    self.bump();
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {
                    self.bump();
                }
            }
        }
        Err(self.error("unterminated template substitution", line, col))
    }

    fn regex(&mut self) -> Result<(), LexError> {
        let (line, col) = (self.line, self.col);
        self.bump();
        let mut in_class = false;
        loop {
            match self.bump() {
                Some('\\') => {
                    self.bump();
                }
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('/') if !in_class => break,
                Some('\n') | None => {
                    return Err(self.error("unterminated regular expression", line, col));
                }
                Some(_) => {}
            }
        }
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        Ok(())
    }

    fn number(&mut self) {
        let hex = self.rest().starts_with("0x") || self.rest().starts_with("0X");
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                self.bump();
                if !hex && (c == 'e' || c == 'E') && matches!(self.peek(), Some('+' | '-')) {
                    self.bump();
                }
            } else {
                break;
            }
        }
    }
}

fn regex_allowed(prev: Option<&Token<'_>>) -> bool {
    match prev {
        None => true,
        Some(tok) => match tok.kind {
            TokenKind::Punct => !matches!(tok.text, ")" | "]" | "}"),
            TokenKind::Ident => KEYWORDS_BEFORE_EXPR.contains(&tok.text),
            _ => false,
        },
    }
}

/// Split `src` into tokens.
pub fn tokenize(src: &str) -> Result<Vec<Token<'_>>, LexError> {
    let mut lx = Lexer {
        src,
        pos: 0,
        line: 1,
        col: 1,
    };
    let mut tokens: Vec<Token<'_>> = Vec::new();
    let mut last_significant: Option<usize> = None;

    while let Some(c) = lx.peek() {
        let (start, line, col) = (lx.pos, lx.line, lx.col);

        let kind = if c.is_whitespace() {
            while lx.peek().is_some_and(char::is_whitespace) {
                lx.bump();
            }
            TokenKind::Whitespace
        } else if lx.rest().starts_with("//") || (start == 0 && lx.rest().starts_with("#!")) {
            while lx.peek().is_some_and(|c| c != '\n') {
                lx.bump();
            }
            TokenKind::LineComment
        } else if lx.rest().starts_with("/*") {
            let Some(close) = lx.rest()[2..].find("*/") else {
                return Err(lx.error("unterminated comment", line, col));
            };
            let len = lx.rest()[..close + 4].chars().count();
            lx.bump_n(len);
            TokenKind::BlockComment
        } else if c == '"' || c == '\'' {
            lx.string(c)?;
            TokenKind::Str
        } else if c == '`' {
            lx.template()?;
            TokenKind::Template
        } else if is_ident_start(c) {
            while lx.peek().is_some_and(is_ident_char) {
                lx.bump();
            }
            TokenKind::Ident
        } else if c.is_ascii_digit() || (c == '.' && lx.peek_at(1).is_some_and(|d| d.is_ascii_digit())) {
            lx.number();
            TokenKind::Number
        } else if c == '/' && regex_allowed(last_significant.map(|i| &tokens[i])) {
            lx.regex()?;
            TokenKind::Regex
        } else {
            let rest = lx.rest();
            let len = PUNCTUATORS
                .iter()
                .find(|p| rest.starts_with(**p))
                .map(|p| p.len())
                .unwrap_or(1);
            lx.bump_n(len);
            TokenKind::Punct
        };

        tokens.push(Token {
            kind,
            text: &src[start..lx.pos],
            start,
            line,
            col,
        });
        if !tokens[tokens.len() - 1].is_trivia() {
            last_significant = Some(tokens.len() - 1);
        }
    }

    Ok(tokens)
}

/// Tokens without whitespace and comments.
pub fn significant<'a>(tokens: &[Token<'a>]) -> Vec<Token<'a>> {
    tokens.iter().filter(|t| !t.is_trivia()).copied().collect()
}

fn closer_of(open: &str) -> Option<&'static str> {
    match open {
        "(" => Some(")"),
        "[" => Some("]"),
        "{" => Some("}"),
        _ => None,
    }
}

/// Index of the bracket closing the one at `open`.
pub fn matching_close(sig: &[Token<'_>], open: usize) -> Option<usize> {
    let open_text = sig.get(open)?.text;
    let close_text = closer_of(open_text)?;
    let mut depth = 0usize;
    for (i, tok) in sig.iter().enumerate().skip(open) {
        if tok.kind != TokenKind::Punct {
            continue;
        }
        if tok.text == open_text {
            depth += 1;
        } else if tok.text == close_text {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Index of the bracket opening the one at `close`.
pub fn matching_open(sig: &[Token<'_>], close: usize) -> Option<usize> {
    let close_text = sig.get(close)?.text;
    let open_text = match close_text {
        ")" => "(",
        "]" => "[",
        "}" => "{",
        _ => return None,
    };
    let mut depth = 0usize;
    for i in (0..=close).rev() {
        let tok = &sig[i];
        if tok.kind != TokenKind::Punct {
            continue;
        }
        if tok.text == close_text {
            depth += 1;
        } else if tok.text == open_text {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

fn is_open(tok: &Token<'_>) -> bool {
    tok.kind == TokenKind::Punct && matches!(tok.text, "(" | "[" | "{")
}

fn is_close(tok: &Token<'_>) -> bool {
    tok.kind == TokenKind::Punct && matches!(tok.text, ")" | "]" | "}")
}

/// Skip an expression starting at `from` until a `,` or `;` at depth 0,
/// an unbalanced closing bracket, or a line break that ends a statement.
/// Returns the index of the stopping token.
pub fn skip_expression(sig: &[Token<'_>], from: usize) -> usize {
    let mut depth = 0usize;
    let mut i = from;
    while i < sig.len() {
        let tok = &sig[i];
        if is_open(tok) {
            depth += 1;
        } else if is_close(tok) {
            if depth == 0 {
                return i;
            }
            depth -= 1;
        } else if depth == 0 {
            if tok.is_punct(",") || tok.is_punct(";") {
                return i;
            }
            if i > from && starts_new_statement(&sig[i - 1], tok) {
                return i;
            }
        }
        i += 1;
    }
    i
}

/// Automatic semicolon insertion, approximately: a line break between a
/// complete operand and a token that can begin a statement.
fn starts_new_statement(prev: &Token<'_>, tok: &Token<'_>) -> bool {
    if tok.line <= prev.end_line() {
        return false;
    }
    let prev_ends_operand = match prev.kind {
        TokenKind::Ident => !KEYWORDS_BEFORE_EXPR.contains(&prev.text),
        TokenKind::Number | TokenKind::Str | TokenKind::Template | TokenKind::Regex => true,
        TokenKind::Punct => matches!(prev.text, ")" | "]" | "}" | "++" | "--"),
        _ => false,
    };
    let tok_starts = matches!(
        tok.kind,
        TokenKind::Ident | TokenKind::Number | TokenKind::Str | TokenKind::Template
    ) || tok.is_punct("{")
        || tok.is_punct("++")
        || tok.is_punct("--")
        || tok.is_punct("!");
    prev_ends_operand && tok_starts
}

/// Indices of identifiers bound by a binding pattern or parameter list
/// spanning `sig[start..end]`.
///
/// `a, b = 1, {c, d: e}, [f], ...g` binds `a b c e f g`.
pub fn pattern_bindings(sig: &[Token<'_>], start: usize, end: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let end = end.min(sig.len());
    let mut i = start;
    while i < end {
        let tok = &sig[i];
        if tok.is_punct("=") {
            i = skip_expression(sig, i + 1).max(i + 1);
            continue;
        }
        if tok.kind == TokenKind::Ident && !is_keyword(tok.text) {
            let is_key = sig.get(i + 1).is_some_and(|n| n.is_punct(":"));
            let after_dot = i > 0 && (sig[i - 1].is_punct(".") || sig[i - 1].is_punct("?."));
            if !is_key && !after_dot {
                out.push(i);
            }
        }
        i += 1;
    }
    out
}

/// Bindings of a `var`/`let`/`const` declaration whose keyword is at
/// `kw`, and the index just past the declaration.
pub fn declarators(sig: &[Token<'_>], kw: usize) -> (Vec<usize>, usize) {
    let mut names = Vec::new();
    let mut i = kw + 1;
    loop {
        let Some(tok) = sig.get(i) else { break };
        if tok.kind == TokenKind::Ident && !is_keyword(tok.text) {
            names.push(i);
            i += 1;
        } else if tok.is_punct("{") || tok.is_punct("[") {
            let Some(close) = matching_close(sig, i) else {
                break;
            };
            names.extend(pattern_bindings(sig, i + 1, close));
            i = close + 1;
        } else {
            break;
        }

        if sig.get(i).is_some_and(|t| t.is_punct("=")) {
            i = skip_expression(sig, i + 1);
        }
        if sig.get(i).is_some_and(|t| t.is_punct(",")) {
            i += 1;
            continue;
        }
        break;
    }
    (names, i)
}

/// Concatenate token texts.
pub fn render(tokens: &[Token<'_>]) -> String {
    let mut out = String::with_capacity(tokens.iter().map(|t| t.text.len()).sum());
    for tok in tokens {
        out.push_str(tok.text);
    }
    out
}
