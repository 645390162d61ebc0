// src/transform/html.rs

//! HTML partial inlining and whitespace collapsing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use regex::{Captures, Regex};
use thiserror::Error;

use crate::fs::{lexical_normalize, to_slash};
use crate::watch::path_utils::is_within;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PartialError {
    #[error("partial '{name}' not found (looked in {dir:?}, included from {from:?})")]
    Missing {
        name: String,
        dir: PathBuf,
        from: PathBuf,
    },

    #[error("partial include cycle: {0}")]
    Cycle(String),

    #[error("{from:?} includes partial '{name}' but no partials directory is configured")]
    NoPartialsDir { name: String, from: PathBuf },

    #[error("<partial> tag without a src attribute in {0:?}")]
    MissingSrc(PathBuf),

    #[error("partial '{name}' resolves outside {dir:?} (included from {from:?})")]
    OutsideDir {
        name: String,
        dir: PathBuf,
        from: PathBuf,
    },

    #[error("cannot read partial {path:?}: {message}")]
    Read { path: PathBuf, message: String },
}

/// `<!--partial:header.html-->` or `<partial src="x.html" k="v"></partial>`.
const INCLUDE_PATTERN: &str = r#"(?s)<!--\s*partial:\s*(?P<marker>[^\s>]+?)\s*-->|<partial\b(?P<attrs>[^>]*?)/?>(?:\s*</partial>)?"#;

const ATTR_PATTERN: &str = r#"(?P<key>[A-Za-z_][\w:.-]*)\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')"#;

const PLACEHOLDER_PATTERN: &str = r"@@(?P<key>[A-Za-z_][\w-]*)";

/// Resolves partial includes against one directory.
#[derive(Debug, Clone)]
pub struct PartialResolver {
    dir: Option<PathBuf>,
    include: Regex,
    attr: Regex,
    placeholder: Regex,
}

impl PartialResolver {
    pub fn new(dir: Option<PathBuf>) -> Result<Self, regex::Error> {
        Ok(Self {
            dir,
            include: Regex::new(INCLUDE_PATTERN)?,
            attr: Regex::new(ATTR_PATTERN)?,
            placeholder: Regex::new(PLACEHOLDER_PATTERN)?,
        })
    }

    /// Replace every include in `source` (read from `origin`) with the
    /// partial's content, recursively.
    pub fn resolve(&self, source: &str, origin: &Path) -> Result<String, PartialError> {
        let mut stack = vec![origin.to_path_buf()];
        self.expand(source, origin, &mut stack)
    }

    fn expand(
        &self,
        text: &str,
        origin: &Path,
        stack: &mut Vec<PathBuf>,
    ) -> Result<String, PartialError> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for caps in self.include.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&text[last..whole.start()]);
            last = whole.end();

            let (name, vars) = self.include_target(&caps, origin)?;
            let path = self.locate(&name, origin)?;

            if stack.contains(&path) {
                let chain = stack
                    .iter()
                    .chain(std::iter::once(&path))
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(PartialError::Cycle(chain));
            }

            let content = std::fs::read_to_string(&path).map_err(|e| PartialError::Read {
                path: path.clone(),
                message: e.to_string(),
            })?;
            let content = self.substitute(&content, &vars);

            stack.push(path.clone());
            let expanded = self.expand(&content, &path, stack)?;
            stack.pop();

            out.push_str(&expanded);
        }

        out.push_str(&text[last..]);
        Ok(out)
    }

    fn locate(&self, name: &str, origin: &Path) -> Result<PathBuf, PartialError> {
        let Some(dir) = &self.dir else {
            return Err(PartialError::NoPartialsDir {
                name: name.to_string(),
                from: origin.to_path_buf(),
            });
        };
        let path = lexical_normalize(&dir.join(name));
        if !is_within(&to_slash(&path), &to_slash(&lexical_normalize(dir))) {
            return Err(PartialError::OutsideDir {
                name: name.to_string(),
                dir: dir.clone(),
                from: origin.to_path_buf(),
            });
        }
        if path.is_file() {
            Ok(path)
        } else {
            Err(PartialError::Missing {
                name: name.to_string(),
                dir: dir.clone(),
                from: origin.to_path_buf(),
            })
        }
    }

    fn include_target(
        &self,
        caps: &Captures<'_>,
        origin: &Path,
    ) -> Result<(String, HashMap<String, String>), PartialError> {
        if let Some(marker) = caps.name("marker") {
            return Ok((marker.as_str().to_string(), HashMap::new()));
        }

        let attrs = caps.name("attrs").map(|m| m.as_str()).unwrap_or_default();
        let mut vars: HashMap<String, String> = self.attr
            .captures_iter(attrs)
            .filter_map(|a| {
                let key = a.name("key")?.as_str().to_string();
                let value = a.name("dq").or_else(|| a.name("sq"))?.as_str().to_string();
                Some((key, value))
            })
            .collect();

        match vars.remove("src") {
            Some(src) => Ok((src, vars)),
            None => Err(PartialError::MissingSrc(origin.to_path_buf())),
        }
    }

    /// Replace `@@key` with the attribute value; unknown keys stay as they are.
    fn substitute(&self, content: &str, vars: &HashMap<String, String>) -> String {
        if vars.is_empty() {
            return content.to_string();
        }
        self.placeholder
            .replace_all(content, |c: &Captures<'_>| match vars.get(&c["key"]) {
                Some(v) => v.clone(),
                None => c[0].to_string(),
            })
            .into_owned()
    }
}

const RAW_ELEMENTS: &[&str] = &["pre", "textarea", "script", "style"];

const BLOCK_ELEMENTS: &[&str] = &[
    "!doctype", "address", "article", "aside", "base", "blockquote", "body", "br", "canvas",
    "caption", "col", "colgroup", "dd", "div", "dl", "dt", "fieldset", "figcaption", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hr", "html", "li",
    "link", "main", "meta", "nav", "noscript", "ol", "option", "p", "script", "section",
    "select", "style", "table", "tbody", "td", "tfoot", "th", "thead", "title", "tr", "ul",
    "video", "source", "picture",
];

enum Node<'a> {
    Text(&'a str),
    Tag { raw: &'a str, name: String },
    Comment(&'a str),
}

fn tag_name(raw: &str) -> String {
    raw.trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '>' && *c != '/')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Split into text, tags and comments. Content of raw elements is a single
/// text node.
fn split_nodes(html: &str) -> Vec<Node<'_>> {
    let bytes = html.as_bytes();
    let mut nodes = Vec::new();
    let mut pos = 0;
    let mut text_start = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            pos += 1;
            continue;
        }
        let rest = &html[pos..];

        if rest.starts_with("<!--") {
            let end = rest.find("-->").map(|i| pos + i + 3).unwrap_or(html.len());
            if text_start < pos {
                nodes.push(Node::Text(&html[text_start..pos]));
            }
            nodes.push(Node::Comment(&html[pos..end]));
            pos = end;
            text_start = pos;
            continue;
        }

        let starts_tag = rest[1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!');
        if !starts_tag {
            pos += 1;
            continue;
        }

        // Find the closing '>' outside quoted attribute values.
        let mut quote: Option<u8> = None;
        let mut end = None;
        for (i, &b) in bytes.iter().enumerate().skip(pos + 1) {
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None if b == b'"' || b == b'\'' => quote = Some(b),
                None if b == b'>' => {
                    end = Some(i + 1);
                    break;
                }
                None => {}
            }
        }
        let end = end.unwrap_or(html.len());

        if text_start < pos {
            nodes.push(Node::Text(&html[text_start..pos]));
        }
        let raw = &html[pos..end];
        let name = tag_name(raw);
        let is_open = !raw.starts_with("</");
        nodes.push(Node::Tag {
            raw,
            name: name.clone(),
        });
        pos = end;
        text_start = pos;

        if is_open && RAW_ELEMENTS.contains(&name.as_str()) && !raw.ends_with("/>") {
            let close = format!("</{name}");
            let lower = html[pos..].to_ascii_lowercase();
            let body_end = lower.find(&close).map(|i| pos + i).unwrap_or(html.len());
            if pos < body_end {
                nodes.push(Node::Text(&html[pos..body_end]));
            }
            pos = body_end;
            text_start = pos;
        }
    }
    if text_start < html.len() {
        nodes.push(Node::Text(&html[text_start..]));
    }
    nodes
}

fn collapse_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_ws = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_ws {
                out.push(' ');
            }
            in_ws = true;
        } else {
            out.push(c);
            in_ws = false;
        }
    }
    out
}

/// Collapse whitespace the way an HTML minifier does in its conservative
/// mode: runs become one space; whitespace next to block-level tags goes.
/// `pre`, `textarea`, `script` and `style` content is untouched.
pub fn collapse_whitespace(html: &str) -> String {
    let nodes = split_nodes(html);
    let mut out = String::with_capacity(html.len());

    let is_block = |node: Option<&Node<'_>>| match node {
        None => true,
        Some(Node::Tag { name, .. }) => BLOCK_ELEMENTS.contains(&name.as_str()),
        Some(Node::Comment(_)) => true,
        Some(Node::Text(_)) => false,
    };

    let mut raw_depth: Option<String> = None;
    for (i, node) in nodes.iter().enumerate() {
        match node {
            Node::Tag { raw, name } => {
                out.push_str(raw);
                if raw.starts_with("</") {
                    if raw_depth.as_deref() == Some(name.as_str()) {
                        raw_depth = None;
                    }
                } else if RAW_ELEMENTS.contains(&name.as_str()) && !raw.ends_with("/>") {
                    raw_depth = Some(name.clone());
                }
            }
            Node::Comment(raw) => out.push_str(raw),
            Node::Text(text) if raw_depth.is_some() => out.push_str(text),
            Node::Text(text) => {
                let prev = if i == 0 { None } else { nodes.get(i - 1) };
                let next = nodes.get(i + 1);
                let mut collapsed = collapse_runs(text);
                if is_block(prev) {
                    collapsed = collapsed.trim_start().to_string();
                }
                if is_block(next) {
                    collapsed = collapsed.trim_end().to_string();
                }
                out.push_str(&collapsed);
            }
        }
    }
    out
}
