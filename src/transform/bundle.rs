// src/transform/bundle.rs

//! Script bundling: follow relative `require`/`import` specifiers from an
//! entry module, lower ES module syntax to CommonJS, downlevel the rest to
//! ES5 (see [`downlevel`]), and concatenate every module behind a small
//! loader.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::fs::lexical_normalize;
use crate::transform::downlevel::downlevel;
use crate::transform::js_lexer::{
    LexError, Token, TokenKind, declarators, matching_close, significant, tokenize,
};

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("cannot read module {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path:?}:{source}")]
    Syntax {
        path: PathBuf,
        #[source]
        source: LexError,
    },

    #[error("cannot resolve '{specifier}' from {from:?} (only relative paths are bundled)")]
    Unresolved { specifier: String, from: PathBuf },
}

/// One module of a bundle after lowering.
#[derive(Debug, Clone)]
pub struct BundleModule {
    pub id: usize,
    pub path: PathBuf,
    pub code: String,
    /// Specifier -> module id.
    pub deps: BTreeMap<String, usize>,
}

/// Module code with ES module syntax replaced by CommonJS, plus every
/// specifier the module requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweredModule {
    pub code: String,
    pub requests: Vec<String>,
}

/// Resolve the module graph rooted at `entry` (breadth-first; the entry is
/// module 0). Cycles are fine: a module is loaded once and later requests
/// reuse its id.
pub fn collect_modules(entry: &Path) -> Result<Vec<BundleModule>, BundleError> {
    let entry = lexical_normalize(entry);
    let mut ids: HashMap<PathBuf, usize> = HashMap::new();
    let mut modules: Vec<BundleModule> = Vec::new();
    let mut queue: VecDeque<PathBuf> = VecDeque::new();

    ids.insert(entry.clone(), 0);
    queue.push_back(entry);

    while let Some(path) = queue.pop_front() {
        let source = std::fs::read_to_string(&path).map_err(|source| BundleError::Read {
            path: path.clone(),
            source,
        })?;
        let syntax = |source| BundleError::Syntax {
            path: path.clone(),
            source,
        };
        let lowered = lower_module(&source).map_err(syntax)?;
        let code = downlevel(&lowered.code).map_err(syntax)?;

        let mut deps = BTreeMap::new();
        for specifier in lowered.requests {
            let resolved = resolve_specifier(&path, &specifier).ok_or_else(|| {
                BundleError::Unresolved {
                    specifier: specifier.clone(),
                    from: path.clone(),
                }
            })?;
            let next_id = ids.len();
            let id = *ids.entry(resolved.clone()).or_insert_with(|| {
                queue.push_back(resolved);
                next_id
            });
            deps.insert(specifier, id);
        }

        let id = ids.get(&path).copied().unwrap_or(modules.len());
        modules.push(BundleModule {
            id,
            path,
            code,
            deps,
        });
    }

    modules.sort_by_key(|m| m.id);
    Ok(modules)
}

/// Bundle `entry` and its dependencies into one script.
pub fn bundle(entry: &Path) -> Result<String, BundleError> {
    let modules = collect_modules(entry)?;
    Ok(emit_bundle(&modules))
}

fn resolve_specifier(from: &Path, specifier: &str) -> Option<PathBuf> {
    if !(specifier.starts_with("./") || specifier.starts_with("../")) {
        return None;
    }
    let base = from.parent().unwrap_or(Path::new("")).join(specifier);
    let base = lexical_normalize(&base);

    let mut candidates = vec![base.clone()];
    for ext in ["js", "mjs", "cjs"] {
        let mut name = base.clone().into_os_string();
        name.push(format!(".{ext}"));
        candidates.push(PathBuf::from(name));
    }
    candidates.push(base.join("index.js"));

    candidates.into_iter().find(|c| c.is_file())
}

const PRELUDE: &str = r#"(function (modules, entry) {
  var cache = {};
  function load(id) {
    var cached = cache[id];
    if (cached) {
      return cached.exports;
    }
    var module = (cache[id] = { exports: {} });
    var def = modules[id];
    function require(name) {
      var dep = def[1][name];
      if (dep === undefined) {
        throw new Error("Cannot find module '" + name + "'");
      }
      return load(dep);
    }
    require.default = function (m) {
      return m && m.__esModule ? m["default"] : m;
    };
    require.star = function (target, source) {
      Object.keys(source).forEach(function (key) {
        if (key !== "default" && key !== "__esModule") {
          target[key] = source[key];
        }
      });
    };
    def[0].call(module.exports, require, module, module.exports);
    return module.exports;
  }
  load(entry);
})({
"#;

/// Wrap lowered modules behind the loader prelude.
pub fn emit_bundle(modules: &[BundleModule]) -> String {
    let mut out = String::from(PRELUDE);
    for (idx, module) in modules.iter().enumerate() {
        let deps = module
            .deps
            .iter()
            .map(|(spec, id)| format!("\"{}\": {id}", spec.replace('"', "\\\"")))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(
            out,
            "{}: [function (require, module, exports) {{\n{}\n}}, {{{deps}}}]",
            module.id,
            module.code.trim_end()
        );
        out.push_str(if idx + 1 < modules.len() { ",\n" } else { "\n" });
    }
    out.push_str("}, 0);\n");
    out
}

struct Edit {
    start: usize,
    end: usize,
    text: String,
}

/// Lower `import`/`export` to CommonJS and list the requested specifiers.
pub fn lower_module(src: &str) -> Result<LoweredModule, LexError> {
    let tokens = tokenize(src)?;
    let sig = significant(&tokens);

    let mut edits: Vec<Edit> = Vec::new();
    let mut trailer: Vec<String> = Vec::new();
    let mut requests: Vec<String> = Vec::new();
    let mut is_esm = false;
    let mut temp = 0usize;

    let mut k = 0usize;
    while k < sig.len() {
        let tok = sig[k];
        let after_dot = k > 0 && (sig[k - 1].is_punct(".") || sig[k - 1].is_punct("?."));

        if tok.is_ident("require") && !after_dot {
            if let (Some(open), Some(spec), Some(close)) = (sig.get(k + 1), sig.get(k + 2), sig.get(k + 3)) {
                if open.is_punct("(") && close.is_punct(")") {
                    if let Some(value) = spec.string_value() {
                        requests.push(value.to_string());
                    }
                }
            }
            k += 1;
            continue;
        }

        if tok.is_ident("import") && !after_dot {
            let dynamic = sig
                .get(k + 1)
                .is_some_and(|n| n.is_punct("(") || n.is_punct("."));
            if !dynamic {
                if let Some((end, text, spec)) = lower_import(&sig, k, &mut temp) {
                    is_esm = true;
                    requests.push(spec);
                    edits.push(Edit {
                        start: tok.start,
                        end: sig[end].end(),
                        text,
                    });
                    k = end + 1;
                    continue;
                }
            }
        }

        if tok.is_ident("export") && !after_dot {
            if let Some(lowered) = lower_export(&sig, k, &mut temp) {
                is_esm = true;
                if let Some(spec) = lowered.request {
                    requests.push(spec);
                }
                edits.push(Edit {
                    start: tok.start,
                    end: sig[lowered.end].end(),
                    text: lowered.text,
                });
                trailer.extend(lowered.trailer);
                k = lowered.end + 1;
                continue;
            }
        }

        k += 1;
    }

    let mut code = String::with_capacity(src.len() + 64);
    if is_esm {
        code.push_str("Object.defineProperty(exports, \"__esModule\", { value: true });\n");
    }
    let mut cursor = 0usize;
    for edit in &edits {
        code.push_str(&src[cursor..edit.start]);
        code.push_str(&edit.text);
        cursor = edit.end;
    }
    code.push_str(&src[cursor..]);
    if !trailer.is_empty() {
        if !code.ends_with('\n') {
            code.push('\n');
        }
        code.push_str(&trailer.join("\n"));
        code.push('\n');
    }

    let mut seen = std::collections::HashSet::new();
    requests.retain(|r| seen.insert(r.clone()));

    Ok(LoweredModule { code, requests })
}

fn next_temp(temp: &mut usize) -> String {
    *temp += 1;
    format!("__assetpipe_m{temp}")
}

/// `a`, `a as b`, `default as b` entries of a `{ ... }` clause:
/// (imported/local name, bound/exported name).
fn clause_names(sig: &[Token<'_>], open: usize, close: usize) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut i = open + 1;
    while i < close {
        let tok = sig[i];
        if tok.kind == TokenKind::Ident {
            if sig.get(i + 1).is_some_and(|t| t.is_ident("as")) {
                if let Some(alias) = sig.get(i + 2) {
                    out.push((tok.text.to_string(), alias.text.to_string()));
                    i += 3;
                    continue;
                }
            }
            out.push((tok.text.to_string(), tok.text.to_string()));
        }
        i += 1;
    }
    out
}

fn quoted(tok: &Token<'_>) -> String {
    tok.text.to_string()
}

/// Returns (index of last consumed token, replacement, specifier).
fn lower_import(sig: &[Token<'_>], k: usize, temp: &mut usize) -> Option<(usize, String, String)> {
    let first = sig.get(k + 1)?;

    // `import 'side-effect';`
    if first.kind == TokenKind::Str {
        let spec = first.string_value()?.to_string();
        return Some((k + 1, format!("require({})", quoted(first)), spec));
    }

    let mut j = k + 1;
    let mut default_name = None;
    let mut namespace = None;
    let mut named = Vec::new();

    if sig[j].kind == TokenKind::Ident && !sig[j].is_ident("from") {
        default_name = Some(sig[j].text.to_string());
        j += 1;
        if sig.get(j)?.is_punct(",") {
            j += 1;
        }
    }
    if sig.get(j)?.is_punct("*") {
        if !sig.get(j + 1)?.is_ident("as") {
            return None;
        }
        namespace = Some(sig.get(j + 2)?.text.to_string());
        j += 3;
    } else if sig.get(j)?.is_punct("{") {
        let close = matching_close(sig, j)?;
        named = clause_names(sig, j, close);
        j = close + 1;
    }

    if !sig.get(j)?.is_ident("from") {
        return None;
    }
    let spec_tok = sig.get(j + 1)?;
    let spec = spec_tok.string_value()?.to_string();

    let module = next_temp(temp);
    let mut parts = vec![format!("var {module} = require({});", quoted(spec_tok))];
    if let Some(ns) = namespace {
        parts.push(format!("var {ns} = {module};"));
    }
    if let Some(name) = default_name {
        parts.push(format!("var {name} = require.default({module});"));
    }
    for (imported, local) in named {
        parts.push(format!("var {local} = {module}[\"{imported}\"];"));
    }

    let mut end = j + 1;
    if sig.get(end + 1).is_some_and(|t| t.is_punct(";")) {
        end += 1;
    }
    Some((end, parts.join(" "), spec))
}

struct LoweredExport {
    end: usize,
    text: String,
    trailer: Vec<String>,
    request: Option<String>,
}

fn lower_export(sig: &[Token<'_>], k: usize, temp: &mut usize) -> Option<LoweredExport> {
    let next = sig.get(k + 1)?;

    // export default ...
    if next.is_ident("default") {
        let mut d = k + 2;
        if sig.get(d).is_some_and(|t| t.is_ident("async")) {
            d += 1;
        }
        let decl = sig.get(d)?;
        if decl.is_ident("function") || decl.is_ident("class") {
            let mut n = d + 1;
            if sig.get(n).is_some_and(|t| t.is_punct("*")) {
                n += 1;
            }
            if let Some(name) = sig.get(n).filter(|t| {
                t.kind == TokenKind::Ident && !t.is_ident("extends")
            }) {
                return Some(LoweredExport {
                    end: k + 1,
                    text: String::new(),
                    trailer: vec![format!("exports.default = {};", name.text)],
                    request: None,
                });
            }
        }
        return Some(LoweredExport {
            end: k + 1,
            text: "exports.default =".to_string(),
            trailer: Vec::new(),
            request: None,
        });
    }

    // export var/let/const ...
    if next.is_ident("var") || next.is_ident("let") || next.is_ident("const") {
        let (names, _) = declarators(sig, k + 1);
        return Some(LoweredExport {
            end: k,
            text: String::new(),
            trailer: names
                .into_iter()
                .map(|i| format!("exports.{0} = {0};", sig[i].text))
                .collect(),
            request: None,
        });
    }

    // export function / export async function / export class
    let mut d = k + 1;
    if sig.get(d).is_some_and(|t| t.is_ident("async")) {
        d += 1;
    }
    if sig.get(d).is_some_and(|t| t.is_ident("function") || t.is_ident("class")) {
        let mut n = d + 1;
        if sig.get(n).is_some_and(|t| t.is_punct("*")) {
            n += 1;
        }
        let name = sig.get(n).filter(|t| t.kind == TokenKind::Ident)?;
        return Some(LoweredExport {
            end: k,
            text: String::new(),
            trailer: vec![format!("exports.{0} = {0};", name.text)],
            request: None,
        });
    }

    // export * from '...' / export * as ns from '...'
    if next.is_punct("*") {
        if sig.get(k + 2)?.is_ident("as") {
            let ns = sig.get(k + 3)?;
            if !sig.get(k + 4)?.is_ident("from") {
                return None;
            }
            let spec_tok = sig.get(k + 5)?;
            return Some(LoweredExport {
                end: with_semicolon(sig, k + 5),
                text: format!("exports.{} = require({});", ns.text, quoted(spec_tok)),
                trailer: Vec::new(),
                request: Some(spec_tok.string_value()?.to_string()),
            });
        }
        if !sig.get(k + 2)?.is_ident("from") {
            return None;
        }
        let spec_tok = sig.get(k + 3)?;
        return Some(LoweredExport {
            end: with_semicolon(sig, k + 3),
            text: format!("require.star(exports, require({}));", quoted(spec_tok)),
            trailer: Vec::new(),
            request: Some(spec_tok.string_value()?.to_string()),
        });
    }

    // export { a, b as c } [from '...']
    if next.is_punct("{") {
        let close = matching_close(sig, k + 1)?;
        let names = clause_names(sig, k + 1, close);

        if sig.get(close + 1).is_some_and(|t| t.is_ident("from")) {
            let spec_tok = sig.get(close + 2)?;
            let module = next_temp(temp);
            let mut parts = vec![format!("var {module} = require({});", quoted(spec_tok))];
            for (imported, exported) in names {
                parts.push(format!("exports.{exported} = {module}[\"{imported}\"];"));
            }
            return Some(LoweredExport {
                end: with_semicolon(sig, close + 2),
                text: parts.join(" "),
                trailer: Vec::new(),
                request: Some(spec_tok.string_value()?.to_string()),
            });
        }

        return Some(LoweredExport {
            end: with_semicolon(sig, close),
            text: String::new(),
            trailer: names
                .into_iter()
                .map(|(local, exported)| format!("exports.{exported} = {local};"))
                .collect(),
            request: None,
        });
    }

    None
}

fn with_semicolon(sig: &[Token<'_>], idx: usize) -> usize {
    if sig.get(idx + 1).is_some_and(|t| t.is_punct(";")) {
        idx + 1
    } else {
        idx
    }
}
