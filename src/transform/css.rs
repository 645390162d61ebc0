// src/transform/css.rs

use anyhow::{Result, anyhow};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;

/// How a stylesheet is post-processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CssOptions {
    /// Add vendor prefixes for [`browser_targets`].
    pub prefix: bool,
    /// Produce a source map.
    pub source_map: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssOutput {
    pub code: String,
    /// Source map JSON, when requested.
    pub map: Option<String>,
}

/// The browser set vendor prefixes are generated for.
pub fn browser_targets() -> Targets {
    Targets::from(Browsers {
        chrome: Some(80 << 16),
        edge: Some(80 << 16),
        firefox: Some(78 << 16),
        safari: Some(13 << 16),
        ios_saf: Some(13 << 16),
        ..Browsers::default()
    })
}

/// Parse, optimise and print `source` minified.
///
/// `filename` only labels errors and the source map.
pub fn minify_css(source: &str, filename: &str, opts: CssOptions) -> Result<CssOutput> {
    let targets = if opts.prefix {
        browser_targets()
    } else {
        Targets::default()
    };

    let mut sheet = StyleSheet::parse(
        source,
        ParserOptions {
            filename: filename.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| anyhow!("{filename}: {e}"))?;

    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| anyhow!("{filename}: {e}"))?;

    let mut source_map = if opts.source_map {
        let mut sm = SourceMap::new("/");
        sm.add_source(filename);
        sm.set_source_content(0, source)
            .map_err(|e| anyhow!("{filename}: source map: {e:?}"))?;
        Some(sm)
    } else {
        None
    };

    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            source_map: source_map.as_mut(),
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("{filename}: {e}"))?;

    let map = match source_map.as_mut() {
        Some(sm) => Some(
            sm.to_json(None)
                .map_err(|e| anyhow!("{filename}: source map: {e:?}"))?,
        ),
        None => None,
    };

    Ok(CssOutput {
        code: printed.code,
        map,
    })
}
