// src/transform/mod.rs

//! Pure content transforms used by the tasks. Nothing here knows about
//! configuration, destinations or the reload server.

pub mod bundle;
pub mod css;
pub mod downlevel;
pub mod html;
pub mod js_lexer;
pub mod js_minify;
pub mod sass;

pub use bundle::{BundleError, bundle, lower_module};
pub use css::{CssOptions, CssOutput, browser_targets, minify_css};
pub use downlevel::downlevel;
pub use html::{PartialError, PartialResolver, collapse_whitespace};
pub use js_minify::minify_js;
pub use sass::{compile_scss, is_partial};
