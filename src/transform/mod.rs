//! Pre-upload transformations.
//!
//! | Module   | Purpose                                                |
//! |----------|--------------------------------------------------------|
//! | `minify` | JS/CSS minification (oxc, lightningcss, or external)   |
//! | `bundle` | module-group collection and concatenation              |
//! | `style`  | style entry compilation via the configured compiler    |
//!
//! All functions here block; async callers run them on a blocking thread.

pub mod bundle;
pub mod minify;
pub mod style;

pub use bundle::{bundle_group, collect_group};
pub use minify::{ScriptMinifier, minify_css, minify_js};
pub use style::compile_styles;
