//! Style entry compilation.

use std::path::Path;

use anyhow::Result;

use super::minify::minify_css;
use crate::config::StylesConfig;
use crate::debug;
use crate::utils::exec::{Cmd, SASS_NOISE};

/// Compile `<styles_root>/<entry>` and return the CSS.
///
/// The configured compiler receives the entry path as its last argument
/// and writes CSS to stdout. With `minify`, lightningcss post-processes it;
/// a failing post-pass keeps the compiler output.
pub fn compile_styles(config: &StylesConfig, styles_root: &Path) -> Result<String> {
    let entry = styles_root.join(&config.entry);
    if !entry.is_file() {
        anyhow::bail!("style entry {} not found", entry.display());
    }

    let css = Cmd::from_slice(&config.compiler)
        .arg(&entry)
        .cwd(styles_root)
        .quiet(SASS_NOISE)
        .stdout_text()?;

    if !config.minify {
        return Ok(css);
    }
    match minify_css(&css) {
        Ok(min) => Ok(min),
        Err(e) => {
            debug!("style"; "post-minify skipped: {:#}", e);
            Ok(css)
        }
    }
}
