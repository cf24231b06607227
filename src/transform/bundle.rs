//! Module-group collection and concatenation.
//!
//! Without an order manifest, the group's direct `.js` files are taken in
//! lexical order. With one, the manifest is authoritative:
//!
//! ```text
//! _script-order.js:   vendor, b, a
//!
//! vendor   → no direct file named `vendor(.js)` → sub-collection vendor/**.js (lexical)
//! b        → b.js
//! a        → a.js
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jwalk::WalkDir;

use crate::logger::status_warning;

/// Concatenation separator; guards against files missing a trailing `;`.
const SEPARATOR: &str = ";\n";

/// Split a manifest into entry names (comma- or line-separated).
pub fn parse_manifest(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("//"))
        .flat_map(|line| line.split(','))
        .map(|entry| entry.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_script(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "js")
}

/// Direct `.js` files of `dir`, lexically sorted.
fn direct_scripts(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_script(path))
        .collect();
    files.sort();
    Ok(files)
}

/// Every `.js` file below `dir`, lexically sorted by path.
fn recursive_scripts(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<_> = WalkDir::new(dir)
        .skip_hidden(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path())
        .filter(|path| is_script(path))
        .collect();
    files.sort();
    files
}

/// Files of a module group in concatenation order.
pub fn collect_group(group_dir: &Path, order_file: &str) -> Result<Vec<PathBuf>> {
    let manifest = group_dir.join(order_file);
    let direct: Vec<_> = direct_scripts(group_dir)?
        .into_iter()
        .filter(|path| *path != manifest)
        .collect();

    if !manifest.is_file() {
        return Ok(direct);
    }

    let text = fs::read_to_string(&manifest)
        .with_context(|| format!("failed to read {}", manifest.display()))?;

    let mut ordered: Vec<PathBuf> = Vec::new();
    for entry in parse_manifest(&text) {
        let file = direct.iter().find(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            name == entry || name.strip_suffix(".js") == Some(entry.as_str())
        });

        let batch = match file {
            Some(file) => vec![file.clone()],
            None => {
                let sub = group_dir.join(&entry);
                if !sub.is_dir() {
                    status_warning(&format!(
                        "order entry `{entry}` in {} matches nothing, skipped",
                        manifest.display()
                    ));
                    continue;
                }
                recursive_scripts(&sub)
            }
        };

        for path in batch {
            if !ordered.contains(&path) {
                ordered.push(path);
            }
        }
    }
    Ok(ordered)
}

/// Concatenate `files` with `;\n` separators.
pub fn concat(files: &[PathBuf]) -> Result<String> {
    let mut parts = Vec::with_capacity(files.len());
    for file in files {
        let text = fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        parts.push(text);
    }
    Ok(parts.join(SEPARATOR))
}

/// Collect and concatenate a module group.
pub fn bundle_group(group_dir: &Path, order_file: &str) -> Result<String> {
    let files = collect_group(group_dir, order_file)?;
    if files.is_empty() {
        anyhow::bail!("module group {} has no scripts", group_dir.display());
    }
    concat(&files)
}
