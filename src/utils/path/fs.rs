//! Path normalization utilities.
//!
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `relative_components` - UTF-8 components of a path below a root
//! - `is_temp_file` - editor artifacts that must never be synchronized

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
///
/// Removed files cannot be canonicalized, so the fallback keeps their
/// parent canonical when the parent still exists.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    if let (Some(parent), Some(name)) = (path.parent(), path.file_name())
        && let Ok(parent) = parent.canonicalize()
    {
        return parent.join(name);
    }

    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    }
}

/// Split `path` into its UTF-8 components below `root`.
///
/// Returns `None` when the path is not inside `root` or a component is not
/// valid UTF-8 (remote keys are always UTF-8).
///
/// # Example
/// ```ignore
/// relative_components(Path::new("/p/theme/snippets/a.liquid"), Path::new("/p/theme"))
///     == Some(vec!["snippets", "a.liquid"])
/// ```
pub fn relative_components<'a>(path: &'a Path, root: &Path) -> Option<Vec<&'a str>> {
    let rel = path.strip_prefix(root).ok()?;
    rel.components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect()
}

/// Check if path is a temp/backup file (editor artifacts).
pub fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
        || name == "4913"
}
