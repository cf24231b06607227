//! `[paths]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! scripts = "src/scripts"     # Script modules and module groups
//! styles = "src/styles"       # Style sources (one compiled entry)
//! theme = "theme"             # Theme tree mirrored to the remote store
//! ```
//!
//! All paths are relative to `root`, which defaults to the directory
//! containing `themesync.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::types::{ConfigDiagnostics, FieldPath};
use crate::utils::path::normalize_path;

/// Watched source directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Base project path (relative to the config file, `~` expanded).
    pub root: Option<PathBuf>,
    pub scripts: PathBuf,
    pub styles: PathBuf,
    pub theme: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: None,
            scripts: PathBuf::from("src/scripts"),
            styles: PathBuf::from("src/styles"),
            theme: PathBuf::from("theme"),
        }
    }
}

impl PathsConfig {
    pub const SCRIPTS: FieldPath = FieldPath::new("paths.scripts");
    pub const STYLES: FieldPath = FieldPath::new("paths.styles");
    pub const THEME: FieldPath = FieldPath::new("paths.theme");

    /// Resolve the project root given the config file directory.
    pub fn resolve_root(&self, config_dir: &Path) -> PathBuf {
        match &self.root {
            Some(root) => {
                let expanded = shellexpand::tilde(&root.to_string_lossy()).into_owned();
                normalize_path(&config_dir.join(expanded))
            }
            None => normalize_path(config_dir),
        }
    }

    /// Make every watched directory absolute under `root`.
    pub fn normalize(&mut self, root: &Path) {
        self.root = Some(root.to_path_buf());
        self.scripts = normalize_path(&root.join(&self.scripts));
        self.styles = normalize_path(&root.join(&self.styles));
        self.theme = normalize_path(&root.join(&self.theme));
    }

    /// Missing watched directories are start-up errors.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for (field, dir) in [
            (Self::SCRIPTS, &self.scripts),
            (Self::STYLES, &self.styles),
            (Self::THEME, &self.theme),
        ] {
            if !dir.is_dir() {
                diag.error(field, format!("directory not found: {}", dir.display()));
            }
        }
    }
}
