use std::path::{Path, PathBuf};

use crate::config::SyncConfig;
use crate::watch::WatchRoot;

/// Absolute watched roots plus the names the resolver needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub scripts: PathBuf,
    pub styles: PathBuf,
    pub theme: PathBuf,
    /// Order manifest file name inside a module group.
    pub order_file: String,
    /// Compiled stylesheet name under `assets/`.
    pub style_output: String,
}

impl Layout {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            scripts: config.paths.scripts.clone(),
            styles: config.paths.styles.clone(),
            theme: config.paths.theme.clone(),
            order_file: config.scripts.order_file.clone(),
            style_output: config.styles.output.clone(),
        }
    }

    pub fn root_path(&self, root: WatchRoot) -> &Path {
        match root {
            WatchRoot::Scripts => &self.scripts,
            WatchRoot::Styles => &self.styles,
            WatchRoot::Theme => &self.theme,
        }
    }

    /// Root containing `path`; the deepest root wins when roots nest.
    pub fn root_of(&self, path: &Path) -> Option<WatchRoot> {
        [WatchRoot::Scripts, WatchRoot::Styles, WatchRoot::Theme]
            .into_iter()
            .filter(|root| path.starts_with(self.root_path(*root)))
            .max_by_key(|root| self.root_path(*root).components().count())
    }

    pub fn style_key(&self) -> String {
        format!("assets/{}", self.style_output)
    }

    /// Local mirror of a remote key inside the theme tree.
    pub fn theme_path(&self, key: &str) -> PathBuf {
        self.theme.join(key)
    }

    /// Module group directory.
    pub fn group_dir(&self, group: &str) -> PathBuf {
        self.scripts.join(group)
    }
}
