//! Path Resolution Engine.
//!
//! Pure mapping from a changed local path and event kind to what should
//! happen remotely:
//!
//! ```text
//! (path, kind) ──► root ──► { remote_key, transform, group, is_binary }
//!                       └─► Skip(reason)
//! ```
//!
//! | Root      | Rule                                                        |
//! |-----------|-------------------------------------------------------------|
//! | `styles`  | any change recompiles the single entry, fixed output key    |
//! | `scripts` | direct `.js` file = module, one-level directory = group     |
//! | `theme`   | `<dir>/<file>`, one level flattened, `templates/customers` kept |

mod layout;
mod scripts;
mod theme;

use std::fmt;
use std::path::Path;

pub use layout::Layout;
pub use theme::{INLINE_SCRIPTS_DIR, is_generated};

use crate::config::UploadConfig;
use crate::utils::path::relative_components;
use crate::watch::{EventKind, WatchRoot};

/// Transformation required before upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    None,
    /// Minify one standalone script module.
    MinifyScript,
    /// Concatenate a module group, then minify.
    BundleScripts,
    /// Compile the style entry.
    CompileStyles,
    /// Minify the script inside a liquid snippet.
    MinifyInline,
}

/// A path that maps to a remote asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub root: WatchRoot,
    pub remote_key: String,
    pub transform: Transform,
    /// Module group name for group operations.
    pub group: Option<String>,
    pub is_binary: bool,
}

impl Resolution {
    fn new(root: WatchRoot, remote_key: impl Into<String>, transform: Transform) -> Self {
        Self {
            root,
            remote_key: remote_key.into(),
            transform,
            group: None,
            is_binary: false,
        }
    }

    pub fn requires_transform(&self) -> bool {
        self.transform != Transform::None
    }

    pub fn transform_kind(&self) -> Transform {
        self.transform
    }

    pub fn is_group_operation(&self) -> bool {
        self.group.is_some()
    }
}

/// Why a path produces no remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Not under any watched root.
    OutsideRoots,
    /// The watched root directory itself.
    RootItself,
    /// A non-`.js` file in the scripts tree.
    NotAScript,
    /// Nested deeper than the remote layout allows.
    TooDeep,
    /// Top-level theme entry outside the known directories.
    UnknownThemeDir,
    /// Generated (`.min.`) file; only its deletion is synced.
    Generated,
    /// Theme directory events carry no file content.
    ThemeDirectory,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::OutsideRoots => "outside watched roots",
            Self::RootItself => "watched root itself",
            Self::NotAScript => "not a script module",
            Self::TooDeep => "nested too deep",
            Self::UnknownThemeDir => "not in a theme directory",
            Self::Generated => "generated file",
            Self::ThemeDirectory => "theme directory event",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Sync(Resolution),
    Skip(SkipReason),
}

impl Resolved {
    pub fn resolution(&self) -> Option<&Resolution> {
        match self {
            Self::Sync(resolution) => Some(resolution),
            Self::Skip(_) => None,
        }
    }
}

/// Resolves local paths against the configured layout.
#[derive(Debug, Clone)]
pub struct PathResolver {
    layout: Layout,
    upload: UploadConfig,
}

impl PathResolver {
    pub fn new(layout: Layout, upload: UploadConfig) -> Self {
        Self { layout, upload }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Resolve `path` for an event of `kind`, deriving the root from the path.
    #[cfg(test)]
    pub fn resolve(&self, path: &Path, kind: EventKind) -> Resolved {
        match self.layout.root_of(path) {
            Some(root) => self.resolve_in(root, path, kind),
            None => Resolved::Skip(SkipReason::OutsideRoots),
        }
    }

    /// Resolve `path` within a known root.
    pub fn resolve_in(&self, root: WatchRoot, path: &Path, kind: EventKind) -> Resolved {
        let Some(parts) = relative_components(path, self.layout.root_path(root)) else {
            return Resolved::Skip(SkipReason::OutsideRoots);
        };
        if parts.is_empty() {
            return Resolved::Skip(SkipReason::RootItself);
        }

        let outcome = match root {
            WatchRoot::Styles => Ok(Resolution::new(
                root,
                self.layout.style_key(),
                Transform::CompileStyles,
            )),
            WatchRoot::Scripts => scripts::resolve(&parts, kind, &self.layout.order_file),
            WatchRoot::Theme => theme::resolve(&parts, kind).map(|(key, transform)| {
                let mut resolution = Resolution::new(root, key, transform);
                resolution.is_binary = !kind.is_dir() && self.upload.is_binary(path);
                resolution
            }),
        };

        match outcome {
            Ok(resolution) => Resolved::Sync(resolution),
            Err(reason) => Resolved::Skip(reason),
        }
    }
}
