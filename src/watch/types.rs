use std::fmt;
use std::path::PathBuf;

/// What happened at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Add,
    Change,
    Unlink,
    AddDir,
    UnlinkDir,
}

impl EventKind {
    pub const fn is_dir(self) -> bool {
        matches!(self, Self::AddDir | Self::UnlinkDir)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Change => "change",
            Self::Unlink => "unlink",
            Self::AddDir => "addDir",
            Self::UnlinkDir => "unlinkDir",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Watched source tree an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchRoot {
    Scripts,
    Styles,
    Theme,
}

impl WatchRoot {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scripts => "script",
            Self::Styles => "style",
            Self::Theme => "theme",
        }
    }
}

/// A debounced file-system change, tagged with its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub root: WatchRoot,
    pub kind: EventKind,
    /// Absolute path.
    pub path: PathBuf,
}

impl WatchEvent {
    pub fn new(root: WatchRoot, kind: EventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            root,
            kind,
            path: path.into(),
        }
    }
}
