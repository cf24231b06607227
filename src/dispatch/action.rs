//! What a resolved change turns into.

use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use crate::resolve::{Layout, PathResolver, Resolution, Resolved, Transform};
use crate::task::LogKind;
use crate::watch::{EventKind, WatchRoot};

/// One remote operation, with any local transform it needs first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Minify a standalone module.
    UploadScript { source: PathBuf, key: String },
    /// Bundle and minify a module group.
    PackageGroup { group: String, key: String },
    /// Recompile the style entry.
    CompileStyles { key: String },
    UploadThemeFile {
        source: PathBuf,
        key: String,
        is_binary: bool,
    },
    /// Minify the scripts inside a snippet before upload.
    UploadInlineScript { source: PathBuf, key: String },
    /// Remove `key` remotely, and the generated local copy if any.
    Delete {
        key: String,
        artifact: Option<PathBuf>,
    },
}

impl Action {
    pub fn key(&self) -> &str {
        match self {
            Self::UploadScript { key, .. }
            | Self::PackageGroup { key, .. }
            | Self::CompileStyles { key }
            | Self::UploadThemeFile { key, .. }
            | Self::UploadInlineScript { key, .. }
            | Self::Delete { key, .. } => key,
        }
    }

    /// Source tree the action comes from.
    pub fn category(&self) -> &'static str {
        match self {
            Self::UploadScript { .. } | Self::PackageGroup { .. } => "scripts",
            Self::CompileStyles { .. } => "styles",
            Self::UploadThemeFile { .. } | Self::UploadInlineScript { .. } | Self::Delete { .. } => {
                "theme"
            }
        }
    }

    /// Label reported when the action succeeds.
    pub fn log_kind(&self) -> LogKind {
        match self {
            Self::Delete { .. } => LogKind::Deleted,
            _ => LogKind::Uploaded,
        }
    }
}

/// Map a resolution to an action. `None` means nothing to do.
pub(super) fn action_for(
    layout: &Layout,
    resolution: Resolution,
    path: &Path,
    kind: EventKind,
) -> Option<Action> {
    let Resolution {
        remote_key: key,
        transform,
        group,
        is_binary,
        ..
    } = resolution;

    let action = match transform {
        Transform::BundleScripts => {
            let group = group?;
            let group_dir = layout.group_dir(&group);
            if kind == EventKind::UnlinkDir && path == group_dir {
                Action::Delete {
                    artifact: Some(layout.theme_path(&key)),
                    key,
                }
            } else if !group_dir.is_dir() {
                // The group itself is going away; its unlinkDir deletes the bundle.
                return None;
            } else {
                Action::PackageGroup { group, key }
            }
        }
        Transform::MinifyScript if kind == EventKind::Unlink => Action::Delete {
            artifact: Some(layout.theme_path(&key)),
            key,
        },
        Transform::MinifyScript => Action::UploadScript {
            source: path.to_path_buf(),
            key,
        },
        Transform::CompileStyles => Action::CompileStyles { key },
        Transform::MinifyInline => Action::UploadInlineScript {
            source: path.to_path_buf(),
            key,
        },
        Transform::None if kind == EventKind::Unlink => Action::Delete {
            key,
            artifact: None,
        },
        Transform::None => Action::UploadThemeFile {
            source: path.to_path_buf(),
            key,
            is_binary,
        },
    };
    Some(action)
}

/// Every upload a full push performs, in a stable order:
/// script modules and groups, the stylesheet, then the theme tree.
pub fn full_sync_actions(resolver: &PathResolver, style_entry: &Path) -> Vec<Action> {
    let layout = resolver.layout();
    let mut actions = Vec::new();

    for entry in WalkDir::new(&layout.scripts)
        .min_depth(1)
        .max_depth(1)
        .sort(true)
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        let kind = if entry.file_type().is_dir() {
            EventKind::AddDir
        } else {
            EventKind::Add
        };
        let resolved = resolver.resolve_in(WatchRoot::Scripts, &path, kind);
        push_resolved(layout, resolved, &path, kind, &mut actions);
    }

    if style_entry.is_file() {
        actions.push(Action::CompileStyles {
            key: layout.style_key(),
        });
    }

    for path in WalkDir::new(&layout.theme)
        .sort(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
    {
        let resolved = resolver.resolve_in(WatchRoot::Theme, &path, EventKind::Add);
        push_resolved(layout, resolved, &path, EventKind::Add, &mut actions);
    }

    actions
}

fn push_resolved(
    layout: &Layout,
    resolved: Resolved,
    path: &Path,
    kind: EventKind,
    actions: &mut Vec<Action>,
) {
    match resolved {
        Resolved::Sync(resolution) => actions.extend(action_for(layout, resolution, path, kind)),
        Resolved::Skip(reason) => crate::debug!("push"; "skip {}: {}", path.display(), reason),
    }
}
