//! Scripts root: standalone modules and one-level module groups.

use super::{Resolution, SkipReason, Transform};
use crate::watch::{EventKind, WatchRoot};

/// Remote key of a standalone module or a group bundle.
pub(super) fn bundle_key(name: &str) -> String {
    format!("assets/{name}.min.js")
}

pub(super) fn resolve(
    parts: &[&str],
    kind: EventKind,
    order_file: &str,
) -> Result<Resolution, SkipReason> {
    match parts {
        [] => Err(SkipReason::RootItself),

        // Group directory created or removed.
        [group] if kind.is_dir() => Ok(group_resolution(group)),

        // Standalone module.
        [file] => {
            let stem = file.strip_suffix(".js").ok_or(SkipReason::NotAScript)?;
            Ok(Resolution::new(
                WatchRoot::Scripts,
                bundle_key(stem),
                Transform::MinifyScript,
            ))
        }

        // Member of a group: a module, the order manifest, or a sub-collection entry.
        [group, rest @ ..] => {
            let name = rest.last().copied().unwrap_or_default();
            if kind.is_dir() || name == order_file || name.ends_with(".js") {
                Ok(group_resolution(group))
            } else {
                Err(SkipReason::NotAScript)
            }
        }
    }
}

fn group_resolution(group: &str) -> Resolution {
    let mut resolution = Resolution::new(
        WatchRoot::Scripts,
        bundle_key(group),
        Transform::BundleScripts,
    );
    resolution.group = Some(group.to_string());
    resolution
}
