//! Theme root: closed table of top-level directory roles.

use super::{SkipReason, Transform};
use crate::watch::EventKind;

/// How a top-level theme directory treats one level of nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirRole {
    /// `<dir>/<sub>/<file>` uploads as `<dir>/<file>`.
    Flatten,
    /// Only direct files are synced.
    Flat,
}

const THEME_DIRS: &[(&str, DirRole)] = &[
    ("assets", DirRole::Flatten),
    ("sections", DirRole::Flatten),
    ("snippets", DirRole::Flatten),
    ("templates", DirRole::Flatten),
    ("layout", DirRole::Flat),
    ("config", DirRole::Flat),
    ("locales", DirRole::Flat),
];

/// The one nesting the remote platform keeps.
const PRESERVED: (&str, &str) = ("templates", "customers");

/// Local-only directory of snippets whose scripts are minified before upload.
pub const INLINE_SCRIPTS_DIR: (&str, &str) = ("snippets", "inline-scripts");

fn role(dir: &str) -> Option<DirRole> {
    THEME_DIRS
        .iter()
        .find(|(name, _)| *name == dir)
        .map(|(_, role)| *role)
}

/// Generated (already minified) file name.
pub fn is_generated(name: &str) -> bool {
    name.contains(".min.")
}

pub(super) fn resolve(parts: &[&str], kind: EventKind) -> Result<(String, Transform), SkipReason> {
    if kind.is_dir() {
        return Err(SkipReason::ThemeDirectory);
    }

    match parts {
        [] => Err(SkipReason::RootItself),
        [_] => Err(SkipReason::UnknownThemeDir),

        [dir, file] => {
            role(dir).ok_or(SkipReason::UnknownThemeDir)?;
            if *dir == "assets" && is_generated(file) && kind != EventKind::Unlink {
                return Err(SkipReason::Generated);
            }
            Ok((format!("{dir}/{file}"), Transform::None))
        }

        [dir, sub, file] => {
            let role = role(dir).ok_or(SkipReason::UnknownThemeDir)?;
            if (*dir, *sub) == PRESERVED {
                return Ok((format!("{dir}/{sub}/{file}"), Transform::None));
            }
            if (*dir, *sub) == INLINE_SCRIPTS_DIR {
                if is_generated(file) {
                    return Err(SkipReason::Generated);
                }
                let transform = if kind == EventKind::Unlink {
                    Transform::None
                } else {
                    Transform::MinifyInline
                };
                return Ok((format!("{dir}/{file}"), transform));
            }
            if *dir == "assets" && is_generated(file) && kind != EventKind::Unlink {
                return Err(SkipReason::Generated);
            }
            match role {
                DirRole::Flatten => Ok((format!("{dir}/{file}"), Transform::None)),
                DirRole::Flat => Err(SkipReason::TooDeep),
            }
        }

        _ => Err(SkipReason::TooDeep),
    }
}
