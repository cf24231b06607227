//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from `start`.
///
/// Walks up parent directories until finding `config_name`.
/// Returns the absolute path to the config file if found.
///
/// ```text
/// /home/user/shop/src/scripts/   ← start
/// /home/user/shop/themesync.toml ← found!
/// ```
pub fn find_config_file_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

/// [`find_config_file_from`] starting at the current directory.
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_file_from(&cwd, config_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_walks_upward() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("src/scripts/vendor");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join("themesync.toml"), "").unwrap();

        let found = find_config_file_from(&nested, Path::new("themesync.toml")).unwrap();
        assert_eq!(found, temp.path().join("themesync.toml"));
    }

    #[test]
    fn test_find_config_missing() {
        let temp = TempDir::new().unwrap();
        assert!(find_config_file_from(temp.path(), Path::new("no-such-config-8d1f.toml")).is_none());
    }

    #[test]
    fn test_find_config_absolute() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        assert!(find_config_file_from(temp.path(), &path).is_none());
        fs::write(&path, "").unwrap();
        assert_eq!(find_config_file_from(Path::new("/"), &path), Some(path));
    }
}
