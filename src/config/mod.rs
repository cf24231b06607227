//! Project configuration management for `themesync.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # One file per TOML section
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! ├── util.rs        # Config file discovery
//! └── mod.rs         # SyncConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section      | Purpose                                       |
//! |--------------|-----------------------------------------------|
//! | `[store]`    | Remote store host, theme id, credentials      |
//! | `[paths]`    | Project root and watched directories          |
//! | `[scripts]`  | Script module groups and minifier             |
//! | `[styles]`   | Style entry, compiler, output asset           |
//! | `[throttle]` | Leaky-bucket request budget                   |
//! | `[upload]`   | Binary attachment allowlist                   |
//! | `[serve]`    | Local proxy and live-reload server            |

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    PathsConfig, ScriptsConfig, ServeConfig, StoreConfig, StylesConfig, ThrottleConfig,
    UploadConfig,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::{Cli, Commands},
    log,
    utils::path::normalize_path,
};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing themesync.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub scripts: ScriptsConfig,

    #[serde(default)]
    pub styles: StylesConfig,

    #[serde(default)]
    pub throttle: ThrottleConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub serve: ServeConfig,
}

impl SyncConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// Searches upward from cwd for the config file; the project root
    /// defaults to the config file's parent directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let Some(config_path) = find_config_file(&cli.config) else {
            bail!(ConfigError::Validation(format!(
                "config file `{}` not found in this directory or any parent",
                cli.config.display()
            )));
        };

        let mut config = Self::from_path(&config_path)?;
        config.config_path = normalize_path(&config_path);
        config.finalize(cli);
        config.validate(&cli.command)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            let mut diag = ConfigDiagnostics::new();
            diag.unknown_fields(ignored);
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_else(|| path.to_string_lossy());
            diag.print_warnings(&name);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Finalize configuration after loading.
    fn finalize(&mut self, cli: &Cli) {
        let config_dir = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let root = self.paths.resolve_root(&config_dir);
        self.paths.normalize(&root);
        self.root = root;

        self.store.apply_env();
        self.apply_command_options(cli);
    }

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        if let Commands::Watch { port, no_proxy } = &cli.command {
            Self::update_option(&mut self.serve.port, port.as_ref());
            if *no_proxy {
                self.serve.proxy = false;
            }
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Join a path with the project root.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Scratch directory for fetched storefront pages.
    pub fn cache_dir(&self) -> PathBuf {
        self.root_join(".themesync")
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration for the current command.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self, command: &Commands) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.store.validate(&mut diag);
        self.throttle.validate(&mut diag);

        // Remote-only commands do not touch the watched roots.
        if matches!(command, Commands::Watch { .. } | Commands::Push { .. }) {
            self.paths.validate(&mut diag);
            self.scripts.validate(&mut diag);
            self.styles.validate(&mut diag);
        }
        if matches!(command, Commands::Watch { .. }) {
            self.serve.validate(&mut diag);
        }

        if diag.has_errors() {
            log!("config"; "{} problem(s) in {}", diag.len(), self.config_path.display());
        }

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config with a minimal `[store]` section unless `extra` brings its own.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(extra: &str) -> SyncConfig {
    let config = if extra.contains("[store]") {
        extra.to_string()
    } else {
        format!("[store]\nhost = \"shop.example.com\"\ntheme_id = 42\n{extra}")
    };
    let (parsed, ignored) = SyncConfig::parse_with_ignored(&config).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_from_str_invalid_toml() {
        let result = SyncConfig::parse_with_ignored("[store\nhost = \"x\"");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_sync_config_default() {
        let config = SyncConfig::default();
        assert_eq!(config.config_path, PathBuf::new());
        assert_eq!(config.throttle.bucket_limit(), 38);
        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.scripts.order_file, "_script-order.js");
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[store]\nhost = \"a\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = SyncConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.store.host, "a");
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_finalize_resolves_paths_and_cli_overrides() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = normalize_path(temp.path());
        for dir in ["src/scripts", "src/styles", "theme"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        let config_path = root.join("themesync.toml");
        fs::write(
            &config_path,
            "[store]\nhost = \"shop.example.com\"\ntheme_id = 7\napi_key = \"k\"\npassword = \"p\"\n[styles]\ncompiler = [\"cat\"]",
        )
        .unwrap();

        let cli = Cli::parse_from(["themesync", "watch", "--port", "4000", "--no-proxy"]);
        let mut config = SyncConfig::from_path(&config_path).unwrap();
        config.config_path = config_path;
        config.finalize(&cli);

        assert_eq!(config.root, root);
        assert_eq!(config.paths.theme, root.join("theme"));
        assert_eq!(config.serve.port, 4000);
        assert!(!config.serve.proxy);
        assert!(config.validate(&cli.command).is_ok());
    }

    #[test]
    fn test_validate_reports_missing_dirs_only_when_watching() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut config = test_parse_config("");
        config.store.api_key = "k".into();
        config.store.password = "p".into();
        config.paths.normalize(temp.path());

        let export = Commands::Export {
            resource_type: "product".into(),
            fields: vec![],
            metafields: false,
            output: None,
        };
        assert!(config.validate(&export).is_ok());
        let pull = Commands::Pull {
            key: "layout/theme.liquid".into(),
            output: None,
        };
        assert!(config.validate(&pull).is_ok());
        assert!(config.validate(&Commands::Push { timeout: 60 }).is_err());
    }
}
