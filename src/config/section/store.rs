//! `[store]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [store]
//! host = "my-shop.example.com"     # Admin/storefront hostname
//! theme_id = 120932                # Theme receiving the assets
//! api_key = "..."                  # or THEMESYNC_API_KEY
//! password = "..."                 # or THEMESYNC_PASSWORD
//! preview_host = "preview.example.com"   # Optional storefront host for the proxy
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::types::{ConfigDiagnostics, FieldPath};

/// Environment variable overriding `store.api_key`.
pub const ENV_API_KEY: &str = "THEMESYNC_API_KEY";
/// Environment variable overriding `store.password`.
pub const ENV_PASSWORD: &str = "THEMESYNC_PASSWORD";

/// Remote store settings.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store hostname without scheme.
    pub host: String,

    /// Theme identifier the asset endpoint is keyed by.
    pub theme_id: u64,

    /// Basic-auth user.
    pub api_key: String,

    /// Basic-auth password.
    pub password: String,

    /// Storefront host used by the proxy (defaults to `host`).
    pub preview_host: Option<String>,

    /// Override for the admin API base URL (defaults to `https://{host}/admin`).
    pub api_base: Option<String>,
}

// Credentials never reach logs.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("host", &self.host)
            .field("theme_id", &self.theme_id)
            .field("api_key", &"***")
            .field("password", &"***")
            .field("preview_host", &self.preview_host)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl StoreConfig {
    pub const HOST: FieldPath = FieldPath::new("store.host");
    pub const THEME_ID: FieldPath = FieldPath::new("store.theme_id");
    pub const API_KEY: FieldPath = FieldPath::new("store.api_key");
    pub const PASSWORD: FieldPath = FieldPath::new("store.password");

    /// Apply credential overrides from the environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply credential overrides from an arbitrary lookup.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            self.api_key = key;
        }
        if let Some(password) = lookup(ENV_PASSWORD).filter(|v| !v.is_empty()) {
            self.password = password;
        }
    }

    /// Admin API base URL without trailing slash.
    pub fn api_base(&self) -> String {
        match &self.api_base {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}/admin", self.host),
        }
    }

    /// Storefront base URL used for page fetches.
    pub fn storefront_base(&self) -> String {
        let host = self.preview_host.as_deref().unwrap_or(&self.host);
        if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("https://{host}")
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.host.trim().is_empty() {
            diag.error_with_hint(Self::HOST, "store host is required", "e.g. host = \"my-shop.example.com\"");
        } else if self.host.contains("://") {
            diag.error(Self::HOST, "store host must not include a scheme");
        }
        if self.theme_id == 0 {
            diag.error(Self::THEME_ID, "theme_id is required");
        }
        if self.api_key.is_empty() {
            diag.error_with_hint(Self::API_KEY, "api_key is required", format!("or set {ENV_API_KEY}"));
        }
        if self.password.is_empty() {
            diag.error_with_hint(Self::PASSWORD, "password is required", format!("or set {ENV_PASSWORD}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    use super::*;

    #[test]
    fn test_store_urls() {
        let config = test_parse_config("");
        assert_eq!(config.store.api_base(), "https://shop.example.com/admin");
        assert_eq!(config.store.storefront_base(), "https://shop.example.com");

        let config = test_parse_config(
            "[store]\nhost = \"a.example.com\"\ntheme_id = 1\npreview_host = \"b.example.com\"\napi_base = \"http://127.0.0.1:9000/\"",
        );
        assert_eq!(config.store.api_base(), "http://127.0.0.1:9000");
        assert_eq!(config.store.storefront_base(), "https://b.example.com");
    }

    #[test]
    fn test_env_overrides_credentials() {
        let mut store = StoreConfig {
            api_key: "file-key".into(),
            ..Default::default()
        };
        store.apply_env_with(|key| match key {
            ENV_PASSWORD => Some("env-pass".into()),
            ENV_API_KEY => Some(String::new()),
            _ => None,
        });
        assert_eq!(store.api_key, "file-key");
        assert_eq!(store.password, "env-pass");
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let store = StoreConfig {
            password: "hunter2".into(),
            ..Default::default()
        };
        assert!(!format!("{store:?}").contains("hunter2"));
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut diag = ConfigDiagnostics::new();
        StoreConfig::default().validate(&mut diag);
        assert_eq!(diag.len(), 4);
    }
}
