//! `[scripts]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [scripts]
//! order_file = "_script-order.js"   # Order manifest inside a module group
//! ignore_window_ms = 1000           # Suppress file events after a directory event
//! minifier = ["terser", "--compress", "--mangle"]   # Optional external minifier (stdin → stdout)
//! ```
//!
//! Without `minifier`, scripts are minified in-process.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::types::{ConfigDiagnostics, FieldPath};

/// Script module settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// File name of the order manifest inside a module group.
    pub order_file: String,

    /// Window after a directory event during which file events are ignored.
    pub ignore_window_ms: u64,

    /// External minifier command reading stdin and writing stdout.
    pub minifier: Option<Vec<String>>,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            order_file: "_script-order.js".to_string(),
            ignore_window_ms: 1000,
            minifier: None,
        }
    }
}

impl ScriptsConfig {
    pub const ORDER_FILE: FieldPath = FieldPath::new("scripts.order_file");
    pub const MINIFIER: FieldPath = FieldPath::new("scripts.minifier");

    pub fn ignore_window(&self) -> Duration {
        Duration::from_millis(self.ignore_window_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.order_file.is_empty() || self.order_file.contains('/') {
            diag.error(Self::ORDER_FILE, "order_file must be a plain file name");
        }
        if let Some(cmd) = &self.minifier
            && cmd.is_empty()
        {
            diag.error_with_hint(Self::MINIFIER, "minifier command is empty", "remove it to use the built-in minifier");
        }
    }
}
