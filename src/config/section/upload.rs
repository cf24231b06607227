//! `[upload]` section configuration.
//!
//! ```toml
//! [upload]
//! binary_extensions = ["png", "jpg", "woff2"]   # Uploaded as base64 attachments
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Upload encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Extensions (without dot, case-insensitive) sent as binary attachments.
    pub binary_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        let exts = [
            "png", "jpg", "jpeg", "gif", "webp", "ico", "woff", "woff2", "ttf", "otf", "eot",
            "mp4", "webm", "pdf", "zip",
        ];
        Self {
            binary_extensions: exts.iter().map(|e| (*e).to_string()).collect(),
        }
    }
}

impl UploadConfig {
    /// Whether `path` must be uploaded as a base64 attachment.
    pub fn is_binary(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.binary_extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
    }
}
