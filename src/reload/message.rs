//! Live reload message protocol.
//!
//! Frames are JSON text; the connection close itself is the reload trigger.
//!
//! - `connected`: greeting sent right after the handshake
//! - `reload`: outcome of the change that caused the close

use serde::Serialize;

use crate::dispatch::SyncOutcome;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    Connected {
        version: String,
    },
    Reload {
        /// `Uploaded`, `Deleted`, `upload failed` or `delete failed`.
        status: String,
        key: String,
        failed: bool,
    },
}

impl ReloadMessage {
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn reload(outcome: &SyncOutcome) -> Self {
        Self::Reload {
            status: outcome.log_kind.as_str().to_string(),
            key: outcome.key.clone(),
            failed: outcome.log_kind.is_failure(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }
}
