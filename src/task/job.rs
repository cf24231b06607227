//! Typed context threaded through upload and delete chains.

use std::fmt;
use std::path::PathBuf;

/// Outcome label of a finished sync chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Uploaded,
    Deleted,
    UploadFailed,
    DeleteFailed,
}

impl LogKind {
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::UploadFailed | Self::DeleteFailed)
    }

    /// Failure flavor of this kind.
    pub const fn failed(self) -> Self {
        match self {
            Self::Uploaded | Self::UploadFailed => Self::UploadFailed,
            Self::Deleted | Self::DeleteFailed => Self::DeleteFailed,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uploaded => "Uploaded",
            Self::Deleted => "Deleted",
            Self::UploadFailed => "upload failed",
            Self::DeleteFailed => "delete failed",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context for "read a file, then upload it".
///
/// `content` is empty until the read step fills it; binary content is
/// already base64-encoded.
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub key: String,
    pub source: PathBuf,
    pub is_binary: bool,
    pub log_kind: LogKind,
    pub content: Option<String>,
}

impl UploadJob {
    pub fn new(key: impl Into<String>, source: impl Into<PathBuf>, is_binary: bool) -> Self {
        Self {
            key: key.into(),
            source: source.into(),
            is_binary,
            log_kind: LogKind::Uploaded,
            content: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_kind_failure_flavor() {
        assert_eq!(LogKind::Uploaded.failed(), LogKind::UploadFailed);
        assert_eq!(LogKind::Deleted.failed(), LogKind::DeleteFailed);
        assert!(LogKind::DeleteFailed.is_failure());
        assert!(!LogKind::Uploaded.is_failure());
        assert_eq!(LogKind::UploadFailed.to_string(), "upload failed");
    }
}
