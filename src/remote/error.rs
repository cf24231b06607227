use thiserror::Error;

/// Remote API failures.
///
/// Status-bearing variants keep the response body for the log line.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("write rejected with status {status}: {body}")]
    WriteFailed { status: u16, body: String },

    #[error("delete rejected with status {status}: {body}")]
    DeleteFailed { status: u16, body: String },

    #[error("read rejected with status {status}: {body}")]
    ReadFailed { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("gave up after {0} redirects")]
    TooManyRedirects(usize),

    #[error("failed to write `{path}`")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("request dropped before completion")]
    Dropped,
}

impl RemoteError {
    /// HTTP status of a rejected request.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::WriteFailed { status, .. }
            | Self::DeleteFailed { status, .. }
            | Self::ReadFailed { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<super::Dropped> for RemoteError {
    fn from(_: super::Dropped) -> Self {
        Self::Dropped
    }
}
