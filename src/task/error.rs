use std::time::Duration;

use thiserror::Error;

use crate::remote::RemoteError;

/// Reason a task chain or batch stopped.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {}s", .0.as_secs_f32())]
    TimedOut(Duration),

    #[error("task aborted: {0}")]
    Aborted(String),
}

impl TaskError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self {
        Self::Failed(format!("{err:#}"))
    }
}
