//! Asset write seam and the read-then-upload chain.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::RemoteError;
use crate::task::{TaskError, UploadJob, run_sequence, task};

/// Remote asset writes used by the dispatcher.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Create or fully replace `key`. Binary content is base64.
    async fn write_asset(&self, key: &str, content: &str, is_binary: bool)
    -> Result<(), RemoteError>;

    /// Remove `key`; repeated deletes surface whatever status the store returns.
    async fn delete_asset(&self, key: &str) -> Result<(), RemoteError>;
}

/// Decoded asset payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetValue {
    Text(String),
    Binary(Vec<u8>),
}

/// A single asset read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAsset {
    pub key: String,
    pub value: AssetValue,
}

impl RemoteAsset {
    /// Decode the `{"asset": {...}}` envelope.
    pub fn from_envelope(body: &serde_json::Value) -> Result<Self, RemoteError> {
        let asset = body
            .get("asset")
            .ok_or_else(|| RemoteError::InvalidResponse("missing `asset` object".into()))?;
        let key = asset
            .get("key")
            .and_then(|k| k.as_str())
            .ok_or_else(|| RemoteError::InvalidResponse("asset without key".into()))?
            .to_string();

        let value = if let Some(text) = asset.get("value").and_then(|v| v.as_str()) {
            AssetValue::Text(text.to_string())
        } else if let Some(encoded) = asset.get("attachment").and_then(|v| v.as_str()) {
            let bytes = STANDARD
                .decode(encoded)
                .map_err(|e| RemoteError::InvalidResponse(format!("bad attachment for {key}: {e}")))?;
            AssetValue::Binary(bytes)
        } else {
            return Err(RemoteError::InvalidResponse(format!(
                "asset {key} has neither value nor attachment"
            )));
        };

        Ok(Self { key, value })
    }
}

/// Read `job.source` into `job.content`, base64-encoding binary files.
pub async fn read_source(mut job: UploadJob) -> Result<UploadJob, TaskError> {
    let bytes = tokio::fs::read(&job.source)
        .await
        .map_err(|e| TaskError::io(format!("failed to read {}", job.source.display()), e))?;

    let content = if job.is_binary {
        STANDARD.encode(&bytes)
    } else {
        String::from_utf8(bytes).map_err(|_| {
            TaskError::failed(format!(
                "{} is not valid UTF-8, add its extension to upload.binary_extensions",
                job.source.display()
            ))
        })?
    };

    job.content = Some(content);
    Ok(job)
}

/// "Read file, then upload": a two-step sequence over `store`.
pub async fn read_file_then_upload(
    store: Arc<dyn AssetStore>,
    job: UploadJob,
) -> Result<UploadJob, TaskError> {
    let upload = task(move |mut job: UploadJob| async move {
        let content = job
            .content
            .take()
            .ok_or_else(|| TaskError::failed(format!("no content read for {}", job.key)))?;
        store.write_asset(&job.key, &content, job.is_binary).await?;
        Ok(job)
    });

    run_sequence(vec![task(read_source), upload], job).await
}
