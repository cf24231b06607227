//! `themesync pull`: download one asset.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::config::SyncConfig;
use crate::log;
use crate::remote::{AssetValue, RemoteClient, StoreEndpoint};
use crate::resolve::Layout;

pub async fn run_pull(config: &SyncConfig, key: &str, output: Option<&Path>) -> Result<()> {
    let client = RemoteClient::new(StoreEndpoint::from_config(&config.store), config.throttle)
        .context("failed to create HTTP client")?;
    let asset = client
        .read_asset(key)
        .await
        .with_context(|| format!("failed to read {key}"))?;

    let target = match output {
        Some(path) => path.to_path_buf(),
        None => mirror_path(&Layout::from_config(config), &asset.key)?,
    };
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let bytes = match asset.value {
        AssetValue::Text(text) => text.into_bytes(),
        AssetValue::Binary(bytes) => bytes,
    };
    tokio::fs::write(&target, &bytes)
        .await
        .with_context(|| format!("failed to write {}", target.display()))?;

    log!("pull"; "{} → {}", asset.key, target.display());
    Ok(())
}

/// Theme mirror path of `key`; keys that would leave the theme tree are rejected.
fn mirror_path(layout: &Layout, key: &str) -> Result<PathBuf> {
    let key_path = Path::new(key);
    let contained = key_path.components().next().is_some()
        && key_path.components().all(|c| matches!(c, Component::Normal(_)));
    if !contained {
        bail!("refusing to write asset key outside the theme: {key}");
    }
    Ok(layout.theme_path(key))
}
