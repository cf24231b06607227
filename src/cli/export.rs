//! `themesync export`: dump a remote resource collection as JSON.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::config::SyncConfig;
use crate::log;
use crate::remote::{RemoteClient, ResourceType, StoreEndpoint};

pub async fn run_export(
    config: &SyncConfig,
    resource_type: &str,
    fields: &[String],
    metafields: bool,
    output: Option<&Path>,
) -> Result<()> {
    let client = RemoteClient::new(StoreEndpoint::from_config(&config.store), config.throttle)
        .context("failed to create HTTP client")?;
    let resource = ResourceType::new(resource_type);

    let mut items = client
        .read_all_resources(&resource, fields)
        .await
        .with_context(|| format!("failed to read {}", resource.plural()))?;

    if metafields {
        attach_metafields(&client, &resource, &mut items).await?;
    }

    let json = serde_json::to_string_pretty(&items)?;
    match output {
        Some(path) => {
            tokio::fs::write(path, format!("{json}\n"))
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            log!("export"; "{} {} → {}", items.len(), resource.plural(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Add a `metafields` array to every item that has an id.
async fn attach_metafields(
    client: &RemoteClient,
    resource: &ResourceType,
    items: &mut [Value],
) -> Result<()> {
    for item in items.iter_mut() {
        let Some(id) = item.get("id").and_then(Value::as_u64) else {
            continue;
        };
        let metafields = client
            .read_metafields(resource, id)
            .await
            .with_context(|| format!("failed to read metafields of {} {id}", resource.singular()))?;
        if let Value::Object(map) = item {
            map.insert("metafields".into(), Value::Array(metafields));
        }
    }
    Ok(())
}
