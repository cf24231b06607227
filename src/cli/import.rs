//! `themesync import`: create or update resources from exported JSON.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;

use crate::config::SyncConfig;
use crate::logger::status_success;
use crate::remote::{RemoteClient, ResourceType, StoreEndpoint};

/// Items with an `id` are updated, the rest created. A `metafields` array
/// on an item is written after the item itself. Stops at the first error.
pub async fn run_import(config: &SyncConfig, resource_type: &str, input: &Path) -> Result<()> {
    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;
    let items: Vec<Value> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array", input.display()))?;

    let client = RemoteClient::new(StoreEndpoint::from_config(&config.store), config.throttle)
        .context("failed to create HTTP client")?;
    let resource = ResourceType::new(resource_type);

    for item in items {
        import_item(&client, &resource, item).await?;
    }
    Ok(())
}

async fn import_item(client: &RemoteClient, resource: &ResourceType, item: Value) -> Result<()> {
    let Value::Object(mut fields) = item else {
        bail!("every {} must be a JSON object", resource.singular());
    };
    let metafields = match fields.remove("metafields") {
        Some(Value::Array(list)) => list,
        _ => Vec::new(),
    };

    let (id, action) = match fields.get("id").and_then(Value::as_u64) {
        Some(id) => {
            client
                .update_resource(resource, id, Value::Object(fields))
                .await
                .with_context(|| format!("failed to update {} {id}", resource.singular()))?;
            (id, "updated")
        }
        None => {
            let created = client
                .create_resource(resource, Value::Object(fields))
                .await
                .with_context(|| format!("failed to create {}", resource.singular()))?;
            let id = created
                .get("id")
                .and_then(Value::as_u64)
                .context("created resource has no id")?;
            (id, "created")
        }
    };

    for metafield in metafields {
        client
            .write_metafield(resource, id, strip_id(metafield))
            .await
            .with_context(|| format!("failed to write metafield of {} {id}", resource.singular()))?;
    }

    status_success(&format!("{action} {} {id}", resource.singular()));
    Ok(())
}

/// Exported metafields carry their remote id and owner; a write takes neither.
fn strip_id(mut metafield: Value) -> Value {
    if let Value::Object(map) = &mut metafield {
        for key in ["id", "owner_id", "owner_resource", "created_at", "updated_at"] {
            map.remove(key);
        }
    }
    metafield
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_strip_id_keeps_payload() {
        let exported = json!({
            "id": 9, "owner_id": 1, "namespace": "custom", "key": "size", "value": "L"
        });
        assert_eq!(
            strip_id(exported),
            json!({"namespace": "custom", "key": "size", "value": "L"})
        );
    }
}
