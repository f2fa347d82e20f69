//! `vault_kv_secret`: a secret in a version 1 KV mount.

use crate::error::ProviderError;
use crate::field::stringify;
use crate::resource::{ReadOutcome, Resource};
use crate::schema::{validate_json_object, Attribute, AttributeKind, Schema};
use crate::vault::common::trim_path;
use crate::vault::LogicalBackend;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KvSecret {
    pub path: String,
    /// JSON object text written verbatim as the secret's data.
    pub data_json: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, String>>,
}

fn parse_data_json(data_json: &str) -> Result<Map<String, Value>, ProviderError> {
    match serde_json::from_str::<Value>(data_json) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ProviderError::validation("data_json must encode a JSON object")),
        Err(e) => Err(ProviderError::validation(format!(
            "data_json is not valid JSON: {}",
            e
        ))),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct KvSecretResource;

#[async_trait]
impl Resource for KvSecretResource {
    type Config = KvSecret;

    const TYPE_NAME: &'static str = "vault_kv_secret";

    fn schema(&self) -> Schema {
        Schema::new("Writes an arbitrary secret to a KV version 1 mount.")
            .attribute(
                Attribute::required("path", AttributeKind::String)
                    .force_new()
                    .describe("Full path of the secret, including the mount."),
            )
            .attribute(
                Attribute::required("data_json", AttributeKind::String)
                    .sensitive()
                    .describe("JSON-encoded secret data to write.")
                    .validate_with(validate_json_object),
            )
            .attribute(
                Attribute::computed("data", AttributeKind::StringMap)
                    .sensitive()
                    .describe("Map of strings read from Vault."),
            )
    }

    fn id(&self, config: &KvSecret) -> String {
        trim_path(&config.path).to_string()
    }

    fn validate(&self, config: &KvSecret) -> Result<(), ProviderError> {
        if trim_path(&config.path).is_empty() {
            return Err(ProviderError::validation("path must not be empty"));
        }
        parse_data_json(&config.data_json).map(|_| ())
    }

    fn requires_replace(&self, prior: &KvSecret, desired: &KvSecret) -> bool {
        trim_path(&prior.path) != trim_path(&desired.path)
    }

    async fn write(
        &self,
        client: &dyn LogicalBackend,
        config: &KvSecret,
        _prior: Option<&KvSecret>,
    ) -> Result<(), ProviderError> {
        let path = trim_path(&config.path);
        let data = parse_data_json(&config.data_json)?;
        debug!("Writing KV secret {}", path);
        client
            .write(path, data)
            .await
            .map_err(ProviderError::writing)?;
        Ok(())
    }

    async fn read(
        &self,
        client: &dyn LogicalBackend,
        id: &str,
    ) -> Result<ReadOutcome<KvSecret>, ProviderError> {
        let path = trim_path(id);
        let Some(secret) = client.read(path).await.map_err(ProviderError::reading)? else {
            return Ok(ReadOutcome::Gone);
        };
        debug!("Read KV secret {}", path);
        // sorted keys so the text is stable across reads
        let canonical: BTreeMap<&String, &Value> = secret.data.iter().collect();
        let data_json =
            serde_json::to_string(&canonical).map_err(|e| ProviderError::reading(e.into()))?;
        let data = secret
            .data
            .iter()
            .map(|(k, v)| (k.clone(), stringify(v)))
            .collect();
        Ok(ReadOutcome::Found(KvSecret {
            path: path.to_string(),
            data_json,
            data: Some(data),
        }))
    }

    async fn delete(&self, client: &dyn LogicalBackend, id: &str) -> Result<(), ProviderError> {
        let path = trim_path(id);
        debug!("Deleting KV secret {}", path);
        client.delete(path).await.map_err(ProviderError::deleting)
    }
}
