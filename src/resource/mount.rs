//! `vault_mount`: a secrets engine mounted at a path.

use crate::error::ProviderError;
use crate::field::{decode_string, decode_string_map, decode_u64, encode_string_map};
use crate::resource::{ReadOutcome, Resource};
use crate::schema::{validate_no_trailing_slash, Attribute, AttributeKind, Schema};
use crate::vault::common::trim_path;
use crate::vault::{LogicalBackend, VaultError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mount {
    pub path: String,
    #[serde(rename = "type")]
    pub mount_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_lease_ttl_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lease_ttl_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessor: Option<String>,
}

impl Mount {
    fn tuning(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        if let Some(description) = &self.description {
            payload.insert("description".to_string(), json!(description));
        }
        if let Some(ttl) = self.default_lease_ttl_seconds {
            payload.insert("default_lease_ttl".to_string(), json!(ttl));
        }
        if let Some(ttl) = self.max_lease_ttl_seconds {
            payload.insert("max_lease_ttl".to_string(), json!(ttl));
        }
        if let Some(options) = encode_string_map(&self.options) {
            payload.insert("options".to_string(), options);
        }
        payload
    }

    fn create_payload(&self) -> Map<String, Value> {
        let mut tuning = self.tuning();
        let mut payload = Map::new();
        payload.insert("type".to_string(), json!(self.mount_type));
        if let Some(description) = tuning.remove("description") {
            payload.insert("description".to_string(), description);
        }
        if let Some(options) = tuning.remove("options") {
            payload.insert("options".to_string(), options);
        }
        // what is left are the lease TTLs, which live under "config" on create
        if !tuning.is_empty() {
            payload.insert("config".to_string(), Value::Object(tuning));
        }
        payload
    }

    fn from_listing(path: &str, entry: &Value) -> Result<Self, VaultError> {
        let config = entry.get("config");
        Ok(Self {
            path: path.to_string(),
            mount_type: decode_string("type", entry.get("type"))?.unwrap_or_default(),
            description: decode_string("description", entry.get("description"))?
                .filter(|d| !d.is_empty()),
            default_lease_ttl_seconds: decode_u64(
                "default_lease_ttl",
                config.and_then(|c| c.get("default_lease_ttl")),
            )?,
            max_lease_ttl_seconds: decode_u64(
                "max_lease_ttl",
                config.and_then(|c| c.get("max_lease_ttl")),
            )?,
            options: decode_string_map("options", entry.get("options"))?,
            accessor: decode_string("accessor", entry.get("accessor"))?,
        })
    }
}

fn mount_path(path: &str) -> String {
    format!("sys/mounts/{}", trim_path(path))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MountResource;

#[async_trait]
impl Resource for MountResource {
    type Config = Mount;

    const TYPE_NAME: &'static str = "vault_mount";

    fn schema(&self) -> Schema {
        Schema::new("Mounts a secrets engine.")
            .attribute(
                Attribute::required("path", AttributeKind::String)
                    .force_new()
                    .describe("Where the secret backend will be mounted.")
                    .validate_with(validate_no_trailing_slash),
            )
            .attribute(
                Attribute::required("type", AttributeKind::String)
                    .force_new()
                    .describe("Type of the backend, such as \"kv\"."),
            )
            .attribute(
                Attribute::optional("description", AttributeKind::String)
                    .describe("Human-friendly description of the mount."),
            )
            .attribute(
                Attribute::optional("default_lease_ttl_seconds", AttributeKind::Int)
                    .describe("Default lease duration for tokens and secrets in seconds."),
            )
            .attribute(
                Attribute::optional("max_lease_ttl_seconds", AttributeKind::Int)
                    .describe("Maximum possible lease duration for tokens and secrets in seconds."),
            )
            .attribute(
                Attribute::optional("options", AttributeKind::StringMap)
                    .describe("Specifies mount type specific options that are passed to the backend."),
            )
            .attribute(
                Attribute::computed("accessor", AttributeKind::String)
                    .describe("Accessor of the mount."),
            )
    }

    fn id(&self, config: &Mount) -> String {
        trim_path(&config.path).to_string()
    }

    fn validate(&self, config: &Mount) -> Result<(), ProviderError> {
        if trim_path(&config.path).is_empty() {
            return Err(ProviderError::validation("path must not be empty"));
        }
        if config.mount_type.is_empty() {
            return Err(ProviderError::validation("type must not be empty"));
        }
        Ok(())
    }

    fn requires_replace(&self, prior: &Mount, desired: &Mount) -> bool {
        trim_path(&prior.path) != trim_path(&desired.path) || prior.mount_type != desired.mount_type
    }

    async fn write(
        &self,
        client: &dyn LogicalBackend,
        config: &Mount,
        prior: Option<&Mount>,
    ) -> Result<(), ProviderError> {
        let (path, payload) = match prior {
            None => (mount_path(&config.path), config.create_payload()),
            Some(_) => (
                format!("{}/tune", mount_path(&config.path)),
                config.tuning(),
            ),
        };
        debug!("Writing mount configuration to {}", path);
        client
            .write(&path, payload)
            .await
            .map_err(ProviderError::writing)?;
        Ok(())
    }

    async fn read(
        &self,
        client: &dyn LogicalBackend,
        id: &str,
    ) -> Result<ReadOutcome<Mount>, ProviderError> {
        let path = trim_path(id);
        let Some(mounts) = client
            .read("sys/mounts")
            .await
            .map_err(ProviderError::reading)?
        else {
            return Ok(ReadOutcome::Gone);
        };
        let Some(entry) = mounts.data.get(&format!("{}/", path)) else {
            debug!("Mount {} not present in sys/mounts", path);
            return Ok(ReadOutcome::Gone);
        };
        Mount::from_listing(path, entry)
            .map(ReadOutcome::Found)
            .map_err(ProviderError::reading)
    }

    async fn delete(&self, client: &dyn LogicalBackend, id: &str) -> Result<(), ProviderError> {
        let path = mount_path(id);
        debug!("Unmounting {}", path);
        client.delete(&path).await.map_err(ProviderError::deleting)
    }
}
