//! `vault_kv_secret_list`: names directly under a KV path.

use crate::data_source::DataSource;
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeKind, Schema};
use crate::vault::common::trim_path;
use crate::vault::LogicalBackend;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KvSecretListConfig {
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KvSecretList {
    pub id: String,
    pub path: String,
    /// Child names in backend order; nested directories keep their trailing `/`.
    pub names: Vec<String>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct KvSecretListDataSource;

#[async_trait]
impl DataSource for KvSecretListDataSource {
    type Config = KvSecretListConfig;
    type Output = KvSecretList;

    const TYPE_NAME: &'static str = "vault_kv_secret_list";

    fn schema(&self) -> Schema {
        Schema::new("Lists secrets under a KV path.")
            .attribute(
                Attribute::required("path", AttributeKind::String)
                    .describe("Full KV path to list, including the mount."),
            )
            .attribute(
                Attribute::computed("names", AttributeKind::StringList)
                    .describe("List of all secret names."),
            )
            .attribute(Attribute::computed("id", AttributeKind::String))
    }

    async fn read(
        &self,
        client: &dyn LogicalBackend,
        config: &KvSecretListConfig,
    ) -> Result<KvSecretList, ProviderError> {
        let path = trim_path(&config.path);
        if path.is_empty() {
            return Err(ProviderError::validation("path must not be empty"));
        }
        let names = client.list(path).await.map_err(ProviderError::listing)?;
        debug!("Listed {} names under {}", names.len(), path);
        Ok(KvSecretList {
            id: path.to_string(),
            path: config.path.clone(),
            names,
        })
    }
}
