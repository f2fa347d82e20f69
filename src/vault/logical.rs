//! The path-addressed read/write/delete/list surface that every reconciler
//! is written against.

use crate::vault::VaultError;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Vault's standard response envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub lease_id: String,
    #[serde(default)]
    pub lease_duration: u64,
    #[serde(default)]
    pub renewable: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub warnings: Vec<String>,
}

impl Secret {
    pub fn from_data(data: Map<String, Value>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Logical operations against a Vault-compatible backend.
///
/// `read` distinguishes "absent" (`Ok(None)`) from failure; `delete` treats a
/// missing path as success; `list` preserves the backend's ordering.
#[async_trait]
pub trait LogicalBackend: Send + Sync {
    async fn read(&self, path: &str) -> Result<Option<Secret>, VaultError>;

    async fn write(
        &self,
        path: &str,
        data: Map<String, Value>,
    ) -> Result<Option<Secret>, VaultError>;

    async fn delete(&self, path: &str) -> Result<(), VaultError>;

    async fn list(&self, path: &str) -> Result<Vec<String>, VaultError>;
}
