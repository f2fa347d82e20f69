//! Provider registry.
//!
//! The provider owns the configured client and maps type names such as
//! `vault_mfa_login_enforcement` to type-erased reconcilers that speak JSON.
//! This is the surface an orchestrator (or the CLI) drives.

use crate::data_source::{DataSource, KvSecretListDataSource};
use crate::error::ProviderError;
use crate::resource::{
    self, KvSecretResource, MfaLoginEnforcementResource, MountResource, Resource, ResourceState,
};
use crate::schema::Schema;
use crate::vault::{LogicalBackend, VaultClient, VaultConfig};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A [`Resource`] with its config and state carried as JSON.
#[async_trait]
pub trait DynamicResource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn apply(
        &self,
        client: &dyn LogicalBackend,
        prior: Option<Value>,
        config: Value,
    ) -> Result<Value, ProviderError>;

    async fn refresh(&self, client: &dyn LogicalBackend, state: Value)
        -> Result<Value, ProviderError>;

    async fn destroy(&self, client: &dyn LogicalBackend, state: Value) -> Result<(), ProviderError>;

    async fn import(&self, client: &dyn LogicalBackend, id: &str) -> Result<Value, ProviderError>;
}

/// A [`DataSource`] with its config and output carried as JSON.
#[async_trait]
pub trait DynamicDataSource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn read(&self, client: &dyn LogicalBackend, config: Value) -> Result<Value, ProviderError>;
}

fn from_json<T: DeserializeOwned>(what: &str, value: Value) -> Result<T, ProviderError> {
    serde_json::from_value(value)
        .map_err(|e| ProviderError::validation(format!("invalid {}: {}", what, e)))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ProviderError> {
    serde_json::to_value(value)
        .map_err(|e| ProviderError::validation(format!("unserializable state: {}", e)))
}

#[async_trait]
impl<R: Resource> DynamicResource for R {
    fn type_name(&self) -> &'static str {
        R::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Resource::schema(self)
    }

    async fn apply(
        &self,
        client: &dyn LogicalBackend,
        prior: Option<Value>,
        config: Value,
    ) -> Result<Value, ProviderError> {
        Resource::schema(self).validate(&config)?;
        let desired: R::Config = from_json("configuration", config)?;
        let prior: Option<ResourceState<R::Config>> =
            prior.map(|p| from_json("state", p)).transpose()?;
        let state = resource::apply(self, client, prior.as_ref(), &desired).await?;
        to_json(&state)
    }

    async fn refresh(
        &self,
        client: &dyn LogicalBackend,
        state: Value,
    ) -> Result<Value, ProviderError> {
        let state: ResourceState<R::Config> = from_json("state", state)?;
        let state = resource::refresh(self, client, state).await?;
        to_json(&state)
    }

    async fn destroy(&self, client: &dyn LogicalBackend, state: Value) -> Result<(), ProviderError> {
        let state: ResourceState<R::Config> = from_json("state", state)?;
        resource::destroy(self, client, &state).await
    }

    async fn import(&self, client: &dyn LogicalBackend, id: &str) -> Result<Value, ProviderError> {
        let state = resource::import(self, client, id).await?;
        to_json(&state)
    }
}

#[async_trait]
impl<D: DataSource> DynamicDataSource for D {
    fn type_name(&self) -> &'static str {
        D::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        DataSource::schema(self)
    }

    async fn read(&self, client: &dyn LogicalBackend, config: Value) -> Result<Value, ProviderError> {
        DataSource::schema(self).validate(&config)?;
        let config: D::Config = from_json("configuration", config)?;
        let output = DataSource::read(self, client, &config).await?;
        to_json(&output)
    }
}

/// Every resource and data source type this crate provides, keyed by name.
pub struct Registry {
    resources: BTreeMap<&'static str, Box<dyn DynamicResource>>,
    data_sources: BTreeMap<&'static str, Box<dyn DynamicDataSource>>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut registry = Self {
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
        };
        registry.register_resource(MfaLoginEnforcementResource);
        registry.register_resource(KvSecretResource);
        registry.register_resource(MountResource);
        registry.register_data_source(KvSecretListDataSource);
        registry
    }
}

impl Registry {
    fn register_resource<R: Resource + 'static>(&mut self, resource: R) {
        self.resources.insert(R::TYPE_NAME, Box::new(resource));
    }

    fn register_data_source<D: DataSource + 'static>(&mut self, data_source: D) {
        self.data_sources.insert(D::TYPE_NAME, Box::new(data_source));
    }

    pub fn resource(&self, type_name: &str) -> Result<&dyn DynamicResource, ProviderError> {
        self.resources
            .get(type_name)
            .map(|r| r.as_ref())
            .ok_or_else(|| ProviderError::validation(format!("unknown resource type {:?}", type_name)))
    }

    pub fn data_source(&self, type_name: &str) -> Result<&dyn DynamicDataSource, ProviderError> {
        self.data_sources
            .get(type_name)
            .map(|d| d.as_ref())
            .ok_or_else(|| {
                ProviderError::validation(format!("unknown data source type {:?}", type_name))
            })
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    pub fn data_source_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.data_sources.keys().copied()
    }

    /// JSON description of every registered resource and data source.
    pub fn schema(&self) -> Value {
        let resources: Map<String, Value> = self
            .resources
            .values()
            .map(|r| (r.type_name().to_string(), json!(r.schema())))
            .collect();
        let data_sources: Map<String, Value> = self
            .data_sources
            .values()
            .map(|d| (d.type_name().to_string(), json!(d.schema())))
            .collect();
        json!({ "resources": resources, "data_sources": data_sources })
    }
}

/// A configured client plus the registry; the entry point an orchestrator drives.
pub struct Provider {
    client: Arc<dyn LogicalBackend>,
    registry: Registry,
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("resources", &self.registry.resource_types().collect::<Vec<_>>())
            .field(
                "data_sources",
                &self.registry.data_source_types().collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl Provider {
    /// Builds a provider talking to the Vault described by `config`.
    pub fn configure(config: &VaultConfig) -> Result<Self, ProviderError> {
        let client = VaultClient::from_config(config).map_err(|e| {
            ProviderError::validation(format!("invalid provider configuration: {}", e))
        })?;
        debug!("Configured provider for {}", client.addr);
        Ok(Self::with_client(Arc::new(client)))
    }

    /// Builds a provider around an already constructed backend.
    pub fn with_client(client: Arc<dyn LogicalBackend>) -> Self {
        Self {
            client,
            registry: Registry::default(),
        }
    }

    pub fn client(&self) -> &dyn LogicalBackend {
        self.client.as_ref()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn schema(&self) -> Value {
        self.registry.schema()
    }

    pub async fn apply(
        &self,
        type_name: &str,
        prior: Option<Value>,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.registry
            .resource(type_name)?
            .apply(self.client(), prior, config)
            .await
    }

    pub async fn refresh(&self, type_name: &str, state: Value) -> Result<Value, ProviderError> {
        self.registry
            .resource(type_name)?
            .refresh(self.client(), state)
            .await
    }

    pub async fn destroy(&self, type_name: &str, state: Value) -> Result<(), ProviderError> {
        self.registry
            .resource(type_name)?
            .destroy(self.client(), state)
            .await
    }

    pub async fn import(&self, type_name: &str, id: &str) -> Result<Value, ProviderError> {
        self.registry
            .resource(type_name)?
            .import(self.client(), id)
            .await
    }

    pub async fn read_data(&self, type_name: &str, config: Value) -> Result<Value, ProviderError> {
        self.registry
            .data_source(type_name)?
            .read(self.client(), config)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::test_utils::MemoryBackend;

    fn provider() -> (Arc<MemoryBackend>, Provider) {
        let backend = Arc::new(MemoryBackend::new());
        let provider = Provider::with_client(backend.clone());
        (backend, provider)
    }

    fn enforcement_config(name: &str) -> Value {
        json!({
            "name": name,
            "mfa_method_ids": ["method-1"],
            "auth_method_types": ["userpass"]
        })
    }

    #[test]
    fn test_registry_contents() {
        let registry = Registry::default();
        let resources: Vec<_> = registry.resource_types().collect();
        assert_eq!(
            resources,
            vec!["vault_kv_secret", "vault_mfa_login_enforcement", "vault_mount"]
        );
        let data_sources: Vec<_> = registry.data_source_types().collect();
        assert_eq!(data_sources, vec!["vault_kv_secret_list"]);

        let schema = registry.schema();
        assert_eq!(
            schema["resources"]["vault_mfa_login_enforcement"]["attributes"][0]["name"],
            "name"
        );
    }

    #[test]
    fn test_configure_requires_token() {
        let err = Provider::configure(&VaultConfig::new("http://127.0.0.1:8200")).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().starts_with("invalid provider configuration"));
    }

    #[test]
    fn test_debug_lists_types() {
        let (_, provider) = provider();
        let rendered = format!("{:?}", provider);
        assert!(rendered.starts_with("Provider"));
        assert!(rendered.contains("vault_mfa_login_enforcement"));
        assert!(rendered.contains("vault_kv_secret_list"));
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let (_, provider) = provider();
        let err = provider
            .apply("vault_nope", None, json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown resource type \"vault_nope\"");
        assert!(provider.registry().data_source("vault_nope").is_err());
        assert_eq!(provider.schema(), Registry::default().schema());
    }

    #[tokio::test]
    async fn test_schema_validation_runs_before_backend() {
        let (backend, provider) = provider();
        let err = provider
            .apply(
                "vault_mfa_login_enforcement",
                None,
                enforcement_config("enf/"),
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_json_lifecycle() {
        let (backend, provider) = provider();

        let state = provider
            .apply(
                "vault_mfa_login_enforcement",
                None,
                enforcement_config("enf"),
            )
            .await
            .unwrap();
        assert_eq!(state["id"], "enf");
        assert_eq!(state["attributes"]["auth_method_types"], json!(["userpass"]));

        let imported = provider
            .import("vault_mfa_login_enforcement", "enf")
            .await
            .unwrap();
        assert_eq!(imported, state);

        backend.remove("identity/mfa/login-enforcement/enf");
        let refreshed = provider
            .refresh("vault_mfa_login_enforcement", state.clone())
            .await
            .unwrap();
        assert_eq!(refreshed["id"], Value::Null);

        // destroying an already absent record succeeds
        provider
            .destroy("vault_mfa_login_enforcement", state)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_data_source_through_registry() {
        let (backend, provider) = provider();
        backend.insert("kv/a", json!({"k": "v"}));

        let output = provider
            .read_data("vault_kv_secret_list", json!({"path": "kv"}))
            .await
            .unwrap();

        assert_eq!(output["names"], json!(["a"]));
        assert_eq!(output["id"], "kv");
    }
}
