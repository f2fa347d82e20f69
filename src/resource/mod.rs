//! Resource reconcilers.
//!
//! A [`Resource`] knows how to write, read and delete one kind of Vault
//! object. The free functions in this module ([`create`], [`apply`],
//! [`refresh`], [`destroy`], [`import`]) are the lifecycle shared by every
//! resource type, so behaviour such as "not found on read clears the id"
//! lives in exactly one place.

pub mod kv_secret;
pub mod mfa_login_enforcement;
pub mod mount;

pub use kv_secret::KvSecretResource;
pub use mfa_login_enforcement::MfaLoginEnforcementResource;
pub use mount::MountResource;

use crate::error::ProviderError;
use crate::schema::Schema;
use crate::vault::{LogicalBackend, VaultError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Stored representation of one resource instance.
///
/// `id == None` means the instance does not exist remotely (never created,
/// destroyed, or found missing on refresh) and the next apply creates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState<C> {
    #[serde(default)]
    pub id: Option<String>,
    pub attributes: C,
}

/// Result of reading a resource from Vault.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome<C> {
    Found(C),
    Gone,
}

#[async_trait]
pub trait Resource: Send + Sync {
    type Config: Clone + Default + Serialize + DeserializeOwned + Send + Sync;

    const TYPE_NAME: &'static str;

    fn schema(&self) -> Schema;

    /// Identifier derived from a desired config.
    fn id(&self, config: &Self::Config) -> String;

    /// Local preconditions checked before any backend call.
    fn validate(&self, _config: &Self::Config) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Whether moving from `prior` to `desired` needs delete-then-create.
    fn requires_replace(&self, _prior: &Self::Config, _desired: &Self::Config) -> bool {
        false
    }

    /// Writes `config`. `prior` is `None` on create.
    async fn write(
        &self,
        client: &dyn LogicalBackend,
        config: &Self::Config,
        prior: Option<&Self::Config>,
    ) -> Result<(), ProviderError>;

    async fn read(
        &self,
        client: &dyn LogicalBackend,
        id: &str,
    ) -> Result<ReadOutcome<Self::Config>, ProviderError>;

    async fn delete(&self, client: &dyn LogicalBackend, id: &str) -> Result<(), ProviderError>;

    /// Reads an existing object given only its identifier.
    async fn import(
        &self,
        client: &dyn LogicalBackend,
        id: &str,
    ) -> Result<ReadOutcome<Self::Config>, ProviderError> {
        self.read(client, id).await
    }
}

/// Validates, writes and reads back so the state holds server-normalised
/// values rather than the input.
pub async fn create<R: Resource>(
    resource: &R,
    client: &dyn LogicalBackend,
    desired: &R::Config,
) -> Result<ResourceState<R::Config>, ProviderError> {
    resource.validate(desired)?;
    resource.write(client, desired, None).await?;
    let id = resource.id(desired);
    info!("Created {} {:?}", R::TYPE_NAME, id);
    read_back(resource, client, id).await
}

/// Converges `prior` towards `desired`: create, replace, or update in place.
pub async fn apply<R: Resource>(
    resource: &R,
    client: &dyn LogicalBackend,
    prior: Option<&ResourceState<R::Config>>,
    desired: &R::Config,
) -> Result<ResourceState<R::Config>, ProviderError> {
    let existing = prior.and_then(|s| s.id.as_deref().map(|id| (id, &s.attributes)));
    let Some((prior_id, prior_config)) = existing else {
        return create(resource, client, desired).await;
    };

    resource.validate(desired)?;
    if resource.requires_replace(prior_config, desired) {
        info!("Replacing {} {:?}", R::TYPE_NAME, prior_id);
        resource.delete(client, prior_id).await?;
        return create(resource, client, desired).await;
    }

    resource.write(client, desired, Some(prior_config)).await?;
    let id = resource.id(desired);
    info!("Updated {} {:?}", R::TYPE_NAME, id);
    read_back(resource, client, id).await
}

/// Re-reads the remote object. A missing object clears the id.
pub async fn refresh<R: Resource>(
    resource: &R,
    client: &dyn LogicalBackend,
    state: ResourceState<R::Config>,
) -> Result<ResourceState<R::Config>, ProviderError> {
    let Some(id) = state.id else {
        return Ok(state);
    };
    match resource.read(client, &id).await? {
        ReadOutcome::Found(attributes) => Ok(ResourceState {
            id: Some(id),
            attributes,
        }),
        ReadOutcome::Gone => {
            info!(
                "{} {:?} no longer exists in Vault, removing from state",
                R::TYPE_NAME,
                id
            );
            Ok(ResourceState {
                id: None,
                attributes: state.attributes,
            })
        }
    }
}

pub async fn destroy<R: Resource>(
    resource: &R,
    client: &dyn LogicalBackend,
    state: &ResourceState<R::Config>,
) -> Result<(), ProviderError> {
    if let Some(id) = &state.id {
        resource.delete(client, id).await?;
        info!("Deleted {} {:?}", R::TYPE_NAME, id);
    }
    Ok(())
}

pub async fn import<R: Resource>(
    resource: &R,
    client: &dyn LogicalBackend,
    id: &str,
) -> Result<ResourceState<R::Config>, ProviderError> {
    match resource.import(client, id).await? {
        ReadOutcome::Found(attributes) => Ok(ResourceState {
            id: Some(id.to_string()),
            attributes,
        }),
        ReadOutcome::Gone => Err(ProviderError::validation(format!(
            "cannot import non-existent remote object {} {:?}",
            R::TYPE_NAME,
            id
        ))),
    }
}

async fn read_back<R: Resource>(
    resource: &R,
    client: &dyn LogicalBackend,
    id: String,
) -> Result<ResourceState<R::Config>, ProviderError> {
    match resource.read(client, &id).await? {
        ReadOutcome::Found(attributes) => Ok(ResourceState {
            id: Some(id),
            attributes,
        }),
        ReadOutcome::Gone => Err(ProviderError::reading(VaultError::Api(format!(
            "{} {:?} was not found after writing",
            R::TYPE_NAME,
            id
        )))),
    }
}
