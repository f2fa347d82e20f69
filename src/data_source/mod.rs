//! Read-only projections of remote state.

pub mod kv_secret_list;

pub use kv_secret_list::KvSecretListDataSource;

use crate::error::ProviderError;
use crate::schema::Schema;
use crate::vault::LogicalBackend;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[async_trait]
pub trait DataSource: Send + Sync {
    type Config: DeserializeOwned + Send + Sync;
    type Output: Serialize + Send;

    const TYPE_NAME: &'static str;

    fn schema(&self) -> Schema;

    async fn read(
        &self,
        client: &dyn LogicalBackend,
        config: &Self::Config,
    ) -> Result<Self::Output, ProviderError>;
}
