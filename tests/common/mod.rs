//! Shared setup for acceptance tests that run against a dev-mode Vault container.
//!
//! These tests need Docker, so every test using this module is `#[ignore]`d.
//! Run them with `cargo test -- --ignored`.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};
use vaultform::{LogicalBackend, Provider, VaultClient};

pub const ROOT_TOKEN: &str = "root";

/// Set up logging for tests
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

/// A running dev-mode Vault. The container stops when this is dropped.
pub struct VaultFixture {
    _container: ContainerAsync<GenericImage>,
    addr: String,
}

impl VaultFixture {
    pub async fn start() -> Self {
        init_logging();
        let container = GenericImage::new("hashicorp/vault", "1.18.4")
            .with_exposed_port(8200.tcp())
            .with_wait_for(WaitFor::message_on_stdout("Vault server started!"))
            .with_env_var("VAULT_DEV_ROOT_TOKEN_ID", ROOT_TOKEN)
            .with_env_var("VAULT_DEV_LISTEN_ADDRESS", "0.0.0.0:8200")
            .with_cmd(vec!["server", "-dev", "-dev-root-token-id=root"])
            .start()
            .await
            .unwrap();
        let host = container.get_host().await.unwrap();
        let port = container.get_host_port_ipv4(8200).await.unwrap();
        Self {
            _container: container,
            addr: format!("http://{}:{}", host, port),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn client(&self) -> VaultClient {
        VaultClient::new(&self.addr, ROOT_TOKEN).unwrap()
    }

    pub fn provider(&self) -> Provider {
        Provider::with_client(Arc::new(self.client()))
    }
}

/// A unique name so tests never collide on shared server state.
pub fn random_name(prefix: &str) -> String {
    format!("{}-{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..8])
}

/// Reads `path` and returns its `data` object, failing the test if absent.
pub async fn read_data(client: &VaultClient, path: &str) -> Value {
    let secret = client
        .read(path)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("nothing at {}", path));
    Value::Object(secret.data)
}

/// Writes `body` to `path` and returns the response `data` object.
pub async fn write_data(client: &VaultClient, path: &str, body: Value) -> Value {
    let body = body.as_object().cloned().unwrap_or_default();
    let secret = client.write(path, body).await.unwrap();
    secret.map(|s| Value::Object(s.data)).unwrap_or(json!({}))
}
