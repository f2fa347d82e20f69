//! Vault transport layer.
//!
//! This module talks to the Vault HTTP API. Everything above it (resources,
//! data sources, the provider registry) only sees the [`LogicalBackend`]
//! trait, so the concrete [`VaultClient`] is injected rather than shared
//! through a global.
//!
//! ## Testing strategy:
//! - `client.rs` is exercised against `wiremock` servers
//! - Reconcilers are unit tested against `test_utils::MemoryBackend`
//! - Acceptance tests in `tests/` run against a dev-mode Vault container

pub mod client;
pub mod common;
pub mod error;
pub mod logical;
#[cfg(test)]
pub mod test_utils;

pub use client::VaultClient;
pub use error::VaultError;
pub use logical::{LogicalBackend, Secret};

use std::time::Duration;

/// Vault connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct VaultConfig {
    /// Vault API URL, e.g., "http://127.0.0.1:8200".
    pub url: String,
    /// API token. Every reconcile operation needs one.
    pub token: Option<String>,
    /// Optional namespace for supporting namespaced Vault instances (enterprise)
    pub namespace: Option<String>,
    /// Optional CA certificate for verifying the server
    pub ca_cert_path: Option<String>,
    /// Accept any server certificate.
    pub skip_tls_verify: bool,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl VaultConfig {
    /// Create a new Vault config
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }

    /// Set token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Set namespace
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Set the CA certificate used to verify the server
    pub fn with_ca_cert(mut self, ca_cert: &str) -> Self {
        self.ca_cert_path = Some(ca_cert.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a config from the standard `VAULT_*` environment variables,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`VaultConfig::from_env`], reading variables through `lookup`.
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let mut config = Self::default();
        if let Some(addr) = var("VAULT_ADDR") {
            config.url = addr;
        }
        config.token = var("VAULT_TOKEN");
        config.namespace = var("VAULT_NAMESPACE");
        config.ca_cert_path = var("VAULT_CACERT");
        config.skip_tls_verify = var("VAULT_SKIP_VERIFY").is_some_and(|v| is_truthy(&v));
        config
    }
}

/// Vault's boolean convention, matching what the CLI flag accepts.
fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "t" | "yes" | "y" | "on"
    )
}

// Default configuration
impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8200".to_string(),
            token: None,
            namespace: None,
            ca_cert_path: None,
            skip_tls_verify: false,
            timeout: Duration::from_secs(30),
        }
    }
}
