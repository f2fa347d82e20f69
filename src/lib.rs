//! vaultform - declarative HashiCorp Vault resources
//!
//! This crate reconciles declared Vault objects (MFA login enforcement, KV
//! secrets, secrets engine mounts) against a live Vault server, and exposes
//! read-only listings such as the secrets under a KV path.
//!
//! ## Architecture
//!
//! - `vault` module - HTTP transport and the `LogicalBackend` trait
//! - `schema` / `field` modules - declared attributes and their mapping onto Vault payloads
//! - `resource` module - per-type reconcilers plus the shared create/apply/refresh/destroy/import lifecycle
//! - `data_source` module - read-only projections
//! - `provider` module - type-name registry driven with JSON configs and state
//! - `cli` module - command-line front end over the provider
//!
//! Every reconciler receives its client explicitly; nothing holds a global
//! connection.

pub mod cli;
pub mod data_source;
pub mod error;
pub mod field;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod vault;

// Re-export public types for convenience
pub use error::{BackendOp, ProviderError};
pub use provider::Provider;
pub use resource::{ReadOutcome, Resource, ResourceState};
pub use vault::{LogicalBackend, VaultClient, VaultConfig, VaultError};

/// Initialize logging for unit tests
#[cfg(test)]
pub(crate) fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}
