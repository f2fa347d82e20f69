//! Errors surfaced to whoever drives the reconcilers.

use crate::vault::VaultError;
use std::fmt;

/// Which backend round-trip failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendOp {
    Write,
    Read,
    Delete,
    List,
}

impl fmt::Display for BackendOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phrase = match self {
            BackendOp::Write => "writing to",
            BackendOp::Read => "reading from",
            BackendOp::Delete => "deleting from",
            BackendOp::List => "listing",
        };
        f.write_str(phrase)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// A local precondition failed. Nothing was sent to Vault.
    #[error("{0}")]
    Validation(String),

    #[error("error {op} Vault: {source}")]
    Backend {
        op: BackendOp,
        #[source]
        source: VaultError,
    },
}

impl ProviderError {
    pub fn validation(message: impl Into<String>) -> Self {
        ProviderError::Validation(message.into())
    }

    pub fn writing(source: VaultError) -> Self {
        ProviderError::Backend {
            op: BackendOp::Write,
            source,
        }
    }

    pub fn reading(source: VaultError) -> Self {
        ProviderError::Backend {
            op: BackendOp::Read,
            source,
        }
    }

    pub fn deleting(source: VaultError) -> Self {
        ProviderError::Backend {
            op: BackendOp::Delete,
            source,
        }
    }

    pub fn listing(source: VaultError) -> Self {
        ProviderError::Backend {
            op: BackendOp::List,
            source,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ProviderError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_keeps_transport_message() {
        let err = ProviderError::writing(VaultError::Api("permission denied".to_string()));
        assert_eq!(
            err.to_string(),
            "error writing to Vault: API error: permission denied"
        );
        assert!(!err.is_validation());
    }

    #[test]
    fn test_backend_op_phrases() {
        let api = |m: &str| VaultError::Api(m.to_string());
        assert_eq!(
            ProviderError::reading(api("x")).to_string(),
            "error reading from Vault: API error: x"
        );
        assert_eq!(
            ProviderError::deleting(api("x")).to_string(),
            "error deleting from Vault: API error: x"
        );
        assert_eq!(
            ProviderError::listing(api("x")).to_string(),
            "error listing Vault: API error: x"
        );
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = ProviderError::validation("name must not end with '/'");
        assert_eq!(err.to_string(), "name must not end with '/'");
        assert!(err.is_validation());
    }
}
