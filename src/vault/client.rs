//! Client implementation for Vault API interactions.
//!
//! This module provides a client for making HTTP requests to the Vault API
//! with appropriate authentication and error handling.

use crate::vault::common::{api_url, check_response};
use crate::vault::{LogicalBackend, Secret, VaultConfig, VaultError};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Certificate, Client, Method, Response, StatusCode,
};
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::{debug, warn};

/// Client for interacting with the Vault HTTP API.
pub struct VaultClient {
    /// Base URL of the Vault server
    pub addr: String,
    /// Auth token for Vault API requests
    token: String,
    /// HTTP client for making requests
    client: Client,
    /// Custom headers to add to requests
    custom_headers: HeaderMap,
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("addr", &self.addr)
            .field("custom_headers", &self.custom_headers)
            .finish_non_exhaustive()
    }
}

impl VaultClient {
    /// Creates a new VaultClient with the specified address and token.
    pub fn new(addr: &str, token: &str) -> Result<Self, VaultError> {
        Self::from_config(&VaultConfig::new(addr).with_token(token))
    }

    /// Creates a client from a full [`VaultConfig`].
    pub fn from_config(config: &VaultConfig) -> Result<Self, VaultError> {
        let token = config
            .token
            .clone()
            .ok_or_else(|| VaultError::Config("no Vault token configured".to_string()))?;

        let mut builder = Client::builder().timeout(config.timeout);
        if let Some(ca_path) = &config.ca_cert_path {
            let pem = std::fs::read(ca_path).map_err(|e| {
                VaultError::Config(format!("Failed to read CA certificate {}: {}", ca_path, e))
            })?;
            let cert = Certificate::from_pem(&pem)
                .map_err(|e| VaultError::Config(format!("Invalid CA certificate: {}", e)))?;
            builder = builder.add_root_certificate(cert);
        }
        if config.skip_tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder
            .build()
            .map_err(|e| VaultError::Network(format!("Failed to create HTTP client: {}", e)))?;

        let mut vault_client = Self {
            addr: config.url.clone(),
            token,
            client,
            custom_headers: HeaderMap::new(),
        };
        if let Some(namespace) = &config.namespace {
            vault_client.add_header("X-Vault-Namespace", namespace);
        }
        Ok(vault_client)
    }

    /// Adds a custom header to the client.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the header
    /// * `value` - The value of the header
    pub fn add_header(&mut self, name: &str, value: &str) -> &mut Self {
        if let (Ok(header_name), Ok(header_value)) =
            (HeaderName::from_str(name), HeaderValue::from_str(value))
        {
            self.custom_headers.insert(header_name, header_value);
        }
        self
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Response, VaultError> {
        let url = api_url(&self.addr, path);
        debug!("{} {}", method, url);
        let mut request = self.client.request(method, &url);

        // Add token header for authentication
        request = request.header("X-Vault-Token", &self.token);

        for (name, value) in self.custom_headers.iter() {
            request = request.header(name, value);
        }

        if !query.is_empty() {
            request = request.query(query);
        }

        if let Some(json_body) = body {
            request = request.json(json_body);
        }

        request
            .send()
            .await
            .map_err(|e| VaultError::Network(format!("Request failed: {}", e)))
    }
}

fn into_secret(path: &str, body: Option<Value>) -> Result<Option<Secret>, VaultError> {
    let Some(body) = body else {
        return Ok(None);
    };
    let secret: Secret = serde_json::from_value(body)
        .map_err(|e| VaultError::Parse(format!("Unexpected response from {}: {}", path, e)))?;
    for warning in &secret.warnings {
        warn!("Vault warning for {}: {}", path, warning);
    }
    Ok(Some(secret))
}

#[async_trait]
impl LogicalBackend for VaultClient {
    async fn read(&self, path: &str) -> Result<Option<Secret>, VaultError> {
        let response = self.send(Method::GET, path, &[], None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Nothing found at {}", path);
            return Ok(None);
        }
        let body = check_response(response).await?;
        into_secret(path, body)
    }

    async fn write(
        &self,
        path: &str,
        data: Map<String, Value>,
    ) -> Result<Option<Secret>, VaultError> {
        let body = Value::Object(data);
        let response = self.send(Method::PUT, path, &[], Some(&body)).await?;
        let body = check_response(response).await?;
        into_secret(path, body)
    }

    async fn delete(&self, path: &str) -> Result<(), VaultError> {
        let response = self.send(Method::DELETE, path, &[], None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("{} already absent", path);
            return Ok(());
        }
        check_response(response).await?;
        Ok(())
    }

    async fn list(&self, path: &str) -> Result<Vec<String>, VaultError> {
        let response = self
            .send(Method::GET, path, &[("list", "true")], None)
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("No keys under {}", path);
            return Ok(Vec::new());
        }
        let Some(secret) = into_secret(path, check_response(response).await?)? else {
            return Ok(Vec::new());
        };
        match secret.data.get("keys") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(keys)) => keys
                .iter()
                .map(|k| {
                    k.as_str().map(str::to_string).ok_or_else(|| {
                        VaultError::Parse(format!("non-string key {} listed under {}", k, path))
                    })
                })
                .collect(),
            Some(other) => Err(VaultError::Parse(format!(
                "unexpected keys value under {}: {}",
                path, other
            ))),
        }
    }
}
