//! Common helper functions for Vault requests.

use crate::vault::VaultError;
use reqwest::{Response, StatusCode};
use serde_json::Value;

/// Strips leading and trailing `/` from a logical path.
pub fn trim_path(path: &str) -> &str {
    path.trim_matches('/')
}

/// Joins a server address and a logical path into an API URL.
pub fn api_url(addr: &str, path: &str) -> String {
    format!("{}/v1/{}", addr.trim_end_matches('/'), trim_path(path))
}

/// Checks the HTTP response from Vault. If successful, returns the JSON body
/// (or `None` for an empty body); otherwise it extracts Vault's error messages
/// or falls back to the status code and raw body.
pub async fn check_response(resp: Response) -> Result<Option<Value>, VaultError> {
    let status = resp.status();
    if status.is_success() {
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        return serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| VaultError::Parse(format!("Failed to parse response: {}", e)));
    }

    let body = resp.text().await.unwrap_or_default();
    Err(error_from_body(status, body))
}

/// Builds the error for a non-success response body.
pub fn error_from_body(status: StatusCode, body: String) -> VaultError {
    if let Ok(val) = serde_json::from_str::<Value>(&body) {
        if let Some(errors) = val.get("errors").and_then(|v| v.as_array()) {
            let messages: Vec<&str> = errors.iter().filter_map(|e| e.as_str()).collect();
            if !messages.is_empty() {
                return VaultError::Api(messages.join("; "));
            }
        }
    }
    VaultError::HttpStatus(status.as_u16(), body)
}
