//! Outbound HTTP to the data sources the endpoints proxy.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Failure talking to, or making sense of, an upstream.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to fetch data: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("malformed upstream JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed upstream XML: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("upstream response has no `{0}`")]
    Missing(&'static str),
}

/// One pooled client for every endpoint.
pub fn client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(20))
        .user_agent(concat!("apis/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            warn!("falling back to default HTTP client: {e}");
            Client::new()
        })
}

/// Fails on a non-success status, carrying the upstream body along.
pub async fn ensure_success(res: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), %body, "upstream returned an error status");
    Err(UpstreamError::Status { status: status.as_u16(), body })
}

/// Walks `path` into `value`, taking ownership of the leaf.
pub fn take_path(mut value: Value, path: &[&'static str]) -> Result<Value, UpstreamError> {
    for &key in path {
        value = match value {
            Value::Object(mut map) => map.remove(key).ok_or(UpstreamError::Missing(key))?,
            _ => return Err(UpstreamError::Missing(key)),
        };
    }
    Ok(value)
}
