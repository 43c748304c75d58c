//! HTTP JSON-RPC client
//!
//! Thin reqwest wrapper: one POST per call, no retries. Any transport error,
//! non-success status or malformed envelope becomes an [`RpcError`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use super::error::RpcError;
use super::types::{JsonRpcRequest, JsonRpcResponse};
use super::RpcClient;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-RPC client over HTTP
pub struct HttpRpcClient {
    endpoint: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpRpcClient {
    /// Create a client for `endpoint` with the default 30s timeout
    pub fn new(endpoint: impl Into<String>) -> Result<Self, RpcError> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let endpoint = endpoint.into();
        info!("Initializing JSON-RPC client for {} (timeout {:?})", endpoint, timeout);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Client(e.to_string()))?;

        Ok(Self {
            endpoint,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RpcClient for HttpRpcClient {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, &params);
        debug!(method, id, "JSON-RPC request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|source| RpcError::Transport {
                method: method.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Status {
                method: method.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| RpcError::Transport {
            method: method.to_string(),
            source,
        })?;

        let rpc_response: JsonRpcResponse =
            serde_json::from_slice(&body).map_err(|e| RpcError::Envelope {
                method: method.to_string(),
                reason: e.to_string(),
            })?;

        if let Some(error) = rpc_response.error {
            return Err(RpcError::Rpc {
                method: method.to_string(),
                code: error.code,
                message: error.message,
            });
        }

        rpc_response
            .result
            .ok_or_else(|| RpcError::MissingResult(method.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpRpcClient::new("http://127.0.0.1:8545").unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:8545");
    }

    #[tokio::test]
    async fn test_network_error_is_transport() {
        // port 9 (discard) is closed on test hosts
        let client =
            HttpRpcClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

        let err = client.call("eth_blockNumber", vec![]).await.unwrap_err();
        assert!(matches!(err, RpcError::Transport { .. }), "got {:?}", err);
    }
}
