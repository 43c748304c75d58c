use thiserror::Error;

/// Every way a JSON-RPC round-trip can fail.
///
/// The scanner treats all variants identically (log and move on); the
/// distinction exists for logs and tests.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP request failed for {method}: {source}")]
    Transport {
        method: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("RPC call {method} failed with HTTP status {status}")]
    Status { method: String, status: u16 },

    #[error("Failed to decode JSON-RPC envelope for {method}: {reason}")]
    Envelope { method: String, reason: String },

    #[error("RPC error for {method} (code {code}): {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },

    #[error("No result in RPC response for {0}")]
    MissingResult(String),

    #[error("Failed to decode result of {method}: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

impl RpcError {
    /// JSON-RPC error code, if the node answered with an error object
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            RpcError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}
