//! Ledger RPC Module
//!
//! The indexer talks to the ledger through a single request/response
//! operation, [`RpcClient::call`]. Two implementations ship with the crate:
//! - [`HttpRpcClient`]: JSON-RPC 2.0 over HTTP (Geth, Anvil, public endpoints)
//! - [`MockRpcClient`]: scripted in-process ledger for tests and offline runs

pub mod client;
pub mod error;
pub mod mock;
pub mod types;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::codec;

pub use client::HttpRpcClient;
pub use error::RpcError;
pub use mock::MockRpcClient;
pub use types::{METHOD_BLOCK_NUMBER, METHOD_GET_BLOCK_BY_NUMBER, RpcBlock, RpcTransaction};

/// Generic request/response access to the ledger
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Invoke `method` with positional `params` and return the raw result
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError>;

    /// Head block number as a `0x`-prefixed hex string
    async fn get_block_number(&self) -> Result<String, RpcError> {
        let result = self.call(METHOD_BLOCK_NUMBER, Vec::new()).await?;
        decode_result(METHOD_BLOCK_NUMBER, result)
    }

    /// Block by number, with full transaction bodies when `full` is set
    async fn get_block_by_number(&self, number: u64, full: bool) -> Result<RpcBlock, RpcError> {
        let params = vec![json!(codec::encode_block_number(number)), json!(full)];
        let result = self.call(METHOD_GET_BLOCK_BY_NUMBER, params).await?;
        decode_result(METHOD_GET_BLOCK_BY_NUMBER, result)
    }
}

fn decode_result<R: DeserializeOwned>(method: &str, result: Value) -> Result<R, RpcError> {
    if result.is_null() {
        return Err(RpcError::MissingResult(method.to_string()));
    }
    serde_json::from_value(result).map_err(|source| RpcError::Decode {
        method: method.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_block_number_decodes_string() {
        let mock = MockRpcClient::new(0x1a);
        assert_eq!(mock.get_block_number().await.unwrap(), "0x1a");
    }

    #[tokio::test]
    async fn test_get_block_by_number_encodes_params() {
        let mock = MockRpcClient::new(100);
        mock.add_transfer(26, "0xh", "0xa", "0xb", "0x1");

        let block = mock.get_block_by_number(26, true).await.unwrap();
        assert_eq!(block.number, "0x1a");
        assert_eq!(block.transactions.len(), 1);
        assert_eq!(mock.fetched_blocks(), vec![26]);
    }

    #[test]
    fn test_decode_result_null_is_missing() {
        let err = decode_result::<RpcBlock>(METHOD_GET_BLOCK_BY_NUMBER, Value::Null).unwrap_err();
        assert!(matches!(err, RpcError::MissingResult(_)));
    }

    #[test]
    fn test_decode_result_wrong_shape() {
        let err = decode_result::<String>(METHOD_BLOCK_NUMBER, json!(12)).unwrap_err();
        assert!(matches!(err, RpcError::Decode { .. }));
    }
}
