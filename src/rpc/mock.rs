//! Scripted in-process ledger
//!
//! Answers `eth_blockNumber` and `eth_getBlockByNumber` from memory so the
//! scanner can be driven without a node. Blocks without scripted
//! transactions are served empty; blocks above the head are `null`, like a
//! real node.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::error::RpcError;
use super::types::{METHOD_BLOCK_NUMBER, METHOD_GET_BLOCK_BY_NUMBER, RpcBlock, RpcTransaction};
use super::RpcClient;
use crate::codec;

#[derive(Default)]
struct MockLedger {
    head: u64,
    blocks: HashMap<u64, Vec<RpcTransaction>>,
    failing_blocks: HashSet<u64>,
    fail_head: bool,
    head_delay: Option<Duration>,
    block_delay: Option<Duration>,
    fetched: Vec<u64>,
}

/// In-memory [`RpcClient`] with failure injection and call accounting
#[derive(Default)]
pub struct MockRpcClient {
    ledger: Mutex<MockLedger>,
    head_calls: AtomicUsize,
    block_calls: AtomicUsize,
}

impl MockRpcClient {
    pub fn new(head: u64) -> Self {
        let mock = Self::default();
        mock.set_head(head);
        mock
    }

    fn ledger(&self) -> std::sync::MutexGuard<'_, MockLedger> {
        // a panicking test thread must not cascade into every other caller
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_head(&self, head: u64) {
        self.ledger().head = head;
    }

    pub fn head(&self) -> u64 {
        self.ledger().head
    }

    /// Script a plain value transfer into `block`
    pub fn add_transfer(&self, block: u64, hash: &str, from: &str, to: &str, value_hex: &str) {
        self.add_transaction(
            block,
            RpcTransaction {
                hash: hash.to_string(),
                from: from.to_string(),
                to: Some(to.to_string()),
                value: value_hex.to_string(),
            },
        );
    }

    pub fn add_transaction(&self, block: u64, tx: RpcTransaction) {
        self.ledger().blocks.entry(block).or_default().push(tx);
    }

    /// Make every fetch of `block` fail with HTTP 503
    pub fn fail_block(&self, block: u64) {
        self.ledger().failing_blocks.insert(block);
    }

    /// Make head lookups fail (or succeed again)
    pub fn set_head_failure(&self, fail: bool) {
        self.ledger().fail_head = fail;
    }

    /// Delay every head lookup, simulating a slow node
    pub fn set_head_delay(&self, delay: Duration) {
        self.ledger().head_delay = Some(delay);
    }

    /// Delay every block fetch, simulating a slow node
    pub fn set_block_delay(&self, delay: Duration) {
        self.ledger().block_delay = Some(delay);
    }

    /// Number of `eth_blockNumber` calls served (including failed ones)
    pub fn head_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }

    /// Number of `eth_getBlockByNumber` calls served (including failed ones)
    pub fn block_calls(&self) -> usize {
        self.block_calls.load(Ordering::SeqCst)
    }

    /// Block numbers requested so far, in request order
    pub fn fetched_blocks(&self) -> Vec<u64> {
        self.ledger().fetched.clone()
    }

    async fn block_number(&self) -> Result<Value, RpcError> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.ledger().head_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let ledger = self.ledger();
        if ledger.fail_head {
            return Err(RpcError::Rpc {
                method: METHOD_BLOCK_NUMBER.to_string(),
                code: -32000,
                message: "head unavailable".to_string(),
            });
        }
        Ok(json!(codec::encode_block_number(ledger.head)))
    }

    async fn block_by_number(&self, params: &[Value]) -> Result<Value, RpcError> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        let number = params
            .first()
            .and_then(Value::as_str)
            .map(codec::parse_int)
            .ok_or_else(|| RpcError::Rpc {
                method: METHOD_GET_BLOCK_BY_NUMBER.to_string(),
                code: -32602,
                message: "invalid params".to_string(),
            })?;

        let delay = {
            let mut ledger = self.ledger();
            ledger.fetched.push(number);
            ledger.block_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let ledger = self.ledger();
        if ledger.failing_blocks.contains(&number) {
            return Err(RpcError::Status {
                method: METHOD_GET_BLOCK_BY_NUMBER.to_string(),
                status: 503,
            });
        }
        if number > ledger.head {
            return Ok(Value::Null);
        }

        let block = RpcBlock {
            number: codec::encode_block_number(number),
            transactions: ledger.blocks.get(&number).cloned().unwrap_or_default(),
        };
        serde_json::to_value(block).map_err(|source| RpcError::Decode {
            method: METHOD_GET_BLOCK_BY_NUMBER.to_string(),
            source,
        })
    }
}

#[async_trait]
impl RpcClient for MockRpcClient {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        match method {
            METHOD_BLOCK_NUMBER => self.block_number().await,
            METHOD_GET_BLOCK_BY_NUMBER => self.block_by_number(&params).await,
            other => Err(RpcError::Rpc {
                method: other.to_string(),
                code: -32601,
                message: "method not found".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_head_failure() {
        let mock = MockRpcClient::new(5);
        mock.set_head_failure(true);

        let err = mock.get_block_number().await.unwrap_err();
        assert_eq!(err.rpc_code(), Some(-32000));
        assert_eq!(mock.head_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_block_above_head_is_missing() {
        let mock = MockRpcClient::new(5);

        let err = mock.get_block_by_number(6, true).await.unwrap_err();
        assert!(matches!(err, RpcError::MissingResult(_)));
    }

    #[tokio::test]
    async fn test_mock_failing_block() {
        let mock = MockRpcClient::new(5);
        mock.fail_block(3);

        assert!(matches!(
            mock.get_block_by_number(3, true).await,
            Err(RpcError::Status { status: 503, .. })
        ));
        assert!(mock.get_block_by_number(4, true).await.is_ok());
        assert_eq!(mock.fetched_blocks(), vec![3, 4]);
    }

    #[tokio::test]
    async fn test_mock_unknown_method() {
        let mock = MockRpcClient::new(5);
        let err = mock.call("eth_chainId", vec![]).await.unwrap_err();
        assert_eq!(err.rpc_code(), Some(-32601));
    }
}
