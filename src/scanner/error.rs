use thiserror::Error;

use crate::rpc::RpcError;

#[derive(Debug, Error)]
pub enum ScannerError {
    #[error("Failed to fetch head block number: {0}")]
    HeadFetch(#[source] RpcError),

    #[error("Failed to fetch block {number}: {source}")]
    BlockFetch {
        number: u64,
        #[source]
        source: RpcError,
    },
}

impl ScannerError {
    /// Block number the error refers to, if any
    pub fn block(&self) -> Option<u64> {
        match self {
            ScannerError::BlockFetch { number, .. } => Some(*number),
            ScannerError::HeadFetch(_) => None,
        }
    }

    /// JSON-RPC error code reported by the node, if the failure carried one
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            ScannerError::HeadFetch(source) | ScannerError::BlockFetch { source, .. } => {
                source.rpc_code()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_code_passes_through() {
        let err = ScannerError::HeadFetch(RpcError::Rpc {
            method: "eth_blockNumber".to_string(),
            code: -32000,
            message: "header not found".to_string(),
        });
        assert_eq!(err.rpc_code(), Some(-32000));
        assert_eq!(err.block(), None);

        let err = ScannerError::BlockFetch {
            number: 9,
            source: RpcError::Status {
                method: "eth_getBlockByNumber".to_string(),
                status: 503,
            },
        };
        assert_eq!(err.rpc_code(), None);
        assert_eq!(err.block(), Some(9));
    }
}
