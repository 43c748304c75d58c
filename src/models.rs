//! Indexed transaction record

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::codec;
use crate::rpc::RpcTransaction;

/// A ledger transaction as filed under one participant address.
///
/// Every ledger transaction is stored twice: once under `from` with
/// `inbound = false` and once under `to` with `inbound = true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransactionRecord {
    /// Transaction hash
    #[schema(example = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060")]
    pub hash: String,
    /// Sender address (as reported by the node, not normalized)
    pub from: String,
    /// Receiver address (empty for contract creation)
    pub to: String,
    /// Transferred value in base units, decimal
    #[schema(example = "1000000000000000000")]
    pub value: String,
    /// Block the transaction was included in
    pub block: u64,
    /// True when filed under the receiving address
    pub inbound: bool,
}

impl TransactionRecord {
    /// Build the outbound (sender side) and inbound (receiver side) records
    /// for one wire transaction.
    pub fn pair_from_rpc(tx: &RpcTransaction, block: u64) -> (Self, Self) {
        let outbound = Self {
            hash: tx.hash.clone(),
            from: tx.from.clone(),
            to: tx.to.clone().unwrap_or_default(),
            value: codec::to_decimal_string(&tx.value),
            block,
            inbound: false,
        };
        let inbound = Self {
            inbound: true,
            ..outbound.clone()
        };
        (outbound, inbound)
    }
}
