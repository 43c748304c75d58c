//! Query Facade
//!
//! Read-only view over the scanner consumed by the REST gateway. Errors from
//! the scanning tasks never surface here: a stalled cursor is the only
//! visible symptom of a sick RPC endpoint.

use crate::models::TransactionRecord;

pub trait QueryFacade: Send + Sync {
    /// Last block fully attempted by the forward poll (0 before startup)
    fn current_block(&self) -> u64;

    /// Subscribe `address`; `false` means it was already subscribed
    fn subscribe(&self, address: &str) -> bool;

    /// Records filed under `address`, in arrival order
    fn get_transactions(&self, address: &str) -> Vec<TransactionRecord>;

    fn subscription_count(&self) -> usize;
}
