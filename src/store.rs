//! Address Store
//!
//! Thread-safe mapping from address to its append-only list of
//! [`TransactionRecord`]s, plus the subscription set that gates reads.
//!
//! Ingestion is address-agnostic: every participant of every processed block
//! is indexed whether or not anybody has subscribed to it, so a later
//! subscription sees the history accrued before it. Visibility is a separate
//! policy ([`ReadVisibility`]).

use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};

use crate::models::TransactionRecord;

/// Who may read an address's records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadVisibility {
    /// Records are returned only for subscribed addresses
    #[default]
    SubscribedOnly,
    /// Records are returned for any address
    All,
}

/// Storage seam used by the scanner (writes) and the query facade (reads)
pub trait AddressStore: Send + Sync {
    /// Register `address`. Returns `false` if it was already subscribed.
    fn subscribe(&self, address: &str) -> bool;

    /// Append a record to `address`'s list, creating the list if needed
    fn add_transaction(&self, address: &str, record: TransactionRecord);

    /// Records for `address` in insertion order, subject to read visibility
    fn get_transactions(&self, address: &str) -> Vec<TransactionRecord>;

    fn is_subscribed(&self, address: &str) -> bool;

    /// Number of subscribed addresses
    fn subscription_count(&self) -> usize;

    /// Number of addresses holding at least one record
    fn address_count(&self) -> usize;
}

/// In-memory [`AddressStore`].
///
/// Both maps are sharded (DashMap), so the scanner's concurrent writers and
/// the REST readers only contend per shard. Appends to one address are
/// serialized by that address's shard lock.
pub struct MemoryStore {
    subscriptions: DashSet<String>,
    records: DashMap<String, Vec<TransactionRecord>>,
    visibility: ReadVisibility,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_visibility(ReadVisibility::default())
    }

    pub fn with_visibility(visibility: ReadVisibility) -> Self {
        Self {
            subscriptions: DashSet::new(),
            records: DashMap::new(),
            visibility,
        }
    }

    pub fn visibility(&self) -> ReadVisibility {
        self.visibility
    }

    /// Total records stored across all addresses
    pub fn record_count(&self) -> usize {
        self.records.iter().map(|entry| entry.value().len()).sum()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressStore for MemoryStore {
    fn subscribe(&self, address: &str) -> bool {
        // DashSet::insert is atomic per shard: exactly one caller wins
        self.subscriptions.insert(address.to_string())
    }

    fn add_transaction(&self, address: &str, record: TransactionRecord) {
        self.records
            .entry(address.to_string())
            .or_insert_with(Vec::new)
            .push(record);
    }

    fn get_transactions(&self, address: &str) -> Vec<TransactionRecord> {
        if self.visibility == ReadVisibility::SubscribedOnly && !self.is_subscribed(address) {
            return Vec::new();
        }
        self.records
            .get(address)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    fn is_subscribed(&self, address: &str) -> bool {
        self.subscriptions.contains(address)
    }

    fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn address_count(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn record(hash: &str, block: u64, inbound: bool) -> TransactionRecord {
        TransactionRecord {
            hash: hash.to_string(),
            from: "0xfrom".to_string(),
            to: "0xto".to_string(),
            value: "1".to_string(),
            block,
            inbound,
        }
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let store = MemoryStore::new();

        assert!(store.subscribe("0xabc"));
        assert!(!store.subscribe("0xabc"));
        assert!(store.is_subscribed("0xabc"));
        assert_eq!(store.subscription_count(), 1);
    }

    #[test]
    fn test_addresses_are_case_sensitive() {
        let store = MemoryStore::new();

        assert!(store.subscribe("0xABC"));
        assert!(store.subscribe("0xabc"));
        assert!(!store.is_subscribed("0xAbc"));
    }

    #[test]
    fn test_unsubscribed_reads_are_empty_but_storage_accumulates() {
        let store = MemoryStore::new();
        store.add_transaction("0xabc", record("h1", 1, true));
        store.add_transaction("0xabc", record("h2", 2, false));

        // stored but hidden
        assert!(store.get_transactions("0xabc").is_empty());
        assert_eq!(store.record_count(), 2);
        assert_eq!(store.address_count(), 1);

        // full history appears right after subscribing
        store.subscribe("0xabc");
        let txs = store.get_transactions("0xabc");
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].hash, "h1");
        assert_eq!(txs[1].hash, "h2");
    }

    #[test]
    fn test_subscribed_without_records_is_empty() {
        let store = MemoryStore::new();
        store.subscribe("0xabc");
        assert!(store.get_transactions("0xabc").is_empty());
    }

    #[test]
    fn test_visibility_all_ignores_subscriptions() {
        let store = MemoryStore::with_visibility(ReadVisibility::All);
        store.add_transaction("0xabc", record("h1", 1, true));

        assert_eq!(store.visibility(), ReadVisibility::All);
        assert_eq!(store.get_transactions("0xabc").len(), 1);
        assert!(!store.is_subscribed("0xabc"));
    }

    #[test]
    fn test_visibility_deserialize() {
        let v: ReadVisibility = serde_yaml::from_str("subscribed_only").unwrap();
        assert_eq!(v, ReadVisibility::SubscribedOnly);
        let v: ReadVisibility = serde_yaml::from_str("all").unwrap();
        assert_eq!(v, ReadVisibility::All);
    }

    #[test]
    fn test_concurrent_subscribe_exactly_once() {
        let store = Arc::new(MemoryStore::new());
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                let winners = winners.clone();
                thread::spawn(move || {
                    if store.subscribe("0xshared") {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        store.subscribe("0xhot");

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        store.add_transaction("0xhot", record(&format!("{}-{}", t, i), i, true));
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        let txs = store.get_transactions("0xhot");
        assert_eq!(txs.len(), 2000);

        // per-writer order survives interleaving
        let mine: Vec<u64> = txs
            .iter()
            .filter(|r| r.hash.starts_with("3-"))
            .map(|r| r.block)
            .collect();
        assert_eq!(mine, (0..250).collect::<Vec<_>>());
    }
}
