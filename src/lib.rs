//! tx_indexer - per-address transaction index over a JSON-RPC ledger
//!
//! # Modules
//!
//! - [`codec`] - Hex quantity decoding and block-number encoding
//! - [`rpc`] - JSON-RPC client seam, HTTP implementation and in-memory mock
//! - [`models`] - Indexed transaction records
//! - [`store`] - Subscriptions and per-address record lists
//! - [`scanner`] - Backward scan and forward poll feeding the store
//! - [`facade`] - Read-only query surface used by the gateway
//! - [`gateway`] - REST endpoints and OpenAPI docs
//! - [`config`] / [`logging`] - YAML configuration and tracing setup
//! - [`shutdown`] - Cooperative cancellation

pub mod codec;
pub mod config;
pub mod facade;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod rpc;
pub mod scanner;
pub mod shutdown;
pub mod store;

// Convenient re-exports at crate root
pub use config::{AppConfig, ScannerConfig};
pub use facade::QueryFacade;
pub use models::TransactionRecord;
pub use rpc::{HttpRpcClient, MockRpcClient, RpcClient, RpcError};
pub use scanner::{BlockScanner, ScannerError, ScannerState};
pub use shutdown::ShutdownSignal;
pub use store::{AddressStore, MemoryStore, ReadVisibility};
