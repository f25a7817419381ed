//! Ledger Core
//!
//! Transactional key-value world state for the battery swap chaincode.
//!
//! # Architecture
//!
//! - **World state**: ordered `String` keys mapped to opaque byte values
//! - **Transactions**: one [`TxContext`] per invocation stages writes and
//!   commits them as a single atomic write set
//! - **History**: every committed write appends a `(tx_id, timestamp, value,
//!   is_delete)` entry for its key
//! - **Composite keys**: `U+0000`-delimited keys for prefix scans
//! - **Rich queries**: JSON selectors evaluated over stored documents
//!
//! # Invariants
//!
//! - Atomicity: a write set is applied completely or not at all
//! - Read-your-writes: a transaction observes its own staged writes
//! - Ordering: scans and query results ascend by key
//! - History is append-only, oldest to newest

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod composite;
pub mod config;
pub mod error;
pub mod memory;
pub mod selector;
pub mod storage;
pub mod stub;
pub mod types;

// Re-exports
pub use composite::{create_composite_key, split_composite_key};
pub use config::Config;
pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use selector::{Query, Selector};
pub use storage::RocksStore;
pub use stub::{LedgerStub, StateStore, TxContext};
pub use types::{HistoryEntry, KeyValue, QueryPage, TxId, WriteSet};
