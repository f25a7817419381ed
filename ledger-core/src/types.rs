//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode for history records)
//! - Stable key ordering (`String` keys compared bytewise)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Staged writes of one transaction: `None` marks a delete
pub type WriteSet = BTreeMap<String, Option<Vec<u8>>>;

/// Transaction identifier (UUIDv7 for time-ordering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId(Uuid);

impl TxId {
    /// Generate a fresh time-ordered ID
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// A key and its current value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// State key
    pub key: String,
    /// Stored bytes
    pub value: Vec<u8>,
}

/// One committed version of a key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Transaction that wrote this version
    pub tx_id: TxId,

    /// Commit timestamp
    pub timestamp: DateTime<Utc>,

    /// Value written (empty for deletes)
    pub value: Vec<u8>,

    /// Whether this version is a delete marker
    pub is_delete: bool,
}

/// One page of a paginated rich query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPage {
    /// Matching records in key order
    pub records: Vec<KeyValue>,

    /// Number of records in this page
    pub fetched_records_count: usize,

    /// Opaque bookmark to pass for the next page
    pub bookmark: String,
}
