//! In-memory state store
//!
//! Used by tests and by short-lived tooling that does not need durability.

use crate::{
    stub::StateStore,
    types::{HistoryEntry, KeyValue, TxId, WriteSet},
    Result,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

#[derive(Debug, Default)]
struct Inner {
    state: BTreeMap<String, Vec<u8>>,
    history: HashMap<String, Vec<HistoryEntry>>,
}

/// Ordered map guarded by a single lock
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.inner.read().state.len()
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.inner.read().state.is_empty()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.inner.read().state.get(key).cloned())
    }

    fn scan(&self, start: &str, end: Option<&str>) -> Result<Vec<KeyValue>> {
        if matches!(end, Some(end) if end <= start) {
            return Ok(Vec::new());
        }
        let upper = match end {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };

        let inner = self.inner.read();
        Ok(inner
            .state
            .range::<str, _>((Bound::Included(start), upper))
            .map(|(key, value)| KeyValue {
                key: key.clone(),
                value: value.clone(),
            })
            .collect())
    }

    fn history(&self, key: &str) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .inner
            .read()
            .history
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    fn commit(&self, tx_id: TxId, timestamp: DateTime<Utc>, writes: &WriteSet) -> Result<()> {
        let mut inner = self.inner.write();
        for (key, write) in writes {
            let entry = match write {
                Some(value) => {
                    inner.state.insert(key.clone(), value.clone());
                    HistoryEntry {
                        tx_id,
                        timestamp,
                        value: value.clone(),
                        is_delete: false,
                    }
                }
                None => {
                    inner.state.remove(key);
                    HistoryEntry {
                        tx_id,
                        timestamp,
                        value: Vec::new(),
                        is_delete: true,
                    }
                }
            };
            inner.history.entry(key.clone()).or_default().push(entry);
        }
        Ok(())
    }
}
