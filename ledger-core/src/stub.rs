//! Transaction stub
//!
//! [`StateStore`] is the committed world state (memory or RocksDB).
//! [`LedgerStub`] is what chaincode sees during one invocation.
//! [`TxContext`] implements the stub on top of a store: reads go to the
//! committed state overlaid with the staged write set, writes are staged, and
//! [`TxContext::commit`] hands the whole write set to the store at once.
//! Dropping a context without committing discards every staged write.

use crate::{
    composite::{self, is_composite_key, prefix_range_end},
    config::QueryConfig,
    selector::Query,
    types::{HistoryEntry, KeyValue, QueryPage, TxId, WriteSet},
    Error, Result,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Committed, ordered key-value state with per-key history
pub trait StateStore: Send + Sync {
    /// Read the committed value of a key
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Committed entries in `[start, end)` in ascending key order; `None`
    /// means unbounded
    fn scan(&self, start: &str, end: Option<&str>) -> Result<Vec<KeyValue>>;

    /// Committed versions of a key, oldest first
    fn history(&self, key: &str) -> Result<Vec<HistoryEntry>>;

    /// Apply a write set atomically and append one history entry per key
    fn commit(&self, tx_id: TxId, timestamp: DateTime<Utc>, writes: &WriteSet) -> Result<()>;
}

/// Ledger operations available to chaincode during one invocation
pub trait LedgerStub {
    /// Identifier of the running transaction
    fn tx_id(&self) -> TxId;

    /// Timestamp of the running transaction
    fn tx_timestamp(&self) -> DateTime<Utc>;

    /// Read a key; `None` when absent
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stage a write
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Stage a delete
    fn del_state(&mut self, key: &str) -> Result<()>;

    /// Simple keys in `[start, end)`, ascending; an empty `end` is unbounded.
    /// Composite keys are never returned.
    fn get_state_by_range(&self, start: &str, end: &str) -> Result<Vec<KeyValue>>;

    /// Composite keys under `object_type` whose leading attributes equal
    /// `attributes`, ascending
    fn get_state_by_partial_composite_key(
        &self,
        object_type: &str,
        attributes: &[&str],
    ) -> Result<Vec<KeyValue>>;

    /// One page of simple keys in `[start, end)`; pass the returned bookmark
    /// to continue
    fn get_state_by_range_with_pagination(
        &self,
        start: &str,
        end: &str,
        page_size: usize,
        bookmark: &str,
    ) -> Result<QueryPage>;

    /// Documents matching a rich query, ascending by key
    fn get_query_result(&self, query: &str) -> Result<Vec<KeyValue>>;

    /// One page of a rich query; pass the returned bookmark to continue
    fn get_query_result_with_pagination(
        &self,
        query: &str,
        page_size: usize,
        bookmark: &str,
    ) -> Result<QueryPage>;

    /// Committed versions of a key, oldest first
    fn get_history_for_key(&self, key: &str) -> Result<Vec<HistoryEntry>>;

    /// Build a composite key
    fn create_composite_key(&self, object_type: &str, attributes: &[&str]) -> Result<String> {
        composite::create_composite_key(object_type, attributes)
    }

    /// Split a composite key
    fn split_composite_key(&self, key: &str) -> Result<(String, Vec<String>)> {
        composite::split_composite_key(key)
    }
}

/// One invocation's view of a [`StateStore`]
#[derive(Debug)]
pub struct TxContext<'s, S: StateStore + ?Sized> {
    store: &'s S,
    tx_id: TxId,
    timestamp: DateTime<Utc>,
    writes: WriteSet,
    max_page_size: usize,
}

impl<'s, S: StateStore + ?Sized> TxContext<'s, S> {
    /// Open a transaction against a store
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            tx_id: TxId::generate(),
            timestamp: Utc::now(),
            writes: BTreeMap::new(),
            max_page_size: QueryConfig::default().max_page_size,
        }
    }

    /// Apply query limits from configuration
    pub fn with_query_config(mut self, config: &QueryConfig) -> Self {
        self.max_page_size = config.max_page_size;
        self
    }

    /// Number of staged writes
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Commit every staged write atomically
    pub fn commit(self) -> Result<TxId> {
        if !self.writes.is_empty() {
            self.store.commit(self.tx_id, self.timestamp, &self.writes)?;
            tracing::debug!(
                tx_id = %self.tx_id,
                writes = self.writes.len(),
                "Transaction committed"
            );
        }
        Ok(self.tx_id)
    }

    fn merged_scan(&self, start: &str, end: Option<&str>) -> Result<Vec<KeyValue>> {
        if matches!(end, Some(end) if end < start) {
            return Ok(Vec::new());
        }

        let mut merged: BTreeMap<String, Vec<u8>> = self
            .store
            .scan(start, end)?
            .into_iter()
            .map(|kv| (kv.key, kv.value))
            .collect();

        let upper = match end {
            Some(end) => Bound::Excluded(end.to_string()),
            None => Bound::Unbounded,
        };
        for (key, staged) in self
            .writes
            .range::<String, _>((Bound::Included(start.to_string()), upper))
        {
            match staged {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(merged
            .into_iter()
            .map(|(key, value)| KeyValue { key, value })
            .collect())
    }

    /// Documents matching `query` with keys strictly after `after`
    fn matching_documents(&self, query: &Query, after: Option<&str>) -> Result<Vec<KeyValue>> {
        let start = after.unwrap_or("");
        let mut matches = Vec::new();

        for kv in self.merged_scan(start, None)? {
            if is_composite_key(&kv.key) || Some(kv.key.as_str()) == after {
                continue;
            }
            let document: Value = match serde_json::from_slice(&kv.value) {
                Ok(doc @ Value::Object(_)) => doc,
                _ => continue,
            };
            if query.selector.matches(&document) {
                matches.push(kv);
            }
        }

        Ok(matches)
    }

    fn check_page_size(&self, page_size: usize) -> Result<()> {
        if page_size == 0 || page_size > self.max_page_size {
            return Err(Error::InvalidQuery(format!(
                "page size must be between 1 and {}",
                self.max_page_size
            )));
        }
        Ok(())
    }
}

/// Cut a page; the bookmark is the last key returned, or the previous
/// bookmark when the page is empty
fn page(mut records: Vec<KeyValue>, page_size: usize, bookmark: &str) -> QueryPage {
    records.truncate(page_size);
    let bookmark = records
        .last()
        .map(|kv| kv.key.clone())
        .unwrap_or_else(|| bookmark.to_string());
    QueryPage {
        fetched_records_count: records.len(),
        records,
        bookmark,
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidKey("key must not be empty".to_string()));
    }
    Ok(())
}

impl<'s, S: StateStore + ?Sized> LedgerStub for TxContext<'s, S> {
    fn tx_id(&self) -> TxId {
        self.tx_id
    }

    fn tx_timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        match self.writes.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => self.store.get(key),
        }
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        validate_key(key)?;
        if value.is_empty() {
            return Err(Error::InvalidKey(format!(
                "value for {:?} must not be empty; use del_state",
                key
            )));
        }
        self.writes.insert(key.to_string(), Some(value));
        Ok(())
    }

    fn del_state(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.writes.insert(key.to_string(), None);
        Ok(())
    }

    fn get_state_by_range(&self, start: &str, end: &str) -> Result<Vec<KeyValue>> {
        let end = (!end.is_empty()).then_some(end);
        Ok(self
            .merged_scan(start, end)?
            .into_iter()
            .filter(|kv| !is_composite_key(&kv.key))
            .collect())
    }

    fn get_state_by_partial_composite_key(
        &self,
        object_type: &str,
        attributes: &[&str],
    ) -> Result<Vec<KeyValue>> {
        let prefix = composite::create_composite_key(object_type, attributes)?;
        let end = prefix_range_end(&prefix);
        self.merged_scan(&prefix, Some(&end))
    }

    fn get_query_result(&self, query: &str) -> Result<Vec<KeyValue>> {
        let query = Query::parse(query)?;
        let mut records = self.matching_documents(&query, None)?;
        if let Some(limit) = query.limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    fn get_state_by_range_with_pagination(
        &self,
        start: &str,
        end: &str,
        page_size: usize,
        bookmark: &str,
    ) -> Result<QueryPage> {
        self.check_page_size(page_size)?;
        let from = if bookmark > start { bookmark } else { start };
        let records = self
            .get_state_by_range(from, end)?
            .into_iter()
            .filter(|kv| bookmark.is_empty() || kv.key.as_str() > bookmark)
            .take(page_size)
            .collect();
        Ok(page(records, page_size, bookmark))
    }

    fn get_query_result_with_pagination(
        &self,
        query: &str,
        page_size: usize,
        bookmark: &str,
    ) -> Result<QueryPage> {
        self.check_page_size(page_size)?;
        let query = Query::parse(query)?;
        let after = (!bookmark.is_empty()).then_some(bookmark);
        let records = self.matching_documents(&query, after)?;
        Ok(page(records, page_size, bookmark))
    }

    fn get_history_for_key(&self, key: &str) -> Result<Vec<HistoryEntry>> {
        validate_key(key)?;
        self.store.history(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn doc(owner: &str) -> Vec<u8> {
        format!(r#"{{"docType":"battery","owner":"{}"}}"#, owner).into_bytes()
    }

    #[test]
    fn test_read_your_writes() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);

        tx.put_state("a", b"1".to_vec()).unwrap();
        assert_eq!(tx.get_state("a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get("a").unwrap(), None);

        tx.del_state("a").unwrap();
        assert_eq!(tx.get_state("a").unwrap(), None);
    }

    #[test]
    fn test_drop_discards_writes() {
        let store = MemoryStore::new();
        {
            let mut tx = TxContext::new(&store);
            tx.put_state("a", b"1".to_vec()).unwrap();
        }
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_commit_applies_all_writes() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);
        tx.put_state("a", b"1".to_vec()).unwrap();
        tx.put_state("b", b"2".to_vec()).unwrap();
        assert_eq!(tx.pending_writes(), 2);
        let tx_id = tx.commit().unwrap();

        assert_eq!(store.get("a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get("b").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.history("a").unwrap()[0].tx_id, tx_id);
    }

    #[test]
    fn test_empty_key_and_value_rejected() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(&store);
        assert!(matches!(tx.put_state("", b"1".to_vec()), Err(Error::InvalidKey(_))));
        assert!(matches!(tx.put_state("a", Vec::new()), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_range_merges_staged_writes_and_skips_composites() {
        let store = MemoryStore::new();
        let mut setup = TxContext::new(&store);
        for key in ["k1", "k2", "k3"] {
            setup.put_state(key, b"v".to_vec()).unwrap();
        }
        let index = setup.create_composite_key("idx", &["x"]).unwrap();
        setup.put_state(&index, vec![0]).unwrap();
        setup.commit().unwrap();

        let mut tx = TxContext::new(&store);
        tx.del_state("k2").unwrap();
        tx.put_state("k25", b"v".to_vec()).unwrap();

        let keys: Vec<String> = tx
            .get_state_by_range("", "k3")
            .unwrap()
            .into_iter()
            .map(|kv| kv.key)
            .collect();
        assert_eq!(keys, vec!["k1", "k25"]);

        assert!(tx.get_state_by_range("k3", "k1").unwrap().is_empty());
    }

    #[test]
    fn test_pagination_walks_all_pages() {
        let store = MemoryStore::new();
        let mut setup = TxContext::new(&store);
        for i in 0..5 {
            setup.put_state(&format!("b{}", i), doc("tom")).unwrap();
        }
        setup.put_state("other", doc("jerry")).unwrap();
        setup.commit().unwrap();

        let tx = TxContext::new(&store);
        let query = r#"{"selector":{"owner":"tom"}}"#;

        let first = tx.get_query_result_with_pagination(query, 2, "").unwrap();
        assert_eq!(first.fetched_records_count, 2);
        assert_eq!(first.bookmark, "b1");

        let second = tx
            .get_query_result_with_pagination(query, 2, &first.bookmark)
            .unwrap();
        let keys: Vec<&str> = second.records.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, vec!["b2", "b3"]);

        let third = tx
            .get_query_result_with_pagination(query, 2, &second.bookmark)
            .unwrap();
        assert_eq!(third.fetched_records_count, 1);

        let done = tx
            .get_query_result_with_pagination(query, 2, &third.bookmark)
            .unwrap();
        assert_eq!(done.fetched_records_count, 0);
        assert_eq!(done.bookmark, third.bookmark);
    }

    #[test]
    fn test_range_pagination_respects_bounds_and_bookmark() {
        let store = MemoryStore::new();
        let mut setup = TxContext::new(&store);
        for key in ["a", "b1", "b2", "b3", "c"] {
            setup.put_state(key, doc("tom")).unwrap();
        }
        setup.commit().unwrap();

        let mut tx = TxContext::new(&store);
        tx.put_state("b4", doc("jerry")).unwrap();
        let composite = composite::create_composite_key("model~number", &["b", "x"]).unwrap();
        tx.put_state(&composite, vec![0]).unwrap();

        let first = tx.get_state_by_range_with_pagination("b", "c", 2, "").unwrap();
        let keys: Vec<&str> = first.records.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, vec!["b1", "b2"]);
        assert_eq!(first.bookmark, "b2");

        let second = tx
            .get_state_by_range_with_pagination("b", "c", 2, &first.bookmark)
            .unwrap();
        let keys: Vec<&str> = second.records.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, vec!["b3", "b4"]);

        let done = tx
            .get_state_by_range_with_pagination("b", "c", 2, &second.bookmark)
            .unwrap();
        assert_eq!(done.fetched_records_count, 0);
        assert_eq!(done.bookmark, "b4");

        assert!(tx.get_state_by_range_with_pagination("a", "", 0, "").is_err());
    }

    #[test]
    fn test_page_size_bounds() {
        let store = MemoryStore::new();
        let tx = TxContext::new(&store).with_query_config(&QueryConfig { max_page_size: 3 });
        let query = r#"{"selector":{}}"#;
        assert!(tx.get_query_result_with_pagination(query, 0, "").is_err());
        assert!(tx.get_query_result_with_pagination(query, 4, "").is_err());
        assert!(tx.get_query_result_with_pagination(query, 3, "").is_ok());
    }

    #[test]
    fn test_query_limit_and_non_json_values() {
        let store = MemoryStore::new();
        let mut setup = TxContext::new(&store);
        setup.put_state("a", doc("tom")).unwrap();
        setup.put_state("b", doc("tom")).unwrap();
        setup.put_state("raw", b"not json".to_vec()).unwrap();
        setup.commit().unwrap();

        let tx = TxContext::new(&store);
        let all = tx.get_query_result(r#"{"selector":{}}"#).unwrap();
        assert_eq!(all.len(), 2);
        let limited = tx
            .get_query_result(r#"{"selector":{"owner":"tom"},"limit":1}"#)
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].key, "a");
    }
}
