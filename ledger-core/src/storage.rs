//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `state` - Current world state (key: UTF-8 state key)
//! - `history` - Per-key version log (key: len(key) || key || seq)
//! - `meta` - Store metadata (global history sequence)

use crate::{
    error::{Error, Result},
    stub::StateStore,
    types::{HistoryEntry, KeyValue, TxId, WriteSet},
    Config,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB,
};
use std::sync::Arc;

/// Column family names
const CF_STATE: &str = "state";
const CF_HISTORY: &str = "history";
const CF_META: &str = "meta";

const META_SEQUENCE: &[u8] = b"history_seq";

/// RocksDB-backed state store
pub struct RocksStore {
    db: Arc<DB>,
    // Serializes commits so history sequence numbers stay gap-free
    sequence: Mutex<u64>,
}

impl std::fmt::Debug for RocksStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksStore")
            .field("path", &self.db.path())
            .finish()
    }
}

impl RocksStore {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_STATE, Self::cf_options_state()),
            ColumnFamilyDescriptor::new(CF_HISTORY, Self::cf_options_history()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        let sequence = {
            let cf = db
                .cf_handle(CF_META)
                .ok_or_else(|| Error::Storage(format!("Column family {} not found", CF_META)))?;
            match db.get_cf(&cf, META_SEQUENCE)? {
                Some(bytes) => decode_u64(&bytes)?,
                None => 0,
            }
        };

        let store = Self {
            db: Arc::new(db),
            sequence: Mutex::new(sequence),
        };

        tracing::info!(
            path = ?path,
            keys = store.approximate_key_count().unwrap_or(0),
            history_seq = sequence,
            "Opened RocksDB state store"
        );

        Ok(store)
    }

    fn cf_options_state() -> Options {
        let mut opts = Options::default();
        // State is frequently read, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_options_history() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    /// `u32` big-endian length, key bytes, then the sequence number if any
    fn history_key(key: &str, seq: Option<u64>) -> Result<Vec<u8>> {
        let len = u32::try_from(key.len())
            .map_err(|_| Error::InvalidKey(format!("key of {} bytes is too long", key.len())))?;
        let mut out = Vec::with_capacity(4 + key.len() + 8);
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(key.as_bytes());
        if let Some(seq) = seq {
            out.extend_from_slice(&seq.to_be_bytes());
        }
        Ok(out)
    }

    /// Estimated number of live state keys
    pub fn approximate_key_count(&self) -> Result<u64> {
        let cf = self.cf_handle(CF_STATE)?;
        Ok(self
            .db
            .property_int_value_cf(&cf, "rocksdb.estimate-num-keys")?
            .unwrap_or(0))
    }

    /// Close database (graceful shutdown)
    pub fn close(self) -> Result<()> {
        drop(self.db);
        tracing::info!("RocksDB closed gracefully");
        Ok(())
    }
}

fn decode_u64(bytes: &[u8]) -> Result<u64> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| Error::Storage("corrupt history sequence".to_string()))?;
    Ok(u64::from_be_bytes(array))
}

fn decode_key(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| Error::Storage(format!("non UTF-8 state key: {}", e)))
}

impl StateStore for RocksStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let cf = self.cf_handle(CF_STATE)?;
        Ok(self.db.get_cf(&cf, key.as_bytes())?)
    }

    fn scan(&self, start: &str, end: Option<&str>) -> Result<Vec<KeyValue>> {
        let cf = self.cf_handle(CF_STATE)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(start.as_bytes(), Direction::Forward));

        let mut out = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if let Some(end) = end {
                if &key[..] >= end.as_bytes() {
                    break;
                }
            }
            out.push(KeyValue {
                key: decode_key(&key)?,
                value: value.to_vec(),
            });
        }
        Ok(out)
    }

    fn history(&self, key: &str) -> Result<Vec<HistoryEntry>> {
        let cf = self.cf_handle(CF_HISTORY)?;
        let prefix = Self::history_key(key, None)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward));

        let mut entries = Vec::new();
        for item in iter {
            let (k, value) = item?;
            if !k.starts_with(&prefix) {
                break;
            }
            entries.push(bincode::deserialize(&value)?);
        }
        Ok(entries)
    }

    fn commit(&self, tx_id: TxId, timestamp: DateTime<Utc>, writes: &WriteSet) -> Result<()> {
        let cf_state = self.cf_handle(CF_STATE)?;
        let cf_history = self.cf_handle(CF_HISTORY)?;
        let cf_meta = self.cf_handle(CF_META)?;

        let mut sequence = self.sequence.lock();
        let mut next = *sequence;
        let mut batch = WriteBatch::default();

        for (key, write) in writes {
            next += 1;
            let entry = match write {
                Some(value) => {
                    batch.put_cf(&cf_state, key.as_bytes(), value);
                    HistoryEntry {
                        tx_id,
                        timestamp,
                        value: value.clone(),
                        is_delete: false,
                    }
                }
                None => {
                    batch.delete_cf(&cf_state, key.as_bytes());
                    HistoryEntry {
                        tx_id,
                        timestamp,
                        value: Vec::new(),
                        is_delete: true,
                    }
                }
            };
            batch.put_cf(
                &cf_history,
                Self::history_key(key, Some(next))?,
                bincode::serialize(&entry)?,
            );
        }
        batch.put_cf(&cf_meta, META_SEQUENCE, next.to_be_bytes());

        // Atomic commit
        self.db.write(batch)?;
        *sequence = next;

        tracing::debug!(tx_id = %tx_id, writes = writes.len(), "Write set persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config() -> (Config, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (config, temp_dir)
    }

    fn put(key: &str, value: &str) -> WriteSet {
        let mut writes = WriteSet::new();
        writes.insert(key.to_string(), Some(value.as_bytes().to_vec()));
        writes
    }

    #[test]
    fn test_storage_open() {
        let (config, _temp) = test_config();
        let store = RocksStore::open(&config).unwrap();
        assert!(store.db.cf_handle(CF_STATE).is_some());
        assert!(store.db.cf_handle(CF_HISTORY).is_some());
    }

    #[test]
    fn test_commit_and_get() {
        let (config, _temp) = test_config();
        let store = RocksStore::open(&config).unwrap();

        store.commit(TxId::generate(), Utc::now(), &put("Battery-1", "{}")).unwrap();
        assert_eq!(store.get("Battery-1").unwrap(), Some(b"{}".to_vec()));
        assert_eq!(store.get("Battery-2").unwrap(), None);
    }

    #[test]
    fn test_scan_respects_end() {
        let (config, _temp) = test_config();
        let store = RocksStore::open(&config).unwrap();

        let mut writes = WriteSet::new();
        for key in ["a", "b", "c"] {
            writes.insert(key.to_string(), Some(b"v".to_vec()));
        }
        store.commit(TxId::generate(), Utc::now(), &writes).unwrap();

        let keys: Vec<String> = store
            .scan("a", Some("c"))
            .unwrap()
            .into_iter()
            .map(|kv| kv.key)
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_history_is_per_key_and_ordered() {
        let (config, _temp) = test_config();
        let store = RocksStore::open(&config).unwrap();

        let first = TxId::generate();
        store.commit(first, Utc::now(), &put("ab", "1")).unwrap();
        store.commit(TxId::generate(), Utc::now(), &put("a", "x")).unwrap();

        let mut delete = WriteSet::new();
        delete.insert("ab".to_string(), None);
        store.commit(TxId::generate(), Utc::now(), &delete).unwrap();

        let history = store.history("ab").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].tx_id, first);
        assert!(history[1].is_delete);
        assert_eq!(store.history("a").unwrap().len(), 1);
        assert_eq!(store.get("ab").unwrap(), None);
    }

    #[test]
    fn test_sequence_survives_reopen() {
        let (config, _temp) = test_config();
        {
            let store = RocksStore::open(&config).unwrap();
            store.commit(TxId::generate(), Utc::now(), &put("k", "1")).unwrap();
            store.close().unwrap();
        }

        let store = RocksStore::open(&config).unwrap();
        store.commit(TxId::generate(), Utc::now(), &put("k", "2")).unwrap();

        let values: Vec<Vec<u8>> = store.history("k").unwrap().into_iter().map(|e| e.value).collect();
        assert_eq!(values, vec![b"1".to_vec(), b"2".to_vec()]);
    }
}
