//! Redb-backed persistent embedding store.

use std::collections::HashSet;
use std::path::Path;
use std::sync::RwLock;

use chrono::Utc;
use redb::{Database, ReadableTable, TableDefinition};

use crate::codec;
use crate::{EmbeddingRecord, EmbeddingStore, StoreError, StoreResult, TrainingLogEntry};

const EMBEDDINGS: TableDefinition<u64, &[u8]> = TableDefinition::new("embeddings");
const PROCESSED: TableDefinition<&str, i64> = TableDefinition::new("processed_images");
const TRAINING_LOG: TableDefinition<u64, &[u8]> = TableDefinition::new("training_log");
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const META_DIM: &str = "dim";

/// A persistent [`EmbeddingStore`] backed by a single redb database file.
///
/// The processed-image set is mirrored in memory at open time so
/// [`EmbeddingStore::is_processed`] is an O(1) lookup with no transaction.
#[derive(Debug)]
pub struct RedbStore {
    db: Database,
    dim: usize,
    processed: RwLock<HashSet<String>>,
}

impl RedbStore {
    /// Open or create a store at the given path.
    ///
    /// The embedding dimension is pinned on first open and recorded in the
    /// meta table; reopening with a different dimension fails with
    /// [`StoreError::Dimension`].
    pub fn open<P: AsRef<Path>>(path: P, dim: usize) -> StoreResult<Self> {
        let db = Database::create(path).map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let tx = db
            .begin_write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        {
            let _ = tx
                .open_table(EMBEDDINGS)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            let _ = tx
                .open_table(PROCESSED)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            let _ = tx
                .open_table(TRAINING_LOG)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            let mut meta = tx
                .open_table(META)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;

            let stored_dim = meta
                .get(META_DIM)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?
                .map(|v| v.value());
            match stored_dim {
                Some(d) if d as usize != dim => {
                    return Err(StoreError::Dimension {
                        expected: d as usize,
                        got: dim,
                    });
                }
                Some(_) => {}
                None => {
                    meta.insert(META_DIM, dim as u64)
                        .map_err(|e| StoreError::Unavailable(e.to_string()))?;
                }
            }
        }
        tx.commit()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let processed = Self::load_processed(&db)?;
        Ok(Self {
            db,
            dim,
            processed: RwLock::new(processed),
        })
    }

    fn load_processed(db: &Database) -> StoreResult<HashSet<String>> {
        let tx = db
            .begin_read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let table = tx
            .open_table(PROCESSED)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let mut set = HashSet::new();
        for item in table
            .iter()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
        {
            let (key, _) = item.map_err(|e| StoreError::Unavailable(e.to_string()))?;
            set.insert(key.value().to_string());
        }
        Ok(set)
    }
}

impl EmbeddingStore for RedbStore {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn load_all(&self) -> StoreResult<Vec<EmbeddingRecord>> {
        let tx = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let table = tx
            .open_table(EMBEDDINGS)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let mut records = Vec::new();
        for item in table
            .iter()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
        {
            let (key, value) = item.map_err(|e| StoreError::Unavailable(e.to_string()))?;
            records.push(codec::decode_record(key.value(), value.value())?);
        }
        Ok(records)
    }

    fn append(
        &self,
        person_name: &str,
        vector: &[f32],
        image_path: &str,
        confidence: f32,
    ) -> StoreResult<u64> {
        if vector.len() != self.dim {
            return Err(StoreError::Dimension {
                expected: self.dim,
                got: vector.len(),
            });
        }

        let data = codec::encode_record(
            person_name,
            vector,
            image_path,
            Utc::now().timestamp_millis(),
            confidence,
        );

        let tx = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Write(e.to_string()))?;
        let id;
        {
            let mut table = tx
                .open_table(EMBEDDINGS)
                .map_err(|e| StoreError::Write(e.to_string()))?;
            id = table
                .last()
                .map_err(|e| StoreError::Write(e.to_string()))?
                .map(|(k, _)| k.value() + 1)
                .unwrap_or(1);
            table
                .insert(id, data.as_slice())
                .map_err(|e| StoreError::Write(e.to_string()))?;
        }
        tx.commit().map_err(|e| StoreError::Write(e.to_string()))?;
        Ok(id)
    }

    fn mark_processed(&self, image_path: &str) -> StoreResult<bool> {
        if self.processed.read().unwrap().contains(image_path) {
            return Ok(false);
        }

        let tx = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Write(e.to_string()))?;
        {
            let mut table = tx
                .open_table(PROCESSED)
                .map_err(|e| StoreError::Write(e.to_string()))?;
            table
                .insert(image_path, Utc::now().timestamp_millis())
                .map_err(|e| StoreError::Write(e.to_string()))?;
        }
        tx.commit().map_err(|e| StoreError::Write(e.to_string()))?;

        // Mirror only after the durable write committed.
        self.processed.write().unwrap().insert(image_path.to_string());
        Ok(true)
    }

    fn is_processed(&self, image_path: &str) -> bool {
        self.processed.read().unwrap().contains(image_path)
    }

    fn processed_count(&self) -> usize {
        self.processed.read().unwrap().len()
    }

    fn log_action(&self, entry: &TrainingLogEntry) -> StoreResult<()> {
        let data = codec::encode_log(entry);

        let tx = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Write(e.to_string()))?;
        {
            let mut table = tx
                .open_table(TRAINING_LOG)
                .map_err(|e| StoreError::Write(e.to_string()))?;
            let id = table
                .last()
                .map_err(|e| StoreError::Write(e.to_string()))?
                .map(|(k, _)| k.value() + 1)
                .unwrap_or(1);
            table
                .insert(id, data.as_slice())
                .map_err(|e| StoreError::Write(e.to_string()))?;
        }
        tx.commit().map_err(|e| StoreError::Write(e.to_string()))?;
        Ok(())
    }

    fn training_log(&self) -> StoreResult<Vec<TrainingLogEntry>> {
        let tx = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let table = tx
            .open_table(TRAINING_LOG)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let mut entries = Vec::new();
        for item in table
            .iter()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
        {
            let (_, value) = item.map_err(|e| StoreError::Unavailable(e.to_string()))?;
            entries.push(codec::decode_log(value.value())?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_and_load_all() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("faces.redb"), 4).unwrap();

        let id1 = store.append("alice", &[1.0, 0.0, 0.0, 0.0], "a.jpg", 1.0).unwrap();
        let id2 = store.append("bob", &[0.0, 1.0, 0.0, 0.0], "b.jpg", 0.85).unwrap();
        assert_eq!(id1, 1);
        assert_eq!(id2, 2);

        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].person_name, "alice");
        assert_eq!(records[0].vector, vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(records[1].person_name, "bob");
        assert_eq!(records[1].confidence, 0.85);
    }

    #[test]
    fn dimension_is_enforced() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("faces.redb"), 4).unwrap();

        let err = store.append("alice", &[1.0, 0.0], "a.jpg", 1.0).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Dimension {
                expected: 4,
                got: 2
            }
        ));
    }

    #[test]
    fn reopen_preserves_records_and_ledger() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("faces.redb");
        let vector = vec![0.1f32, -0.2, f32::MIN_POSITIVE];

        {
            let store = RedbStore::open(&path, 3).unwrap();
            store.append("alice", &vector, "a.jpg", 0.92).unwrap();
            assert!(store.mark_processed("a.jpg").unwrap());
        }

        let store = RedbStore::open(&path, 3).unwrap();
        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 1);
        for (got, want) in records[0].vector.iter().zip(vector.iter()) {
            assert_eq!(got.to_bits(), want.to_bits(), "lossy float round-trip");
        }
        assert!(store.is_processed("a.jpg"));
        assert_eq!(store.processed_count(), 1);

        // Ids keep counting from where they left off.
        let id = store.append("bob", &[0.0, 1.0, 0.0], "b.jpg", 1.0).unwrap();
        assert_eq!(id, 2);
    }

    #[test]
    fn reopen_with_different_dimension_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("faces.redb");
        RedbStore::open(&path, 512).unwrap();

        let err = RedbStore::open(&path, 128).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Dimension {
                expected: 512,
                got: 128
            }
        ));
    }

    #[test]
    fn mark_processed_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("faces.redb"), 2).unwrap();

        assert!(!store.is_processed("img.jpg"));
        assert!(store.mark_processed("img.jpg").unwrap());
        assert!(!store.mark_processed("img.jpg").unwrap());
        assert!(store.is_processed("img.jpg"));
        assert_eq!(store.processed_count(), 1);
    }

    #[test]
    fn training_log_appends_in_order() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("faces.redb"), 2).unwrap();

        for (name, action) in [("alice", "NEW_PERSON"), ("alice", "AUTO_CONFIRMED")] {
            store
                .log_action(&TrainingLogEntry {
                    image_path: "a.jpg".into(),
                    person_name: name.into(),
                    action: action.into(),
                    timestamp: 1,
                    confidence: 1.0,
                })
                .unwrap();
        }

        let log = store.training_log().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].action, "NEW_PERSON");
        assert_eq!(log[1].action, "AUTO_CONFIRMED");
    }
}
