//! In-memory embedding store for testing and ephemeral use.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::Utc;

use crate::{EmbeddingRecord, EmbeddingStore, StoreError, StoreResult, TrainingLogEntry};

/// An [`EmbeddingStore`] that keeps everything in memory.
/// Data is lost on restart.
pub struct MemoryStore {
    dim: usize,
    inner: Mutex<Inner>,
}

struct Inner {
    records: Vec<EmbeddingRecord>,
    processed: HashSet<String>,
    log: Vec<TrainingLogEntry>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            inner: Mutex::new(Inner {
                records: Vec::new(),
                processed: HashSet::new(),
                log: Vec::new(),
                next_id: 1,
            }),
        }
    }
}

impl EmbeddingStore for MemoryStore {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn load_all(&self) -> StoreResult<Vec<EmbeddingRecord>> {
        Ok(self.inner.lock().unwrap().records.clone())
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
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.records.push(EmbeddingRecord {
            id,
            person_name: person_name.to_string(),
            vector: vector.to_vec(),
            image_path: image_path.to_string(),
            created_at: Utc::now().timestamp_millis(),
            confidence,
        });
        Ok(id)
    }

    fn mark_processed(&self, image_path: &str) -> StoreResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.processed.insert(image_path.to_string()))
    }

    fn is_processed(&self, image_path: &str) -> bool {
        self.inner.lock().unwrap().processed.contains(image_path)
    }

    fn processed_count(&self) -> usize {
        self.inner.lock().unwrap().processed.len()
    }

    fn log_action(&self, entry: &TrainingLogEntry) -> StoreResult<()> {
        self.inner.lock().unwrap().log.push(entry.clone());
        Ok(())
    }

    fn training_log(&self) -> StoreResult<Vec<TrainingLogEntry>> {
        Ok(self.inner.lock().unwrap().log.clone())
    }
}
