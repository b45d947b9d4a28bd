//! Durable persistence for the face registry.
//!
//! Three logical tables back the recognition engine:
//!
//! - **embeddings**: one immutable record per accepted face embedding
//! - **processed images**: ledger of source images already ingested, so a
//!   repeated run never reprocesses the same image
//! - **training log**: append-only audit trail of ingestion decisions,
//!   written by the engine but never read back by it
//!
//! [`RedbStore`] persists all three tables in a single redb database file.
//! [`MemoryStore`] keeps them in memory for testing and ephemeral use.
//! Both are accessed through the [`EmbeddingStore`] trait.

pub mod codec;
pub mod memory;
pub mod redb;

use thiserror::Error;

/// Errors that can occur in store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store: unavailable: {0}")]
    Unavailable(String),

    #[error("store: write failed: {0}")]
    Write(String),

    #[error("store: dimension mismatch: expected {expected}, got {got}")]
    Dimension { expected: usize, got: usize },

    #[error("store: corrupt record: {0}")]
    Corrupt(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A single durable embedding record. Immutable once written; the engine
/// never updates or deletes records.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    /// Store-assigned monotonic id.
    pub id: u64,

    /// Identity label. Free-form; an identity exists the first time its
    /// name is used.
    pub person_name: String,

    /// Embedding vector. Length is fixed at store open time.
    pub vector: Vec<f32>,

    /// Source image the face came from.
    pub image_path: String,

    /// Unix timestamp in milliseconds.
    pub created_at: i64,

    /// 1.0 for manual registration, the match similarity for confirmed
    /// and auto-confirmed records.
    pub confidence: f32,
}

/// One entry of the append-only training audit log.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingLogEntry {
    pub image_path: String,
    pub person_name: String,

    /// One of NEW_PERSON, AUTO_CONFIRMED, CONFIRMED, CORRECTED.
    pub action: String,

    /// Unix timestamp in milliseconds.
    pub timestamp: i64,

    pub confidence: f32,
}

/// Durable storage for the face registry.
///
/// Implementations must be safe for concurrent use (Send + Sync).
pub trait EmbeddingStore: Send + Sync {
    /// Embedding dimensionality this store was opened with.
    fn dimension(&self) -> usize;

    /// Full scan of all embedding records, used once at startup to hydrate
    /// the in-memory identity index. Records come back in insertion order,
    /// but callers must not rely on it.
    fn load_all(&self) -> StoreResult<Vec<EmbeddingRecord>>;

    /// Durably writes one embedding record and returns its assigned id.
    /// The write is single-record-atomic: a record is either fully
    /// persisted or not at all.
    fn append(
        &self,
        person_name: &str,
        vector: &[f32],
        image_path: &str,
        confidence: f32,
    ) -> StoreResult<u64>;

    /// Marks a source image as processed. Returns true if newly marked,
    /// false if it was already present. Never errors on duplicates.
    fn mark_processed(&self, image_path: &str) -> StoreResult<bool>;

    /// O(1) membership check against the in-memory mirror of the
    /// processed set.
    fn is_processed(&self, image_path: &str) -> bool;

    /// Number of processed source images.
    fn processed_count(&self) -> usize;

    /// Appends one entry to the training audit log. Callers treat failure
    /// here as non-fatal.
    fn log_action(&self, entry: &TrainingLogEntry) -> StoreResult<()>;

    /// Full scan of the training log, in append order. For audit tooling;
    /// the engine itself only writes.
    fn training_log(&self) -> StoreResult<Vec<TrainingLogEntry>>;
}

pub use memory::MemoryStore;
pub use redb::RedbStore;
