//! Binary record encoding for the redb-backed store.
//!
//! Embedding record layout (all multi-byte values little-endian):
//!
//! ```text
//! [1B version=1]
//! [4B name_len] [name_len bytes person name, UTF-8]
//! [4B path_len] [path_len bytes image path, UTF-8]
//! [8B created_at i64]
//! [4B confidence f32]
//! [4B dim] [dim x 4B f32 embedding]
//! ```
//!
//! The embedding payload is the raw little-endian float32 array with no
//! per-element framing, so stored vectors round-trip bit-exact.
//!
//! Training log entry layout:
//!
//! ```text
//! [1B version=1]
//! [4B path_len] [path] [4B name_len] [name] [4B action_len] [action]
//! [8B timestamp i64] [4B confidence f32]
//! ```

use crate::{EmbeddingRecord, StoreError, TrainingLogEntry};

const RECORD_VERSION: u8 = 1;

pub(crate) fn encode_record(
    person_name: &str,
    vector: &[f32],
    image_path: &str,
    created_at: i64,
    confidence: f32,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(
        1 + 8 + person_name.len() + image_path.len() + 8 + 4 + 4 + vector.len() * 4,
    );
    buf.push(RECORD_VERSION);
    put_str(&mut buf, person_name);
    put_str(&mut buf, image_path);
    buf.extend_from_slice(&created_at.to_le_bytes());
    buf.extend_from_slice(&confidence.to_le_bytes());
    buf.extend_from_slice(&(vector.len() as u32).to_le_bytes());
    for &v in vector {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

pub(crate) fn decode_record(id: u64, data: &[u8]) -> Result<EmbeddingRecord, StoreError> {
    let mut r = Reader::new(data);
    r.version()?;
    let person_name = r.str()?;
    let image_path = r.str()?;
    let created_at = r.i64()?;
    let confidence = r.f32()?;
    let dim = r.u32()? as usize;
    if dim.saturating_mul(4) > r.remaining() {
        return Err(StoreError::Corrupt(format!(
            "vector length {dim} exceeds record payload"
        )));
    }
    let mut vector = Vec::with_capacity(dim);
    for _ in 0..dim {
        vector.push(r.f32()?);
    }
    Ok(EmbeddingRecord {
        id,
        person_name,
        vector,
        image_path,
        created_at,
        confidence,
    })
}

pub(crate) fn encode_log(entry: &TrainingLogEntry) -> Vec<u8> {
    let mut buf = Vec::with_capacity(
        1 + 12
            + entry.image_path.len()
            + entry.person_name.len()
            + entry.action.len()
            + 12,
    );
    buf.push(RECORD_VERSION);
    put_str(&mut buf, &entry.image_path);
    put_str(&mut buf, &entry.person_name);
    put_str(&mut buf, &entry.action);
    buf.extend_from_slice(&entry.timestamp.to_le_bytes());
    buf.extend_from_slice(&entry.confidence.to_le_bytes());
    buf
}

pub(crate) fn decode_log(data: &[u8]) -> Result<TrainingLogEntry, StoreError> {
    let mut r = Reader::new(data);
    r.version()?;
    let image_path = r.str()?;
    let person_name = r.str()?;
    let action = r.str()?;
    let timestamp = r.i64()?;
    let confidence = r.f32()?;
    Ok(TrainingLogEntry {
        image_path,
        person_name,
        action,
        timestamp,
        confidence,
    })
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

/// Cursor over an encoded record. Every read is bounds-checked so a
/// truncated or garbage value decodes to [`StoreError::Corrupt`], never a
/// panic.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], StoreError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                StoreError::Corrupt(format!(
                    "truncated at byte {} (want {n} more of {})",
                    self.pos,
                    self.data.len()
                ))
            })?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn version(&mut self) -> Result<(), StoreError> {
        let v = self.take(1)?[0];
        if v != RECORD_VERSION {
            return Err(StoreError::Corrupt(format!(
                "unsupported record version {v} (want {RECORD_VERSION})"
            )));
        }
        Ok(())
    }

    fn u32(&mut self) -> Result<u32, StoreError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i64(&mut self) -> Result<i64, StoreError> {
        let b = self.take(8)?;
        Ok(i64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn f32(&mut self) -> Result<f32, StoreError> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn str(&mut self) -> Result<String, StoreError> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| StoreError::Corrupt(format!("invalid utf-8: {e}")))
    }
}
