//! Linear-scan cosine matching over the identity index.
//!
//! The scan is O(total stored vectors x dimension) per probe, which is
//! acceptable for registries up to tens of thousands of embeddings. The
//! function seam here is what an approximate index would replace if that
//! scale is ever exceeded; the ingestion policy never needs to change.

use crate::index::IdentityIndex;

/// Cosine similarity between two vectors.
///
/// Uses f64 intermediate precision and clamps to `[-1, 1]` to absorb
/// floating point error. Returns 0.0 for zero vectors or a dimension
/// mismatch.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot: f64 = 0.0;
    let mut norm_a: f64 = 0.0;
    let mut norm_b: f64 = 0.0;

    for i in 0..a.len() {
        let ai = a[i] as f64;
        let bi = b[i] as f64;
        dot += ai * bi;
        norm_a += ai * ai;
        norm_b += bi * bi;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    similarity.clamp(-1.0, 1.0) as f32
}

/// Returns the best (identity, similarity) pair for a probe embedding by
/// scanning every vector of every identity.
///
/// The running maximum updates on strict `>`, so ties keep the
/// earliest-seen identity. Returns `(None, 0.0)` when the index is empty
/// (or nothing scores above zero).
pub fn best_match<'a>(probe: &[f32], index: &'a IdentityIndex) -> (Option<&'a str>, f32) {
    let mut best: Option<&str> = None;
    let mut best_similarity = 0.0f32;

    for (name, vectors) in index.iter() {
        for vector in vectors {
            let similarity = cosine_similarity(probe, vector);
            if similarity > best_similarity {
                best_similarity = similarity;
                best = Some(name);
            }
        }
    }

    (best, best_similarity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical() {
        let s = cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]);
        assert!((s - 1.0).abs() < 1e-6, "identical: got {s}");
    }

    #[test]
    fn cosine_orthogonal() {
        let s = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(s.abs() < 1e-6, "orthogonal: got {s}");
    }

    #[test]
    fn cosine_opposite() {
        let s = cosine_similarity(&[1.0, 0.0, 0.0], &[-1.0, 0.0, 0.0]);
        assert!((s + 1.0).abs() < 1e-6, "opposite: got {s}");
    }

    #[test]
    fn cosine_zero_vector_and_mismatch() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn best_match_empty_index() {
        let idx = IdentityIndex::new();
        let (name, similarity) = best_match(&[1.0, 0.0], &idx);
        assert!(name.is_none());
        assert_eq!(similarity, 0.0);
    }

    #[test]
    fn best_match_picks_closest_identity() {
        let mut idx = IdentityIndex::new();
        idx.add("alice", vec![1.0, 0.0, 0.0]);
        idx.add("bob", vec![0.0, 1.0, 0.0]);

        let (name, similarity) = best_match(&[0.9, 0.1, 0.0], &idx);
        assert_eq!(name, Some("alice"));
        assert!(similarity > 0.9);
    }

    #[test]
    fn best_match_tie_keeps_earliest_identity() {
        let mut idx = IdentityIndex::new();
        // Identical vectors under two names: both score exactly 1.0.
        idx.add("first", vec![1.0, 0.0]);
        idx.add("second", vec![1.0, 0.0]);

        let (name, _) = best_match(&[1.0, 0.0], &idx);
        assert_eq!(name, Some("first"));
    }

    #[test]
    fn best_match_is_monotone_in_index_growth() {
        let mut idx = IdentityIndex::new();
        let probe = [0.6f32, 0.8, 0.0];

        let mut last = best_match(&probe, &idx).1;
        for v in [
            vec![0.0, 0.0, 1.0],
            vec![1.0, 0.0, 0.0],
            vec![0.6, 0.8, 0.0],
            vec![0.0, 1.0, 0.0],
        ] {
            idx.add("p", v);
            let now = best_match(&probe, &idx).1;
            assert!(now >= last, "similarity dropped from {last} to {now}");
            last = now;
        }
        assert!((last - 1.0).abs() < 1e-6);
    }
}
