use std::collections::HashMap;

/// In-memory mapping of identity name to its embedding vectors.
///
/// Iteration order is deterministic: identities in first-seen order,
/// vectors within an identity in insertion order. Determinism matters for
/// reproducible matching — ties during search keep the earliest-seen
/// identity.
///
/// The index is a cache of the durable store, not a second source of
/// truth. [`IdentityIndex::add`] is the only mutator and must be called
/// exactly once per accepted store append.
#[derive(Debug, Default)]
pub struct IdentityIndex {
    buckets: Vec<Bucket>,
    by_name: HashMap<String, usize>,
}

#[derive(Debug)]
struct Bucket {
    name: String,
    vectors: Vec<Vec<f32>>,
}

impl IdentityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a vector to the named identity, creating the bucket on
    /// first use.
    pub fn add(&mut self, name: &str, vector: Vec<f32>) {
        match self.by_name.get(name) {
            Some(&i) => self.buckets[i].vectors.push(vector),
            None => {
                self.by_name.insert(name.to_string(), self.buckets.len());
                self.buckets.push(Bucket {
                    name: name.to_string(),
                    vectors: vec![vector],
                });
            }
        }
    }

    /// All identity names, in first-seen order.
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|b| b.name.as_str())
    }

    /// Vectors stored for one identity, in insertion order.
    pub fn vectors_for(&self, name: &str) -> Option<&[Vec<f32>]> {
        self.by_name
            .get(name)
            .map(|&i| self.buckets[i].vectors.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// (name, vectors) pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Vec<f32>])> {
        self.buckets
            .iter()
            .map(|b| (b.name.as_str(), b.vectors.as_slice()))
    }

    pub fn identity_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total vectors across all identities.
    pub fn vector_count(&self) -> usize {
        self.buckets.iter().map(|b| b.vectors.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
