use std::fmt;

use serde::{Deserialize, Serialize};

/// Ingestion decision, as recorded in the training audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrainingAction {
    /// A previously unseen identity was registered.
    NewPerson,
    /// Similarity exceeded the confidence threshold; no human input.
    AutoConfirmed,
    /// The resolver accepted the proposed candidate.
    Confirmed,
    /// The resolver rejected the candidate and supplied the correct name.
    Corrected,
}

impl TrainingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewPerson => "NEW_PERSON",
            Self::AutoConfirmed => "AUTO_CONFIRMED",
            Self::Confirmed => "CONFIRMED",
            Self::Corrected => "CORRECTED",
        }
    }
}

impl fmt::Display for TrainingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of ingesting one detected face.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceOutcome {
    pub person_name: String,

    /// Pixel box as (x1, y1, x2, y2).
    pub bounding_box: [i32; 4],

    /// Best-match similarity at decision time. 0.0 when the registry was
    /// empty.
    pub similarity: f32,

    pub action: TrainingAction,
}

/// Read-only match result for the query surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    /// Best identity, or "unknown" when the score stays at or below the
    /// similarity threshold.
    pub person_name: String,

    /// Match similarity; 0.0 for "unknown".
    pub similarity: f32,
}

/// Per-face result of read-only identification over a whole image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceMatch {
    pub person_name: String,
    pub similarity: f32,
    pub bounding_box: [i32; 4],
    pub detection_score: f32,
}

/// Registry counters for the stats surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_embeddings: usize,
    pub unique_people: usize,
    pub processed_images: usize,

    /// (identity, sample count) in first-seen order.
    pub per_person: Vec<(String, usize)>,
}
