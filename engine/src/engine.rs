use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info, warn};

use facereg_store::{EmbeddingStore, TrainingLogEntry};

use crate::error::EngineError;
use crate::index::IdentityIndex;
use crate::matcher::best_match;
use crate::model::{Detection, FaceModel};
use crate::resolver::{MatchDecision, NameDecision, Resolver};
use crate::types::{FaceMatch, FaceOutcome, MatchResult, RegistryStats, TrainingAction};

/// Ingestion thresholds.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Floor below which a match is not trusted at all.
    pub similarity_threshold: f32,

    /// Ceiling above which a match is accepted without confirmation.
    /// Must be strictly greater than `similarity_threshold`.
    pub confidence_threshold: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.6,
            confidence_threshold: 0.8,
        }
    }
}

/// The incremental recognition engine: identity index, matcher, and the
/// three-way ingestion policy over a durable embedding store.
///
/// Single-writer by construction: the index lock spans the whole
/// {best-match, store append, index add} sequence for one face, so two
/// near-duplicate faces in the same batch cannot both register as distinct
/// new identities. Read-only surfaces take the same lock briefly for a
/// consistent snapshot.
pub struct RecognitionEngine {
    cfg: EngineConfig,
    store: Arc<dyn EmbeddingStore>,
    model: Box<dyn FaceModel>,
    index: Mutex<IdentityIndex>,
}

impl std::fmt::Debug for RecognitionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognitionEngine")
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

impl RecognitionEngine {
    /// Validates the thresholds and hydrates the identity index from the
    /// store. Fails with [`EngineError::InvalidConfig`] unless
    /// `confidence_threshold > similarity_threshold`.
    pub fn open(
        cfg: EngineConfig,
        store: Arc<dyn EmbeddingStore>,
        model: Box<dyn FaceModel>,
    ) -> Result<Self, EngineError> {
        if cfg.confidence_threshold <= cfg.similarity_threshold {
            return Err(EngineError::InvalidConfig {
                similarity: cfg.similarity_threshold,
                confidence: cfg.confidence_threshold,
            });
        }

        let mut index = IdentityIndex::new();
        for record in store.load_all()? {
            index.add(&record.person_name, record.vector);
        }
        info!(
            identities = index.identity_count(),
            embeddings = index.vector_count(),
            "face registry hydrated"
        );

        Ok(Self {
            cfg,
            store,
            model,
            index: Mutex::new(index),
        })
    }

    pub fn config(&self) -> EngineConfig {
        self.cfg
    }

    /// Whether a source image has already been ingested.
    pub fn is_processed(&self, image_path: &str) -> bool {
        self.store.is_processed(image_path)
    }

    /// Ingests one source image: detection, then the three-way decision
    /// per face. Already-processed paths return an empty result without
    /// running detection.
    ///
    /// After every face has resolved — accepted or explicitly skipped —
    /// the image is marked processed exactly once. That includes images
    /// where every face was skipped, so skipped images are not retried
    /// forever. If any face fails (store write, resolver error), the
    /// remaining faces are still processed but the image stays unmarked
    /// and the first error is returned, so a later run retries it.
    pub fn process_image(
        &self,
        image_path: &str,
        image: &[u8],
        resolver: &dyn Resolver,
    ) -> Result<Vec<FaceOutcome>, EngineError> {
        if self.store.is_processed(image_path) {
            debug!(path = image_path, "already processed, skipping");
            return Ok(Vec::new());
        }
        let detections = self.detect(image);
        self.ingest(image_path, &detections, resolver)
    }

    /// Same ingestion machine for callers that already ran detection
    /// (e.g. a serving layer holding model output).
    pub fn process_detections(
        &self,
        image_path: &str,
        detections: &[Detection],
        resolver: &dyn Resolver,
    ) -> Result<Vec<FaceOutcome>, EngineError> {
        if self.store.is_processed(image_path) {
            debug!(path = image_path, "already processed, skipping");
            return Ok(Vec::new());
        }
        self.ingest(image_path, detections, resolver)
    }

    /// Read-only best-match lookup for one embedding. Scores at or below
    /// the similarity threshold come back as "unknown" with similarity
    /// 0.0.
    pub fn match_embedding(&self, probe: &[f32]) -> MatchResult {
        let index = self.index.lock().unwrap();
        let (candidate, similarity) = best_match(probe, &index);
        match candidate {
            Some(name) if similarity > self.cfg.similarity_threshold => MatchResult {
                person_name: name.to_string(),
                similarity,
            },
            _ => MatchResult {
                person_name: "unknown".to_string(),
                similarity: 0.0,
            },
        }
    }

    /// Detection plus read-only matching over a whole image. Mutates
    /// nothing and does not touch the processed ledger.
    pub fn identify(&self, image: &[u8]) -> Vec<FaceMatch> {
        self.detect(image)
            .iter()
            .map(|det| {
                let m = self.match_embedding(&det.embedding);
                FaceMatch {
                    person_name: m.person_name,
                    similarity: m.similarity,
                    bounding_box: det.bounding_box,
                    detection_score: det.detection_score,
                }
            })
            .collect()
    }

    /// Registry counters.
    pub fn stats(&self) -> RegistryStats {
        let index = self.index.lock().unwrap();
        RegistryStats {
            total_embeddings: index.vector_count(),
            unique_people: index.identity_count(),
            processed_images: self.store.processed_count(),
            per_person: index
                .iter()
                .map(|(name, vectors)| (name.to_string(), vectors.len()))
                .collect(),
        }
    }

    fn detect(&self, image: &[u8]) -> Vec<Detection> {
        match self.model.detect(image) {
            Ok(detections) => detections,
            Err(e) => {
                // Fail closed: a model error counts as zero faces found.
                warn!(error = %e, "detection failed, treating as zero faces");
                Vec::new()
            }
        }
    }

    fn ingest(
        &self,
        image_path: &str,
        detections: &[Detection],
        resolver: &dyn Resolver,
    ) -> Result<Vec<FaceOutcome>, EngineError> {
        let mut outcomes = Vec::new();
        let mut first_error = None;

        for detection in detections {
            match self.ingest_face(image_path, detection, resolver) {
                Ok(Some(outcome)) => outcomes.push(outcome),
                Ok(None) => {}
                Err(e) => {
                    warn!(path = image_path, error = %e, "face ingestion failed");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if let Some(e) = first_error {
            // Leave the image unmarked so a later run retries it.
            return Err(e);
        }
        self.store.mark_processed(image_path)?;
        Ok(outcomes)
    }

    fn ingest_face(
        &self,
        image_path: &str,
        detection: &Detection,
        resolver: &dyn Resolver,
    ) -> Result<Option<FaceOutcome>, EngineError> {
        let mut index = self.index.lock().unwrap();

        if index.is_empty() {
            return self.register_new(&mut index, image_path, detection, 0.0, resolver);
        }

        let (candidate, score) = {
            let (name, score) = best_match(&detection.embedding, &index);
            (name.map(str::to_string), score)
        };
        let Some(candidate) = candidate else {
            return self.register_new(&mut index, image_path, detection, score, resolver);
        };

        if score > self.cfg.confidence_threshold {
            debug!(path = image_path, person = %candidate, score, "auto-confirmed");
            return self
                .accept(
                    &mut index,
                    image_path,
                    detection,
                    &candidate,
                    score,
                    score,
                    TrainingAction::AutoConfirmed,
                )
                .map(Some);
        }

        // Equality at the floor still offers the match for confirmation;
        // only scores strictly below it treat the face as a stranger.
        if score >= self.cfg.similarity_threshold {
            return match resolver.confirm_match(&candidate, score)? {
                MatchDecision::Accept => self
                    .accept(
                        &mut index,
                        image_path,
                        detection,
                        &candidate,
                        score,
                        score,
                        TrainingAction::Confirmed,
                    )
                    .map(Some),
                MatchDecision::Reject(name) => {
                    let name = normalize_name(&name);
                    self.accept(
                        &mut index,
                        image_path,
                        detection,
                        &name,
                        score,
                        1.0,
                        TrainingAction::Corrected,
                    )
                    .map(Some)
                }
                MatchDecision::Skip => {
                    debug!(path = image_path, person = %candidate, score, "face skipped by resolver");
                    Ok(None)
                }
            };
        }

        self.register_new(&mut index, image_path, detection, score, resolver)
    }

    fn register_new(
        &self,
        index: &mut IdentityIndex,
        image_path: &str,
        detection: &Detection,
        score: f32,
        resolver: &dyn Resolver,
    ) -> Result<Option<FaceOutcome>, EngineError> {
        let name = match resolver.name_new_face()? {
            NameDecision::Name(name) => normalize_name(&name),
            NameDecision::Skip => {
                debug!(path = image_path, "unmatched face skipped by resolver");
                return Ok(None);
            }
        };
        debug!(path = image_path, person = %name, "registering new identity");
        self.accept(
            index,
            image_path,
            detection,
            &name,
            score,
            1.0,
            TrainingAction::NewPerson,
        )
        .map(Some)
    }

    // Store append strictly precedes the index mutation: on a failed
    // append the cache is left untouched and still mirrors the store.
    fn accept(
        &self,
        index: &mut IdentityIndex,
        image_path: &str,
        detection: &Detection,
        person: &str,
        similarity: f32,
        confidence: f32,
        action: TrainingAction,
    ) -> Result<FaceOutcome, EngineError> {
        self.store
            .append(person, &detection.embedding, image_path, confidence)?;
        index.add(person, detection.embedding.clone());
        self.log_action(image_path, person, action, confidence);
        Ok(FaceOutcome {
            person_name: person.to_string(),
            bounding_box: detection.bounding_box,
            similarity,
            action,
        })
    }

    // Audit log failures are reported, never fatal.
    fn log_action(&self, image_path: &str, person: &str, action: TrainingAction, confidence: f32) {
        let entry = TrainingLogEntry {
            image_path: image_path.to_string(),
            person_name: person.to_string(),
            action: action.as_str().to_string(),
            timestamp: Utc::now().timestamp_millis(),
            confidence,
        };
        if let Err(e) = self.store.log_action(&entry) {
            warn!(error = %e, "training log append failed");
        }
    }
}

/// Trims the supplied name; an empty result becomes a timestamp
/// placeholder matching the dataset convention for unnamed identities.
fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        format!("unknown_{}", Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        trimmed.to_string()
    }
}
