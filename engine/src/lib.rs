//! Incremental face identity registry.
//!
//! # Architecture
//!
//! The pipeline processes an image in three stages:
//!
//! 1. [`FaceModel::detect`]: encoded image bytes -> face regions + embeddings
//! 2. [`matcher::best_match`]: probe embedding vs every known identity
//! 3. [`RecognitionEngine::process_image`]: three-way decision per face
//!    (auto-confirm / ask the [`Resolver`] / register new), persisted
//!    through `facereg-store`
//!
//! The registry is strictly additive: records are never updated or deleted,
//! and a source image is ingested at most once. The in-memory
//! [`IdentityIndex`] is a cache of the store, hydrated once at startup;
//! every accepted decision writes the store first and mutates the cache
//! second, so the two cannot diverge.
//!
//! # Decision Policy
//!
//! Two thresholds drive ingestion, with `confidence > similarity` enforced
//! at construction:
//!
//! ```text
//! score >  confidence  -> auto-confirm, no human input
//! score in [similarity, confidence] -> ask the resolver
//! score <  similarity  -> register a new identity
//! ```

mod engine;
mod error;
mod index;
pub mod matcher;
mod model;
mod resolver;
mod types;

pub use engine::{EngineConfig, RecognitionEngine};
pub use error::EngineError;
pub use index::IdentityIndex;
pub use matcher::{best_match, cosine_similarity};
pub use model::{Detection, FaceModel, ModelError};
pub use resolver::{AutoSkipResolver, MatchDecision, NameDecision, Resolver};
pub use types::{FaceMatch, FaceOutcome, MatchResult, RegistryStats, TrainingAction};
