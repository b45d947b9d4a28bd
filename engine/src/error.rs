use thiserror::Error;

use facereg_store::StoreError;

/// Errors returned by recognition engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(
        "invalid thresholds: confidence {confidence} must be strictly greater than similarity {similarity}"
    )]
    InvalidConfig { similarity: f32, confidence: f32 },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("resolver failed: {0}")]
    Resolver(String),
}
