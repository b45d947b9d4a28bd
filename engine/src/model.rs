use thiserror::Error;

/// Errors returned by face detection models.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model error: {0}")]
    Model(String),

    #[error("unreadable image: {0}")]
    BadImage(String),
}

/// A single detected face within an image.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Pixel box as (x1, y1, x2, y2).
    pub bounding_box: [i32; 4],

    /// Dense identity embedding, length [`FaceModel::dimension`].
    pub embedding: Vec<f32>,

    /// Detector's own confidence that this region is a face.
    pub detection_score: f32,
}

/// Detects faces and extracts identity embeddings from encoded image bytes.
///
/// An empty result means no faces were found; that is not an error. The
/// engine treats a returned error the same way (zero faces, logged), so
/// implementations should fail closed on corrupt or unreadable input
/// rather than panic.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use.
pub trait FaceModel: Send + Sync {
    /// Runs detection over one image.
    fn detect(&self, image: &[u8]) -> Result<Vec<Detection>, ModelError>;

    /// Returns the dimensionality of the embedding vectors (e.g. 512 for
    /// ArcFace-class models).
    fn dimension(&self) -> usize;
}
