//! Embedder trait and error type.

use thiserror::Error;

/// Error type for embedder operations.
#[derive(Debug, Error)]
pub enum EmbedderError {
    /// The model artifacts are missing or could not be loaded.
    #[error("embedder unavailable: {0}")]
    Unavailable(String),
    /// Failed to embed the input text.
    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),
    /// Internal error in the embedder.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for embedder operations.
pub type EmbedderResult<T> = Result<T, EmbedderError>;

/// Trait abstraction over sentence embedding models.
///
/// Implementations are loaded once at startup and shared between request
/// workers, so they must be `Send + Sync`. Input is expected to be normalized
/// with [`crate::retrieval::normalize::normalize`] first.
pub trait Embedder: Send + Sync {
    /// Embed a single text into a vector of [`Embedder::dimension`] floats.
    ///
    /// # Errors
    /// Returns an error if inference fails or yields the wrong dimension.
    fn embed(&self, text: &str) -> EmbedderResult<Vec<f32>>;

    /// Output dimensionality, fixed at load time.
    fn dimension(&self) -> usize;

    /// Identifier of the loaded model.
    fn model_id(&self) -> &str;
}

/// Scale a vector to unit L2 norm in place; zero vectors are left untouched.
pub fn normalize_in_place(embedding: &mut [f32]) {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in embedding.iter_mut() {
            *v /= norm;
        }
    }
}
