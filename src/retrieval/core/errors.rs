//! Error types for startup and retrieval.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::answer::errors::AnswerError;
use crate::retrieval::embedding::EmbedderError;

/// Fatal errors raised while acquiring the service's artifacts.
///
/// Any of these aborts startup; the service never serves in a degraded mode.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The embedding model could not be loaded.
    #[error("embedding model unavailable: {0}")]
    Embedder(#[from] EmbedderError),
    /// The serialized vector index is missing, corrupt or incompatible.
    #[error("vector index {path}: {message}")]
    Index {
        /// Path of the index artifact.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },
    /// The precomputed embedding artifact is missing or malformed.
    #[error("embedding artifact {path}: {message}")]
    Embeddings {
        /// Path of the `.npy` artifact.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },
    /// A corpus file held a value that cannot be interpreted.
    #[error("corpus error: {0}")]
    Corpus(String),
    /// CSV decoding error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// Corpus directory traversal error.
    #[error("corpus walk error: {0}")]
    Walk(#[from] walkdir::Error),
    /// Corpus, embeddings, index and model disagree on shape or order.
    #[error("misaligned artifacts: {0}")]
    Misaligned(String),
    /// The LLM client could not be constructed.
    #[error("answer model unavailable: {0}")]
    Answer(#[from] AnswerError),
    /// Response formatting patterns failed to compile.
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-request retrieval failures. Never partially successful.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// `k` must be at least one.
    #[error("k must be > 0, got {0}")]
    InvalidK(usize),
    /// No vectors are indexed, so no neighbor can exist.
    #[error("corpus is empty")]
    EmptyCorpus,
    /// Encoding the query failed.
    #[error("query encoding failed: {0}")]
    Embedding(#[from] EmbedderError),
    /// The query vector does not match the index dimension.
    #[error("query dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Index dimension.
        expected: usize,
        /// Query vector dimension.
        actual: usize,
    },
    /// The ANN index rejected the query or returned an invalid position.
    #[error("index search failed: {0}")]
    Search(String),
    /// Encode plus search did not finish in time.
    #[error("retrieval timed out after {0:?}")]
    Timeout(Duration),
    /// The blocking worker running the retrieval died.
    #[error("retrieval worker failed: {0}")]
    Worker(String),
}

/// Convenience result alias for startup operations.
pub type StartupResult<T> = Result<T, StartupError>;

/// Convenience result alias for retrieval operations.
pub type RetrievalResult<T> = Result<T, RetrievalError>;
