//! Error types for answer generation.

use thiserror::Error;

use crate::retrieval::RetrievalError;

/// Errors from the hosted LLM.
#[derive(Debug, Error)]
pub enum AnswerError {
    /// HTTP client error from Rig.
    #[error("http client error: {0}")]
    HttpClient(#[from] rig::http_client::Error),
    /// Completion error.
    #[error("completion error: {0}")]
    Completion(#[from] rig::completion::CompletionError),
    /// The model replied without any text content.
    #[error("completion returned no text")]
    EmptyResponse,
}

/// Failure of a full query: retrieval or answer generation.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Retrieval failed.
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),
    /// The LLM call failed.
    #[error("answer generation failed: {0}")]
    Answer(#[from] AnswerError),
}

/// Convenience result alias for answer generation.
pub type AnswerResult<T> = Result<T, AnswerError>;
