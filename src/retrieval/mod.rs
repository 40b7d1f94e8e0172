//! Retrieval subsystem for the hadith corpus.
//!
//! Organized into:
//! - `core`: Configuration, errors and the corpus record type
//! - `normalize`: Text cleaning shared by corpus and queries
//! - `embedding`: Embedder abstraction and the FastEmbed sentence encoder
//! - `storage`: Record store and usearch vector index, positionally aligned
//! - `engine`: The `Retriever` composing all of the above

pub mod core;
pub mod embedding;
pub mod engine;
pub mod normalize;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;

pub use self::core::{
    CorpusConfig, EmbeddingConfig, LlmConfig, Record, RetrievalConfig, RetrievalError,
    RetrievalResult, ServerConfig, ServiceConfig, StartupError, StartupResult,
};
pub use embedding::{Embedder, EmbedderError, EmbedderResult, FastEmbedder};
pub use engine::{QueryResult, Retriever};
pub use normalize::{normalize, normalize_field};
pub use storage::{Neighbor, RecordStore, VectorIndex};
