//! Embedding model modules.

pub mod embedder;
pub mod fastembed_embedder;

pub use embedder::{Embedder, EmbedderError, EmbedderResult, normalize_in_place};
pub use fastembed_embedder::{FastEmbedder, REQUIRED_MODEL_FILES};
