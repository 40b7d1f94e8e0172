//! Core retrieval types: configuration, errors and records.

pub mod config;
pub mod errors;
pub mod record;

pub use config::{
    CorpusConfig, EmbeddingConfig, LlmConfig, RetrievalConfig, ServerConfig, ServiceConfig,
};
pub use errors::{RetrievalError, RetrievalResult, StartupError, StartupResult};
pub use record::Record;
