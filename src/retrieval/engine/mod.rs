//! Retrieval orchestration.

pub mod retriever;

pub use retriever::{QueryResult, Retriever};
