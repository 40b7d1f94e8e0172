//! Corpus storage: positionally aligned records and vector index.

pub mod record_store;
pub mod vector_index;

pub use record_store::{RecordStore, discover_corpus_files, load_embeddings, read_corpus};
pub use vector_index::{Neighbor, VectorIndex};
