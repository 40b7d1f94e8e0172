//! Deterministic fixtures for retrieval tests.

use std::collections::HashMap;
use std::sync::Arc;

use crate::retrieval::core::record::Record;
use crate::retrieval::embedding::{Embedder, EmbedderResult, normalize_in_place};
use crate::retrieval::engine::Retriever;
use crate::retrieval::normalize::normalize;
use crate::retrieval::storage::{RecordStore, VectorIndex};

/// Bag-of-words embedder over a fixed vocabulary.
///
/// Slot `i` counts vocabulary word `i`; the last slot counts unknown words.
/// Vectors are scaled to unit length like the real encoder's.
pub struct VocabEmbedder {
    vocabulary: HashMap<String, usize>,
}

impl VocabEmbedder {
    /// Build the vocabulary from every word of the normalized `texts`.
    pub fn for_texts(texts: &[String]) -> Self {
        let mut vocabulary = HashMap::new();
        for text in texts {
            for word in normalize(text).split_whitespace() {
                let next = vocabulary.len();
                vocabulary.entry(word.to_string()).or_insert(next);
            }
        }
        Self { vocabulary }
    }
}

impl Embedder for VocabEmbedder {
    fn embed(&self, text: &str) -> EmbedderResult<Vec<f32>> {
        let unknown = self.vocabulary.len();
        let mut vector = vec![0.0_f32; self.dimension()];
        for word in text.split_whitespace() {
            let slot = self.vocabulary.get(word).copied().unwrap_or(unknown);
            vector[slot] += 1.0;
        }
        normalize_in_place(&mut vector);
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.vocabulary.len() + 1
    }

    fn model_id(&self) -> &str {
        "vocab-test"
    }
}

/// Three short, mutually dissimilar passages; record 0 is about kindness.
pub fn kindness_corpus() -> Vec<String> {
    vec![
        "The Prophet said kindness is a virtue".to_string(),
        "Prayer at dawn brings light to the heart".to_string(),
        "Charity does not decrease wealth".to_string(),
    ]
}

/// Records for `texts` carrying the matching `vectors`.
pub fn store_for(texts: &[String], vectors: &[Vec<f32>]) -> RecordStore {
    let dimension = vectors.first().map_or(1, Vec::len);
    let records = texts
        .iter()
        .zip(vectors)
        .enumerate()
        .map(|(i, (text, vector))| Record {
            chapter_number: "1".to_string(),
            sequence_number: Some(i64::try_from(i + 1).unwrap()),
            primary_text: text.clone(),
            source_text: "نص".to_string(),
            attribution: format!("Narrator {i}"),
            body: text.clone(),
            reliability_grade: "Sahih".to_string(),
            embedding: vector.clone(),
        })
        .collect();
    RecordStore::from_records(records, dimension).unwrap()
}

/// A retriever over `texts` using the vocabulary embedder and an in-memory index.
pub fn fixture_retriever(texts: &[String]) -> Retriever {
    let embedder = Arc::new(VocabEmbedder::for_texts(texts));
    let vectors: Vec<Vec<f32>> = texts
        .iter()
        .map(|text| embedder.embed(&normalize(text)).unwrap())
        .collect();
    let index = VectorIndex::from_vectors(&vectors, embedder.dimension()).unwrap();
    let store = if vectors.is_empty() {
        RecordStore::from_records(Vec::new(), embedder.dimension()).unwrap()
    } else {
        store_for(texts, &vectors)
    };
    Retriever::new(embedder, index, store).unwrap()
}
