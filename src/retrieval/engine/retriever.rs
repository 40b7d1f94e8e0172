//! Retrieval orchestration: normalize, embed, search, map to records.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::retrieval::core::config::ServiceConfig;
use crate::retrieval::core::errors::{
    RetrievalError, RetrievalResult, StartupError, StartupResult,
};
use crate::retrieval::core::record::Record;
use crate::retrieval::embedding::{Embedder, FastEmbedder};
use crate::retrieval::normalize::normalize;
use crate::retrieval::storage::{RecordStore, VectorIndex};

/// Tolerance on the L2 norm of stored vectors before they are rejected as unnormalized.
const UNIT_NORM_TOLERANCE: f32 = 1e-2;

/// One retrieved record with its distance to the query.
#[derive(Clone, Debug)]
pub struct QueryResult {
    /// Zero-based rank, nearest first.
    pub rank: usize,
    /// Squared L2 distance between query and record embeddings.
    pub distance: f32,
    /// The matching corpus record.
    pub record: Arc<Record>,
}

/// Immutable retrieval context built once at startup.
///
/// Holds the encoder, the vector index and the aligned record store. All
/// state is read-only, so one instance is shared by every request worker.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: VectorIndex,
    store: RecordStore,
}

impl Retriever {
    /// Compose a retriever after checking that all parts line up.
    ///
    /// # Errors
    /// Returns `StartupError::Misaligned` if the encoder, index and store
    /// disagree on dimension or size, if any corpus position has no vector in
    /// the index, or if a corpus embedding is not unit length.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: VectorIndex,
        store: RecordStore,
    ) -> StartupResult<Self> {
        if embedder.dimension() != index.dimension() {
            return Err(StartupError::Misaligned(format!(
                "encoder {} produces {}-wide vectors but the index holds {}-wide vectors",
                embedder.model_id(),
                embedder.dimension(),
                index.dimension()
            )));
        }

        if !store.is_empty() && store.dimension() != index.dimension() {
            return Err(StartupError::Misaligned(format!(
                "corpus embeddings are {}-wide but the index holds {}-wide vectors",
                store.dimension(),
                index.dimension()
            )));
        }

        if store.len() != index.len() {
            return Err(StartupError::Misaligned(format!(
                "corpus has {} records but the index holds {} vectors",
                store.len(),
                index.len()
            )));
        }

        if let Some(position) = (0..store.len()).find(|position| !index.contains(*position)) {
            return Err(StartupError::Misaligned(format!(
                "index has no vector for corpus position {position}"
            )));
        }

        // The encoder emits unit vectors; raw corpus vectors would live in another space.
        if let Some((position, norm)) = store
            .iter()
            .map(|record| l2_norm(&record.embedding))
            .enumerate()
            .find(|(_, norm)| (norm - 1.0).abs() > UNIT_NORM_TOLERANCE)
        {
            return Err(StartupError::Misaligned(format!(
                "corpus embedding {position} has L2 norm {norm}; the encoder produces unit vectors, \
                 so the embedding artifact must be built with normalization"
            )));
        }
        if store.is_empty() {
            warn!("corpus is empty; every retrieval will fail");
        }

        Ok(Self {
            embedder,
            index,
            store,
        })
    }

    /// Acquire the model, index, corpus and embeddings named by `config`.
    ///
    /// Either every artifact is acquired or none is kept: whatever loaded
    /// before a failure is dropped on return.
    ///
    /// # Errors
    /// Returns the first acquisition or alignment failure.
    pub fn from_config(config: &ServiceConfig) -> StartupResult<Self> {
        let embedder = FastEmbedder::load(
            &config.embedding.model_name,
            &config.embedding.model_dir,
            config.embedding.dimension,
        )?;
        Self::load_with_embedder(Arc::new(embedder), config)
    }

    /// Acquire the index and corpus artifacts and pair them with `embedder`.
    ///
    /// # Errors
    /// Returns the first acquisition or alignment failure.
    pub fn load_with_embedder(
        embedder: Arc<dyn Embedder>,
        config: &ServiceConfig,
    ) -> StartupResult<Self> {
        let index = VectorIndex::load(&config.corpus.index_path, config.embedding.dimension)?;
        let store = RecordStore::load(&config.corpus.data_dir, &config.corpus.embeddings_path)?;
        let retriever = Self::new(embedder, index, store)?;
        info!(
            records = retriever.corpus_size(),
            model = retriever.embedder.model_id(),
            "retriever ready"
        );
        Ok(retriever)
    }

    /// Return the `k` records nearest to `query`, nearest first.
    ///
    /// Yields `min(k, corpus size)` results.
    ///
    /// # Errors
    /// Returns an error for `k == 0`, an empty corpus, or any encode/search
    /// failure. No partial results are returned.
    pub fn retrieve(&self, query: &str, k: usize) -> RetrievalResult<Vec<QueryResult>> {
        if k == 0 {
            return Err(RetrievalError::InvalidK(k));
        }
        if self.store.is_empty() {
            return Err(RetrievalError::EmptyCorpus);
        }

        let cleaned = normalize(query);
        let vector = self.embedder.embed(&cleaned)?;
        let neighbors = self.index.search(&vector, k)?;

        let results = neighbors
            .into_iter()
            .enumerate()
            .map(|(rank, neighbor)| {
                self.store
                    .record_at(neighbor.position)
                    .map(|record| QueryResult {
                        rank,
                        distance: neighbor.distance,
                        record: Arc::clone(record),
                    })
                    .ok_or_else(|| {
                        RetrievalError::Search(format!(
                            "position {} is outside the corpus",
                            neighbor.position
                        ))
                    })
            })
            .collect::<RetrievalResult<Vec<_>>>()?;

        debug!(k, hits = results.len(), "retrieved records");
        Ok(results)
    }

    /// Run [`Retriever::retrieve`] on the blocking pool, bounded by `timeout`.
    ///
    /// The encoder can stall under resource pressure; callers stop waiting
    /// after `timeout` even though the worker runs to completion.
    ///
    /// # Errors
    /// Returns the retrieval error, `RetrievalError::Timeout`, or
    /// `RetrievalError::Worker` if the blocking task panicked.
    pub async fn retrieve_blocking(
        self: Arc<Self>,
        query: String,
        k: usize,
        timeout: Duration,
    ) -> RetrievalResult<Vec<QueryResult>> {
        let task = tokio::task::spawn_blocking(move || self.retrieve(&query, k));
        match tokio::time::timeout(timeout, task).await {
            Err(_) => Err(RetrievalError::Timeout(timeout)),
            Ok(Err(join_error)) => Err(RetrievalError::Worker(join_error.to_string())),
            Ok(Ok(result)) => result,
        }
    }

    /// Number of retrievable records.
    #[must_use]
    pub fn corpus_size(&self) -> usize {
        self.store.len()
    }

    /// Identifier of the loaded embedding model.
    #[must_use]
    pub fn model_id(&self) -> &str {
        self.embedder.model_id()
    }
}

fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use ndarray::Array2;

    use super::*;
    use crate::retrieval::embedding::EmbedderResult;
    use crate::retrieval::test_support::{
        VocabEmbedder, fixture_retriever, kindness_corpus, store_for,
    };

    /// Encodes every text as the same unit direction, optionally after a delay.
    struct FixedEmbedder {
        direction: Vec<f32>,
        delay: Duration,
    }

    impl FixedEmbedder {
        fn pointing(direction: [f32; 3]) -> Self {
            Self {
                direction: direction.to_vec(),
                delay: Duration::ZERO,
            }
        }
    }

    impl Embedder for FixedEmbedder {
        fn embed(&self, _text: &str) -> EmbedderResult<Vec<f32>> {
            std::thread::sleep(self.delay);
            let mut vector = self.direction.clone();
            crate::retrieval::embedding::normalize_in_place(&mut vector);
            Ok(vector)
        }

        fn dimension(&self) -> usize {
            3
        }

        fn model_id(&self) -> &str {
            "fixed-test"
        }
    }

    struct PanickingEmbedder;

    impl Embedder for PanickingEmbedder {
        fn embed(&self, _text: &str) -> EmbedderResult<Vec<f32>> {
            panic!("encoder crashed");
        }

        fn dimension(&self) -> usize {
            3
        }

        fn model_id(&self) -> &str {
            "panicking-test"
        }
    }

    fn axis_retriever(
        embedder: Arc<dyn Embedder>,
        vectors: &[Vec<f32>],
    ) -> StartupResult<Retriever> {
        let texts: Vec<String> = (0..vectors.len()).map(|i| format!("record {i}")).collect();
        let index = VectorIndex::from_vectors(vectors, 3).unwrap();
        Retriever::new(embedder, index, store_for(&texts, vectors))
    }

    #[test]
    fn test_end_to_end_kindness_query() {
        let retriever = fixture_retriever(&kindness_corpus());
        let results = retriever.retrieve("kindness virtue", 1).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].record.primary_text,
            "The Prophet said kindness is a virtue"
        );
        assert_eq!(results[0].rank, 0);
    }

    #[test]
    fn test_results_are_ordered_and_sized() {
        let retriever = fixture_retriever(&kindness_corpus());
        for k in 1..=5 {
            let results = retriever.retrieve("prayer brings kindness", k).unwrap();
            assert_eq!(results.len(), k.min(retriever.corpus_size()));
            assert!(
                results
                    .windows(2)
                    .all(|pair| pair[0].distance <= pair[1].distance)
            );
            assert!(results.iter().all(|r| r.distance >= 0.0));
            assert!(results.iter().enumerate().all(|(i, r)| r.rank == i));
        }
    }

    #[test]
    fn test_self_retrieval_ranks_first() {
        let corpus = kindness_corpus();
        let retriever = fixture_retriever(&corpus);
        for text in &corpus {
            let results = retriever.retrieve(text, 1).unwrap();
            assert_eq!(&results[0].record.primary_text, text);
            assert!(results[0].distance < 1e-4);
        }
    }

    #[test]
    fn test_zero_k_is_rejected() {
        let retriever = fixture_retriever(&kindness_corpus());
        assert!(matches!(
            retriever.retrieve("kindness", 0),
            Err(RetrievalError::InvalidK(0))
        ));
    }

    #[test]
    fn test_empty_corpus_fails_retrieval() {
        let retriever = fixture_retriever(&[]);
        assert_eq!(retriever.corpus_size(), 0);
        assert!(matches!(
            retriever.retrieve("kindness", 3),
            Err(RetrievalError::EmptyCorpus)
        ));
    }

    #[tokio::test]
    async fn test_retrieve_blocking_matches_sync_path() {
        let retriever = Arc::new(fixture_retriever(&kindness_corpus()));
        let results = Arc::clone(&retriever)
            .retrieve_blocking("kindness virtue".to_string(), 2, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].record.sequence_number, Some(1));

        let err = retriever
            .retrieve_blocking("kindness".to_string(), 0, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::InvalidK(0)));
    }

    #[test]
    fn test_rejects_unnormalized_corpus_embeddings() {
        let raw = vec![vec![4.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];
        let result = axis_retriever(Arc::new(FixedEmbedder::pointing([4.0, 0.0, 0.0])), &raw);
        assert!(matches!(result, Err(StartupError::Misaligned(_))));
    }

    #[test]
    fn test_unit_corpus_self_retrieval() {
        let unit = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];
        let retriever =
            axis_retriever(Arc::new(FixedEmbedder::pointing([4.0, 0.0, 0.0])), &unit).unwrap();
        let results = retriever.retrieve("record zero", 2).unwrap();
        assert_eq!(results[0].record.primary_text, "record 0");
        assert!(results[0].distance < 1e-4);
    }

    #[tokio::test]
    async fn test_retrieve_blocking_times_out() {
        let embedder = FixedEmbedder {
            direction: vec![1.0, 0.0, 0.0],
            delay: Duration::from_millis(300),
        };
        let unit = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];
        let retriever = Arc::new(axis_retriever(Arc::new(embedder), &unit).unwrap());

        let err = retriever
            .retrieve_blocking("slow".to_string(), 1, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Timeout(t) if t == Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_retrieve_blocking_reports_crashed_worker() {
        let unit = vec![vec![1.0, 0.0, 0.0]];
        let retriever = Arc::new(axis_retriever(Arc::new(PanickingEmbedder), &unit).unwrap());

        let err = retriever
            .retrieve_blocking("boom".to_string(), 1, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Worker(_)));
    }

    #[test]
    fn test_rejects_index_store_size_mismatch() {
        let corpus = kindness_corpus();
        let embedder = Arc::new(VocabEmbedder::for_texts(&corpus));
        let vectors: Vec<Vec<f32>> = corpus
            .iter()
            .map(|t| embedder.embed(&normalize(t)).unwrap())
            .collect();
        let index = VectorIndex::from_vectors(&vectors[..2], embedder.dimension()).unwrap();
        let store = store_for(&corpus, &vectors);

        assert!(matches!(
            Retriever::new(embedder, index, store),
            Err(StartupError::Misaligned(_))
        ));
    }

    #[test]
    fn test_rejects_encoder_dimension_mismatch() {
        let corpus = kindness_corpus();
        let embedder = Arc::new(VocabEmbedder::for_texts(&corpus));
        let index = VectorIndex::from_vectors(&[vec![0.0; 2]], 2).unwrap();
        let store = RecordStore::from_records(Vec::new(), 2).unwrap();

        assert!(matches!(
            Retriever::new(embedder, index, store),
            Err(StartupError::Misaligned(_))
        ));
    }

    #[test]
    fn test_load_with_embedder_from_artifacts() {
        let corpus = kindness_corpus();
        let embedder = Arc::new(VocabEmbedder::for_texts(&corpus));
        let dimension = embedder.dimension();
        let vectors: Vec<Vec<f32>> = corpus
            .iter()
            .map(|t| embedder.embed(&normalize(t)).unwrap())
            .collect();

        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        fs::create_dir_all(&data_dir).unwrap();
        let mut csv = String::from(
            "Chapter_Number,Hadith_number,English_Hadith,Arabic_Hadith,English_Isnad,English_Matn,English_Grade\n",
        );
        for (i, text) in corpus.iter().enumerate() {
            csv.push_str(&format!("1,{},{text},نص,Narrator {i},{text},Sahih\n", i + 1));
            // Rows the loader must skip without shifting alignment.
            csv.push_str("1,99,,نص,Nobody,,Daif\n");
        }
        fs::write(data_dir.join("corpus.csv"), csv).unwrap();

        let flat: Vec<f32> = vectors.iter().flatten().copied().collect();
        let matrix = Array2::from_shape_vec((vectors.len(), dimension), flat).unwrap();
        let embeddings_path = dir.path().join("embeddings.npy");
        ndarray_npy::write_npy(&embeddings_path, &matrix).unwrap();

        let index_path = dir.path().join("index.usearch");
        VectorIndex::from_vectors(&vectors, dimension)
            .unwrap()
            .save(&index_path)
            .unwrap();

        let mut config = ServiceConfig::default();
        config.embedding.dimension = dimension;
        config.corpus.data_dir = data_dir;
        config.corpus.embeddings_path = embeddings_path;
        config.corpus.index_path = index_path;

        let retriever = Retriever::load_with_embedder(embedder, &config).unwrap();
        assert_eq!(retriever.corpus_size(), 3);

        let results = retriever.retrieve("Kindness, virtue!", 1).unwrap();
        assert_eq!(results[0].record.sequence_number, Some(1));
        assert_eq!(results[0].record.attribution, "Narrator 0");
    }

    #[test]
    fn test_load_fails_when_index_missing() {
        let corpus = kindness_corpus();
        let embedder = Arc::new(VocabEmbedder::for_texts(&corpus));
        let dir = tempfile::tempdir().unwrap();

        let mut config = ServiceConfig::default();
        config.embedding.dimension = embedder.dimension();
        config.corpus.index_path = dir.path().join("missing.usearch");
        config.corpus.data_dir = dir.path().to_path_buf();

        assert!(matches!(
            Retriever::load_with_embedder(embedder, &config),
            Err(StartupError::Index { .. })
        ));
    }
}
