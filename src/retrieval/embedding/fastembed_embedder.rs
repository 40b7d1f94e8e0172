//! FastEmbed-backed sentence encoder.
//!
//! Loads a local ONNX export of the sentence model plus its tokenizer bundle.
//! Nothing is downloaded at runtime; missing files are a startup failure.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fastembed::{
    InitOptionsUserDefined, Pooling, TextEmbedding, TokenizerFiles, UserDefinedEmbeddingModel,
};
use tracing::info;

use super::embedder::{Embedder, EmbedderError, EmbedderResult, normalize_in_place};

const MODEL_FILE: &str = "model.onnx";
const TOKENIZER_JSON: &str = "tokenizer.json";
const CONFIG_JSON: &str = "config.json";
const SPECIAL_TOKENS_JSON: &str = "special_tokens_map.json";
const TOKENIZER_CONFIG_JSON: &str = "tokenizer_config.json";

/// Files that must exist in the model directory.
pub const REQUIRED_MODEL_FILES: [&str; 5] = [
    MODEL_FILE,
    TOKENIZER_JSON,
    CONFIG_JSON,
    SPECIAL_TOKENS_JSON,
    TOKENIZER_CONFIG_JSON,
];

/// Sentence encoder running a MiniLM-style ONNX model through FastEmbed.
pub struct FastEmbedder {
    // The ONNX session needs exclusive access per inference call.
    model: Mutex<TextEmbedding>,
    model_id: String,
    dimension: usize,
}

impl FastEmbedder {
    /// Load the model and tokenizer from `model_dir`.
    ///
    /// `model_id` names the pretrained model (e.g. `paraphrase-MiniLM-L6-v2`)
    /// and `dimension` is the width every produced vector must have.
    ///
    /// # Errors
    /// Returns `EmbedderError::Unavailable` if any required file is missing
    /// or the ONNX session cannot be created.
    pub fn load(model_id: &str, model_dir: &Path, dimension: usize) -> EmbedderResult<Self> {
        if !model_dir.is_dir() {
            return Err(EmbedderError::Unavailable(format!(
                "model directory not found: {}",
                model_dir.display()
            )));
        }

        let missing: Vec<&str> = REQUIRED_MODEL_FILES
            .iter()
            .copied()
            .filter(|name| !model_dir.join(name).is_file())
            .collect();
        if !missing.is_empty() {
            return Err(EmbedderError::Unavailable(format!(
                "model files missing in {}: {}",
                model_dir.display(),
                missing.join(", ")
            )));
        }

        let tokenizer_files = TokenizerFiles {
            tokenizer_file: read_required(model_dir.join(TOKENIZER_JSON), TOKENIZER_JSON)?,
            config_file: read_required(model_dir.join(CONFIG_JSON), CONFIG_JSON)?,
            special_tokens_map_file: read_required(
                model_dir.join(SPECIAL_TOKENS_JSON),
                SPECIAL_TOKENS_JSON,
            )?,
            tokenizer_config_file: read_required(
                model_dir.join(TOKENIZER_CONFIG_JSON),
                TOKENIZER_CONFIG_JSON,
            )?,
        };
        let model_file = read_required(model_dir.join(MODEL_FILE), MODEL_FILE)?;

        let mut user_model = UserDefinedEmbeddingModel::new(model_file, tokenizer_files);
        user_model.pooling = Some(Pooling::Mean);

        let model =
            TextEmbedding::try_new_from_user_defined(user_model, InitOptionsUserDefined::new())
                .map_err(|e| EmbedderError::Unavailable(format!("fastembed init failed: {e}")))?;

        info!(model = model_id, dimension, "sentence encoder loaded");

        Ok(Self {
            model: Mutex::new(model),
            model_id: model_id.to_string(),
            dimension,
        })
    }
}

fn read_required(path: PathBuf, label: &str) -> EmbedderResult<Vec<u8>> {
    fs::read(&path).map_err(|e| {
        EmbedderError::Unavailable(format!("unable to read {label} at {}: {e}", path.display()))
    })
}

impl Embedder for FastEmbedder {
    fn embed(&self, text: &str) -> EmbedderResult<Vec<f32>> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| EmbedderError::Internal("fastembed lock poisoned".to_string()))?;

        let embeddings = model
            .embed(vec![text], None)
            .map_err(|e| EmbedderError::EmbeddingFailed(format!("fastembed embed failed: {e}")))?;
        drop(model);

        let mut embedding = embeddings.into_iter().next().ok_or_else(|| {
            EmbedderError::EmbeddingFailed("fastembed returned no embedding".to_string())
        })?;

        if embedding.len() != self.dimension {
            return Err(EmbedderError::EmbeddingFailed(format!(
                "dimension mismatch: expected {}, got {}",
                self.dimension,
                embedding.len()
            )));
        }

        normalize_in_place(&mut embedding);
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
