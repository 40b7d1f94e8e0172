//! Configuration for the hadith RAG service.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::retrieval::core::errors::{StartupError, StartupResult};

/// Top-level service configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Corpus and artifact locations.
    pub corpus: CorpusConfig,
    /// Embedding model settings.
    pub embedding: EmbeddingConfig,
    /// Retrieval settings.
    pub retrieval: RetrievalConfig,
    /// Completion model settings.
    pub llm: LlmConfig,
}

impl ServiceConfig {
    /// Read the configuration from process environment variables.
    ///
    /// # Errors
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> StartupResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    ///
    /// Unset variables fall back to the defaults.
    ///
    /// # Errors
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> StartupResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let path = |key: &str, default: PathBuf| lookup(key).map_or(default, PathBuf::from);
        let text = |key: &str, default: String| lookup(key).unwrap_or(default);

        Ok(Self {
            server: ServerConfig {
                port: parse_var(&lookup, "HADITH_PORT", defaults.server.port)?,
                static_dir: path("HADITH_STATIC_DIR", defaults.server.static_dir),
            },
            corpus: CorpusConfig {
                data_dir: path("HADITH_DATA_DIR", defaults.corpus.data_dir),
                embeddings_path: path("HADITH_EMBEDDINGS_PATH", defaults.corpus.embeddings_path),
                index_path: path("HADITH_INDEX_PATH", defaults.corpus.index_path),
            },
            embedding: EmbeddingConfig {
                model_name: text("HADITH_MODEL_NAME", defaults.embedding.model_name),
                model_dir: path("HADITH_MODEL_DIR", defaults.embedding.model_dir),
                dimension: parse_var(
                    &lookup,
                    "HADITH_EMBEDDING_DIM",
                    defaults.embedding.dimension,
                )?,
            },
            retrieval: RetrievalConfig {
                retrieve_k: parse_var(
                    &lookup,
                    "HADITH_RETRIEVE_K",
                    defaults.retrieval.retrieve_k,
                )?,
                timeout_secs: parse_var(
                    &lookup,
                    "HADITH_RETRIEVAL_TIMEOUT_SECS",
                    defaults.retrieval.timeout_secs,
                )?,
            },
            llm: LlmConfig {
                api_key: lookup("GROQ_API_KEY").filter(|key| !key.trim().is_empty()),
                base_url: lookup("HADITH_GROQ_BASE_URL"),
                concise_model: text("HADITH_CONCISE_MODEL", defaults.llm.concise_model),
                detailed_model: text("HADITH_DETAILED_MODEL", defaults.llm.detailed_model),
                top_k_concise: parse_var(
                    &lookup,
                    "HADITH_TOP_K_CONCISE",
                    defaults.llm.top_k_concise,
                )?,
                top_k_detailed: parse_var(
                    &lookup,
                    "HADITH_TOP_K_DETAILED",
                    defaults.llm.top_k_detailed,
                )?,
                temperature: parse_var(
                    &lookup,
                    "HADITH_LLM_TEMPERATURE",
                    defaults.llm.temperature,
                )?,
                max_tokens: parse_var(&lookup, "HADITH_LLM_MAX_TOKENS", defaults.llm.max_tokens)?,
            },
        })
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> StartupResult<()> {
        if self.embedding.dimension == 0 {
            return Err(StartupError::InvalidConfig(
                "embedding.dimension must be > 0".to_string(),
            ));
        }

        if self.retrieval.retrieve_k == 0 {
            return Err(StartupError::InvalidConfig(
                "retrieval.retrieve_k must be > 0".to_string(),
            ));
        }

        if self.retrieval.timeout_secs == 0 {
            return Err(StartupError::InvalidConfig(
                "retrieval.timeout_secs must be > 0".to_string(),
            ));
        }

        for (name, top_k) in [
            ("concise", self.llm.top_k_concise),
            ("detailed", self.llm.top_k_detailed),
        ] {
            if top_k == 0 || top_k > self.retrieval.retrieve_k {
                return Err(StartupError::InvalidConfig(format!(
                    "llm.top_k_{name} must be in 1..={}, got {top_k}",
                    self.retrieval.retrieve_k
                )));
            }
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(StartupError::InvalidConfig(format!(
                "llm.temperature must be in 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.api_key.is_none() {
            return Err(StartupError::InvalidConfig(
                "GROQ_API_KEY environment variable is not set".to_string(),
            ));
        }

        if let Some(base_url) = &self.llm.base_url {
            Url::parse(base_url)?;
        }

        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> StartupResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|err| {
            StartupError::InvalidConfig(format!("{key}={raw:?} is not valid: {err}"))
        }),
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,
    /// Directory of static assets served at `/`.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            static_dir: PathBuf::from("static"),
        }
    }
}

/// Corpus and artifact locations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Directory searched recursively for corpus CSV files.
    pub data_dir: PathBuf,
    /// Precomputed embeddings (`.npy`, `f32`, one row per kept record).
    pub embeddings_path: PathBuf,
    /// Serialized usearch index built over the same embeddings.
    pub index_path: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            embeddings_path: PathBuf::from("models/embeddings/english_embeddings.npy"),
            index_path: PathBuf::from("models/indices/hadith_en.usearch"),
        }
    }
}

/// Embedding model settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Pretrained sentence model identifier.
    pub model_name: String,
    /// Local directory holding the ONNX export and tokenizer files.
    pub model_dir: PathBuf,
    /// Embedding vector dimensions.
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: "paraphrase-MiniLM-L6-v2".to_string(),
            model_dir: PathBuf::from("models/paraphrase-MiniLM-L6-v2"),
            dimension: 384,
        }
    }
}

/// Retrieval settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of neighbors fetched per query before mode truncation.
    pub retrieve_k: usize,
    /// Upper bound on encode plus search, in seconds.
    pub timeout_secs: u64,
}

impl RetrievalConfig {
    /// Retrieval timeout as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            retrieve_k: 5,
            timeout_secs: 30,
        }
    }
}

/// Completion model settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Groq API key.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Optional custom base URL.
    pub base_url: Option<String>,
    /// Model used in concise mode.
    pub concise_model: String,
    /// Model used in detailed mode.
    pub detailed_model: String,
    /// Records handed to the model in concise mode.
    pub top_k_concise: usize,
    /// Records handed to the model in detailed mode.
    pub top_k_detailed: usize,
    /// Temperature for generation.
    pub temperature: f64,
    /// Max tokens per answer.
    pub max_tokens: u64,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("concise_model", &self.concise_model)
            .field("detailed_model", &self.detailed_model)
            .field("top_k_concise", &self.top_k_concise)
            .field("top_k_detailed", &self.top_k_detailed)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            concise_model: "llama-3.3-70b-versatile".to_string(),
            detailed_model: "llama-3.3-70b-versatile".to_string(),
            top_k_concise: 3,
            top_k_detailed: 5,
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}
