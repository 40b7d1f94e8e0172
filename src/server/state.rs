//! Application state shared across all request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use crate::answer::{AnswerModel, AnswerPipeline, GroqAnswerModel};
use crate::retrieval::{Retriever, ServiceConfig, StartupResult};

/// Shared application state.
pub struct AppState {
    /// Retrieval plus LLM answer flow.
    pub pipeline: AnswerPipeline,
    /// Directory served for the web client.
    pub static_dir: PathBuf,
}

impl AppState {
    /// Acquire every artifact named by `config` and build the state.
    ///
    /// Loads the embedding model, the vector index and the corpus, checks
    /// they agree with each other and connects the Groq client.
    ///
    /// # Errors
    /// Returns an error if any artifact is missing or misaligned, or the LLM
    /// client cannot be built.
    pub fn from_config(config: &ServiceConfig) -> StartupResult<Arc<Self>> {
        let retriever = Arc::new(Retriever::from_config(config)?);
        let model: Arc<dyn AnswerModel> = Arc::new(GroqAnswerModel::new(&config.llm)?);
        Self::new(retriever, model, config)
    }

    /// Build the state from an already loaded retriever and answer model.
    ///
    /// # Errors
    /// Returns an error if the response formatter fails to build.
    pub fn new(
        retriever: Arc<Retriever>,
        model: Arc<dyn AnswerModel>,
        config: &ServiceConfig,
    ) -> StartupResult<Arc<Self>> {
        let pipeline = AnswerPipeline::new(
            retriever,
            model,
            config.llm.clone(),
            config.retrieval.clone(),
        )?;
        Ok(Arc::new(Self {
            pipeline,
            static_dir: config.server.static_dir.clone(),
        }))
    }
}
