//! LLM completion through Rig's Groq provider.

use std::future::Future;
use std::pin::Pin;

use reqwest::Client as ReqwestClient;
use rig::client::CompletionClient;
use rig::completion::CompletionModel;
use rig::message::AssistantContent;
use rig::providers::groq;

use crate::answer::errors::{AnswerError, AnswerResult};
use crate::retrieval::core::config::LlmConfig;
use crate::retrieval::core::errors::{StartupError, StartupResult};

/// Boxed future type for answer model operations.
pub type AnswerFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait abstraction over the hosted chat model.
pub trait AnswerModel: Send + Sync {
    /// Complete one system + user exchange with `model` and return the reply text.
    ///
    /// # Errors
    /// Returns an error if the request fails or the reply holds no text.
    fn complete<'a>(
        &'a self,
        model: &'a str,
        system: &'a str,
        user: &'a str,
    ) -> AnswerFuture<'a, AnswerResult<String>>;
}

/// Groq chat model client.
pub struct GroqAnswerModel {
    client: groq::Client<ReqwestClient>,
    temperature: f64,
    max_tokens: u64,
}

impl GroqAnswerModel {
    /// Build a Groq client from config.
    ///
    /// # Errors
    /// Returns an error if the API key is missing or the client cannot be built.
    pub fn new(config: &LlmConfig) -> StartupResult<Self> {
        let api_key = config.api_key.as_deref().ok_or_else(|| {
            StartupError::InvalidConfig("GROQ_API_KEY environment variable is not set".to_string())
        })?;

        let builder = groq::Client::<ReqwestClient>::builder().api_key(api_key);
        let builder = if let Some(base_url) = &config.base_url {
            builder.base_url(base_url)
        } else {
            builder
        };
        let client = builder.build().map_err(AnswerError::from)?;

        Ok(Self {
            client,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

impl AnswerModel for GroqAnswerModel {
    fn complete<'a>(
        &'a self,
        model: &'a str,
        system: &'a str,
        user: &'a str,
    ) -> AnswerFuture<'a, AnswerResult<String>> {
        Box::pin(async move {
            let completion_model = self.client.completion_model(model.to_string());
            let request = completion_model
                .completion_request(user.to_string())
                .preamble(system.to_string())
                .temperature(self.temperature)
                .max_tokens(self.max_tokens)
                .build();

            let response = completion_model.completion(request).await?;
            let text = extract_text(&response.choice);
            if text.trim().is_empty() {
                return Err(AnswerError::EmptyResponse);
            }
            Ok(text)
        })
    }
}

fn extract_text(choice: &rig::OneOrMany<AssistantContent>) -> String {
    let mut out = String::new();
    for content in choice.iter() {
        if let AssistantContent::Text(text) = content {
            out.push_str(&text.text);
        }
    }
    out
}
