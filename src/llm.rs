//! LLM provider abstraction
//!
//! The agent talks to the model through [`LlmService`]; the production
//! implementation is an `OpenAI` chat-completions client.

mod error;
mod openai;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use openai::OpenAIService;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Model provider settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    /// Base URL of an `OpenAI`-compatible API, without the endpoint path
    pub base_url: String,
}

/// Common interface for LLM providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Build the production model service, wrapped with logging
pub fn from_config(config: &LlmConfig) -> Result<Arc<dyn LlmService>, LlmError> {
    let service = OpenAIService::new(config)?;
    Ok(Arc::new(LoggingService::new(Arc::new(service))))
}

/// Stand-in when the provider cannot be configured (e.g. no API key).
///
/// Keeps the server up; every request fails with the configuration error.
pub struct UnavailableService {
    model_id: String,
    error: LlmError,
}

impl UnavailableService {
    pub fn new(model_id: impl Into<String>, error: LlmError) -> Self {
        Self {
            model_id: model_id.into(),
            error,
        }
    }
}

#[async_trait]
impl LlmService for UnavailableService {
    async fn complete(&self, _request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        Err(self.error.clone())
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Logging wrapper for LLM services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    messages = request.messages.len(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "LLM request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "LLM request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
