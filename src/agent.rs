//! Agent invocation
//!
//! The UI hands each message to an [`Agent`] together with the session's
//! thread id. The agent keeps one history per thread, so a resumed thread id
//! continues the earlier conversation.

mod thread_store;

#[cfg(test)]
pub mod testing;

pub use thread_store::ThreadStore;

use crate::llm::{ContentBlock, LlmError, LlmMessage, LlmRequest, LlmService, MessageRole};
use crate::session::ThreadId;
use crate::tools::{ToolOutput, ToolRegistry};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Upper bound on model round-trips for one user message
pub const MAX_STEPS: usize = 8;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("Agent did not finish within {0} model calls")]
    TooManySteps(usize),
}

/// Per-invocation settings
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub thread_id: ThreadId,
    pub user_name: Option<String>,
    pub user_id: Option<String>,
}

impl RunConfig {
    #[allow(dead_code)] // Used in tests
    pub fn new(thread_id: ThreadId) -> Self {
        Self {
            thread_id,
            user_name: None,
            user_id: None,
        }
    }
}

#[async_trait]
pub trait Agent: Send + Sync {
    /// Send one user message on `config.thread_id` and return the reply text
    async fn invoke(&self, config: &RunConfig, message: &str) -> Result<String, AgentError>;

    /// Messages recorded on a thread so far
    async fn history(&self, thread_id: &ThreadId) -> Vec<LlmMessage>;

    /// Forget everything recorded on a thread
    async fn reset_thread(&self, thread_id: &ThreadId);
}

/// Reason-and-act loop: call the model, run any tools it asks for, feed the
/// results back, until it answers in plain text.
pub struct ReactAgent {
    llm: Arc<dyn LlmService>,
    tools: ToolRegistry,
    system_prompt: String,
    threads: ThreadStore,
    max_steps: usize,
}

impl ReactAgent {
    pub fn new(llm: Arc<dyn LlmService>, tools: ToolRegistry, system_prompt: String) -> Self {
        Self {
            llm,
            tools,
            system_prompt,
            threads: ThreadStore::new(),
            max_steps: MAX_STEPS,
        }
    }

    #[must_use]
    #[allow(dead_code)] // Used in tests
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    fn system_for(&self, config: &RunConfig) -> String {
        match config.user_name.as_deref() {
            Some(name) => format!("{}\n\nThe user's name is {name}.", self.system_prompt),
            None => self.system_prompt.clone(),
        }
    }

    async fn run_tools(&self, calls: Vec<(String, String, serde_json::Value)>) -> LlmMessage {
        let mut results = Vec::with_capacity(calls.len());
        for (id, name, input) in calls {
            let output = match self.tools.execute(&name, input).await {
                Some(output) => output,
                None => {
                    tracing::warn!(tool = %name, "Model requested unknown tool");
                    ToolOutput::error(format!("Unknown tool: {name}"))
                }
            };
            tracing::debug!(tool = %name, success = output.success, "Tool finished");
            results.push(ContentBlock::tool_result(id, output.output, !output.success));
        }
        LlmMessage {
            role: MessageRole::User,
            content: results,
        }
    }
}

#[async_trait]
impl Agent for ReactAgent {
    async fn invoke(&self, config: &RunConfig, message: &str) -> Result<String, AgentError> {
        let thread = self.threads.thread(&config.thread_id).await;
        // One turn at a time per thread; work on a copy so a failed turn leaves
        // the stored history untouched.
        let mut stored = thread.lock().await;
        let mut history = stored.clone();
        history.push(LlmMessage::user(message));

        tracing::info!(
            thread_id = %config.thread_id,
            user_id = config.user_id.as_deref().unwrap_or(""),
            prior_messages = stored.len(),
            "Agent invoked"
        );

        for step in 1..=self.max_steps {
            let request = LlmRequest::new(self.system_for(config), history.clone())
                .with_tools(self.tools.definitions());
            let response = self.llm.complete(&request).await?;

            let calls: Vec<_> = response
                .tool_uses()
                .into_iter()
                .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
                .collect();
            let reply = response.text();
            history.push(LlmMessage::assistant(response.content));

            if calls.is_empty() {
                tracing::info!(thread_id = %config.thread_id, steps = step, "Agent finished");
                *stored = history;
                return Ok(reply);
            }

            let results = self.run_tools(calls).await;
            history.push(results);
        }

        tracing::warn!(thread_id = %config.thread_id, max_steps = self.max_steps, "Agent step limit reached");
        Err(AgentError::TooManySteps(self.max_steps))
    }

    async fn history(&self, thread_id: &ThreadId) -> Vec<LlmMessage> {
        self.threads.history(thread_id).await
    }

    async fn reset_thread(&self, thread_id: &ThreadId) {
        self.threads.remove(thread_id).await;
        tracing::info!(thread_id = %thread_id, "Thread reset");
    }
}
