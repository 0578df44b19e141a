//! API request and response types

use super::sessions::{ChatEntry, ChatSession};
use crate::session::{SessionPhase, ThreadId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sidebar settings for a session
#[derive(Debug, Default, Deserialize)]
pub struct SettingsRequest {
    #[serde(default)]
    pub user_name: Option<String>,
    /// Patient id; blank means anonymous
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// Full view of a session
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub phase: SessionPhase,
    /// Absent until the session is seeded
    pub thread_id: Option<ThreadId>,
    pub user_name: Option<String>,
    pub user_id: Option<String>,
    pub messages: Vec<ChatEntry>,
    pub created_at: DateTime<Utc>,
}

impl SessionResponse {
    pub fn new(session_id: impl Into<String>, session: &ChatSession) -> Self {
        Self {
            session_id: session_id.into(),
            phase: session.context.phase(),
            thread_id: session.context.current_thread_id(),
            user_name: session.user_name.clone(),
            user_id: session.context.stable_id().map(str::to_string),
            messages: session.transcript.clone(),
            created_at: session.created_at,
        }
    }
}

/// Response for chat action
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub thread_id: ThreadId,
    pub reply: ChatEntry,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Public runtime configuration
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub model: String,
    pub api_key_configured: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
