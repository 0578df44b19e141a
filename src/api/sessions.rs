//! Interactive chat sessions held in memory

use crate::llm::{LlmMessage, MessageRole};
use crate::session::SessionContext;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// One line of the visible transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatEntry {
    pub role: MessageRole,
    pub content: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl ChatEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            error: false,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            error: false,
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: format!("⚠️ Error: {message}"),
            error: true,
        }
    }

    /// Visible transcript for a thread's stored history. Tool traffic has no
    /// text and is skipped.
    pub fn from_history(history: &[LlmMessage]) -> Vec<Self> {
        history
            .iter()
            .filter_map(|msg| {
                let text = msg.text();
                (!text.is_empty()).then(|| Self {
                    role: msg.role,
                    content: text,
                    error: false,
                })
            })
            .collect()
    }
}

/// State of one browser session
#[derive(Debug)]
pub struct ChatSession {
    pub context: SessionContext,
    pub user_name: Option<String>,
    pub transcript: Vec<ChatEntry>,
    pub created_at: DateTime<Utc>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            context: SessionContext::new(),
            user_name: None,
            transcript: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

pub type SessionHandle = Arc<Mutex<ChatSession>>;

/// All live sessions, keyed by an opaque session id
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session; returns its id
    pub async fn create(&self) -> (String, SessionHandle) {
        let id = uuid::Uuid::new_v4().to_string();
        let handle = Arc::new(Mutex::new(ChatSession::new()));
        self.sessions.write().await.insert(id.clone(), handle.clone());
        tracing::info!(session_id = %id, "Session created");
        (id, handle)
    }

    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// End a session, handing back its state. `None` if it did not exist.
    pub async fn remove(&self, id: &str) -> Option<SessionHandle> {
        let removed = self.sessions.write().await.remove(id);
        if removed.is_some() {
            tracing::info!(session_id = %id, "Session ended");
        }
        removed
    }

    #[allow(dead_code)] // Used in tests
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
