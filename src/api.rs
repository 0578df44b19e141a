//! HTTP API and chat UI
//!
//! Each browser tab creates an interactive session; the session owns its
//! identity context and transcript and never shares them with other sessions.

mod assets;
mod handlers;
mod sessions;
mod types;

pub use handlers::create_router;
pub use sessions::SessionRegistry;

use crate::agent::Agent;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    pub agent: Arc<dyn Agent>,
    pub model_id: String,
    pub api_key_configured: bool,
}

impl AppState {
    pub fn new(agent: Arc<dyn Agent>, model_id: impl Into<String>, api_key_configured: bool) -> Self {
        Self {
            sessions: Arc::new(SessionRegistry::new()),
            agent,
            model_id: model_id.into(),
            api_key_configured,
        }
    }
}
