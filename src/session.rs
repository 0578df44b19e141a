//! Conversation thread identity
//!
//! Every interactive session talks to the agent under a [`ThreadId`]. The id is
//! a UUID v5 over a fixed namespace and a seed: either a stable caller-supplied
//! identifier (a patient id) or a random seed minted once per session. The same
//! stable identifier always maps to the same thread, which is how a returning
//! patient picks up their earlier conversation.

#[cfg(test)]
mod proptests;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Namespace shared by every thread-id derivation.
pub const THREAD_NAMESPACE: Uuid = Uuid::NAMESPACE_DNS;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),
}

/// Key under which the agent groups a conversation's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(Uuid);

impl ThreadId {
    fn derive(seed: &str) -> Self {
        Self(Uuid::new_v5(&THREAD_NAMESPACE, seed.as_bytes()))
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

/// Resolve the thread id for a session.
///
/// A non-empty `stable_id` wins and `session_seed` is ignored; otherwise the
/// session seed is used. Deriving from an empty seed would put every anonymous
/// caller on one shared thread, so that case is rejected.
pub fn resolve_thread_id(
    stable_id: Option<&str>,
    session_seed: &str,
) -> Result<ThreadId, SessionError> {
    let seed = match normalize_stable_id(stable_id) {
        Some(id) => id,
        None if !session_seed.is_empty() => session_seed,
        None => {
            return Err(SessionError::InvalidInput(
                "neither a stable id nor a session seed was supplied",
            ))
        }
    };
    Ok(ThreadId::derive(seed))
}

fn normalize_stable_id(stable_id: Option<&str>) -> Option<&str> {
    stable_id.map(str::trim).filter(|id| !id.is_empty())
}

/// Mint a fresh random seed for an anonymous session
pub fn new_session_seed() -> String {
    Uuid::new_v4().to_string()
}

/// Where a session is in its seeding lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No thread id has been asked for yet
    Uninitialized,
    /// A thread id has been derived; the session seed is fixed from here on
    Seeded,
}

/// Per-session identity state.
///
/// Owned by exactly one interactive session. The random seed is generated
/// lazily on first need and never regenerated; the derived thread id is cached
/// until the stable id changes.
#[derive(Debug, Clone)]
pub struct SessionContext {
    phase: SessionPhase,
    session_seed: Option<String>,
    stable_id: Option<String>,
    thread_id: Option<ThreadId>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Uninitialized,
            session_seed: None,
            stable_id: None,
            thread_id: None,
        }
    }

    /// Start a session with a known seed instead of a random one
    #[allow(dead_code)] // Used in tests
    pub fn with_seed(seed: impl Into<String>) -> Self {
        Self {
            session_seed: Some(seed.into()),
            ..Self::new()
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn stable_id(&self) -> Option<&str> {
        self.stable_id.as_deref()
    }

    /// Set or clear the stable identifier. Blank values count as absent.
    pub fn set_stable_id(&mut self, stable_id: Option<&str>) {
        let normalized = normalize_stable_id(stable_id).map(str::to_string);
        if normalized != self.stable_id {
            self.stable_id = normalized;
            self.thread_id = None;
        }
    }

    /// The session's thread id, seeding the session on first call.
    pub fn thread_id(&mut self) -> Result<ThreadId, SessionError> {
        if let Some(id) = self.thread_id {
            return Ok(id);
        }

        if self.stable_id.is_none() && self.session_seed.is_none() {
            self.session_seed = Some(new_session_seed());
            tracing::debug!("Generated random session seed");
        }

        let id = resolve_thread_id(
            self.stable_id.as_deref(),
            self.session_seed.as_deref().unwrap_or_default(),
        )?;

        if self.phase == SessionPhase::Uninitialized {
            tracing::debug!(thread_id = %id, resumable = self.stable_id.is_some(), "Session seeded");
        }
        self.phase = SessionPhase::Seeded;
        self.thread_id = Some(id);
        Ok(id)
    }

    /// Thread id if one has already been derived, without seeding
    pub fn current_thread_id(&self) -> Option<ThreadId> {
        self.thread_id
    }

    /// Thread keyed by this session's random seed, if one was minted.
    ///
    /// Reported even while a stable id is active, since clearing the stable id
    /// returns the session to it.
    pub fn anonymous_thread_id(&self) -> Option<ThreadId> {
        self.session_seed.as_deref().map(ThreadId::derive)
    }
}
