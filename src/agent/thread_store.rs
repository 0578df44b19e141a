//! In-process conversation memory, one history per thread id

use crate::llm::LlmMessage;
use crate::session::ThreadId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

type Thread = Arc<Mutex<Vec<LlmMessage>>>;

#[derive(Default)]
pub struct ThreadStore {
    threads: RwLock<HashMap<ThreadId, Thread>>,
}

impl ThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to a thread's history, creating an empty one if needed
    pub async fn thread(&self, id: &ThreadId) -> Thread {
        if let Some(thread) = self.threads.read().await.get(id) {
            return thread.clone();
        }
        self.threads
            .write()
            .await
            .entry(*id)
            .or_default()
            .clone()
    }

    /// Snapshot of a thread's messages; empty for unknown threads
    pub async fn history(&self, id: &ThreadId) -> Vec<LlmMessage> {
        let thread = self.threads.read().await.get(id).cloned();
        match thread {
            Some(thread) => thread.lock().await.clone(),
            None => Vec::new(),
        }
    }

    pub async fn remove(&self, id: &ThreadId) {
        self.threads.write().await.remove(id);
    }

    #[allow(dead_code)] // Used in tests
    pub async fn len(&self) -> usize {
        self.threads.read().await.len()
    }
}
