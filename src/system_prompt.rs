//! System prompt loading
//!
//! The prompt lives in a plain-text file next to the deployment so it can be
//! edited without a rebuild. It is read once at start-up.

use std::path::Path;

/// Used when no prompt file is present
const DEFAULT_PROMPT: &str = "You are a helpful assistant. Answer clearly and concisely. \
Use the get_current_date tool whenever the answer depends on today's date.";

/// Load the system prompt from `path`, trimmed.
///
/// Falls back to a built-in prompt if the file is missing, unreadable, or blank.
pub fn load_system_prompt(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) if !content.trim().is_empty() => {
            tracing::info!(path = %path.display(), "Loaded system prompt");
            content.trim().to_string()
        }
        Ok(_) => {
            tracing::warn!(path = %path.display(), "System prompt file is empty, using default");
            DEFAULT_PROMPT.to_string()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "No system prompt file, using default");
            DEFAULT_PROMPT.to_string()
        }
    }
}
