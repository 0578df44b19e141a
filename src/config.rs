//! Application configuration, resolved through the secret chain

use crate::llm::LlmConfig;
use crate::secrets::SecretChain;
use std::path::PathBuf;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const PORT: &str = "PROMPT_AGENT_PORT";
pub const PROMPT_FILE: &str = "PROMPT_AGENT_PROMPT_FILE";

/// Locations of the secret stores themselves. These come from the process
/// environment only, since they say where the other sources live.
pub const SECRETS_FILE: &str = "PROMPT_AGENT_SECRETS_FILE";
pub const ENV_FILE: &str = "PROMPT_AGENT_ENV_FILE";

pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_PORT: u16 = 8501;
pub const DEFAULT_PROMPT_FILE: &str = "prompts/agent.prompt";
pub const DEFAULT_SECRETS_FILE: &str = "secrets.toml";
pub const DEFAULT_ENV_FILE: &str = ".env";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub port: u16,
    pub prompt_file: PathBuf,
}

impl AppConfig {
    pub fn resolve(secrets: &SecretChain) -> Self {
        let port = secrets
            .resolve_secret(PORT)
            .and_then(|p| match p.parse() {
                Ok(port) => Some(port),
                Err(e) => {
                    tracing::warn!(value = %p, error = %e, "Invalid port, using default");
                    None
                }
            })
            .unwrap_or(DEFAULT_PORT);

        Self {
            llm: LlmConfig {
                api_key: secrets.resolve_secret(OPENAI_API_KEY),
                model: secrets
                    .resolve_secret(OPENAI_MODEL)
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: secrets
                    .resolve_secret(OPENAI_BASE_URL)
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            },
            port,
            prompt_file: secrets
                .resolve_secret(PROMPT_FILE)
                .map_or_else(|| PathBuf::from(DEFAULT_PROMPT_FILE), PathBuf::from),
        }
    }
}

/// Paths of the platform secrets file and the local env file
pub fn secret_store_paths() -> (PathBuf, PathBuf) {
    let from_env = |key: &str, default: &str| {
        std::env::var(key).map_or_else(|_| PathBuf::from(default), PathBuf::from)
    };
    (
        from_env(SECRETS_FILE, DEFAULT_SECRETS_FILE),
        from_env(ENV_FILE, DEFAULT_ENV_FILE),
    )
}
