//! Named secret lookup
//!
//! Secrets are resolved through an ordered chain of sources. The first source
//! holding a non-empty value wins. Sources only read; nothing here writes to
//! the process environment.

mod env_file;
mod platform;

pub use env_file::EnvFileSecrets;
pub use platform::PlatformSecrets;

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SecretsError {
    #[error("Failed to read secrets file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse secrets file {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to read env file {}: {source}", .path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

/// A place secrets can be looked up by name
pub trait SecretSource: Send + Sync {
    /// Short label for logs
    fn name(&self) -> &'static str;

    /// Look up a secret. Absent and empty are both `None`.
    fn get(&self, key: &str) -> Option<String>;
}

/// Real environment variables of this process
pub struct ProcessEnv;

impl SecretSource for ProcessEnv {
    fn name(&self) -> &'static str {
        "process_env"
    }

    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

/// Ordered list of secret sources
#[derive(Default)]
pub struct SecretChain {
    sources: Vec<Box<dyn SecretSource>>,
}

impl SecretChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source with lower priority than those already present
    #[must_use]
    pub fn with_source(mut self, source: impl SecretSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Hosted-platform store, then local env file, then the process environment.
    ///
    /// A file that cannot be read or parsed is logged and treated as empty.
    pub fn standard(secrets_file: &Path, env_file: &Path) -> Self {
        let platform = PlatformSecrets::load(secrets_file).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring platform secrets store");
            PlatformSecrets::default()
        });
        let dotenv = EnvFileSecrets::load(env_file).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring env file");
            EnvFileSecrets::default()
        });

        tracing::debug!(
            platform_keys = platform.key_count(),
            env_file_keys = dotenv.key_count(),
            "Secret sources loaded"
        );

        Self::new()
            .with_source(platform)
            .with_source(dotenv)
            .with_source(ProcessEnv)
    }

    /// First non-empty value for `key`, in source order
    pub fn resolve_secret(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|source| {
            let value = source.get(key)?;
            tracing::debug!(key, source = source.name(), "Resolved secret");
            Some(value)
        })
    }

    /// Names of the sources in priority order
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}
