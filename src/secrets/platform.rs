//! Hosted-platform secret store
//!
//! The hosting platform mounts secrets as a TOML file. Only flat top-level
//! string keys are secrets; nested tables and other value types are skipped.

use super::{SecretSource, SecretsError};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Default)]
pub struct PlatformSecrets {
    values: HashMap<String, String>,
}

impl PlatformSecrets {
    /// Load from `path`. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, SecretsError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No platform secrets file");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SecretsError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Self::parse(&text).map_err(|source| SecretsError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let table: toml::Table = text.parse()?;
        let values = table
            .into_iter()
            .filter_map(|(key, value)| match value {
                toml::Value::String(s) => Some((key, s)),
                _ => None,
            })
            .collect();
        Ok(Self { values })
    }

    pub fn key_count(&self) -> usize {
        self.values.len()
    }
}

impl SecretSource for PlatformSecrets {
    fn name(&self) -> &'static str {
        "platform_secrets"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).filter(|v| !v.is_empty()).cloned()
    }
}
