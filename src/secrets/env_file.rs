//! Local `.env` file, read without touching the process environment

use super::{SecretSource, SecretsError};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Default)]
pub struct EnvFileSecrets {
    values: HashMap<String, String>,
}

impl EnvFileSecrets {
    /// Load from `path`. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, SecretsError> {
        let wrap = |source: dotenvy::Error| SecretsError::EnvFile {
            path: path.to_path_buf(),
            source,
        };

        let iter = match dotenvy::from_path_iter(path) {
            Ok(iter) => iter,
            Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No env file");
                return Ok(Self::default());
            }
            Err(e) => return Err(wrap(e)),
        };

        let values = iter
            .collect::<Result<HashMap<_, _>, _>>()
            .map_err(wrap)?;
        Ok(Self { values })
    }

    pub fn key_count(&self) -> usize {
        self.values.len()
    }
}

impl SecretSource for EnvFileSecrets {
    fn name(&self) -> &'static str {
        "env_file"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).filter(|v| !v.is_empty()).cloned()
    }
}
