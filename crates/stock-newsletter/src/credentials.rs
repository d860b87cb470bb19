//! OpenAI API key resolution
//!
//! The key is looked up in three places, first hit wins:
//! 1. the process environment
//! 2. a local `.env` file (read without touching the process environment)
//! 3. a hosted-secrets TOML file with a flat `KEY = "value"` table
//!
//! Blank values are treated as missing.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable holding the OpenAI API key
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Errors from credential resolution
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The key is in none of the sources
    #[error("{key} not found in environment variables or secrets store.")]
    Missing { key: String },

    /// The `.env` file exists but could not be parsed
    #[error("Failed to read environment file {path}: {reason}")]
    EnvFile { path: PathBuf, reason: String },

    /// The secrets file exists but could not be parsed
    #[error("Failed to read secrets store {path}: {reason}")]
    SecretsStore { path: PathBuf, reason: String },
}

/// Where a credential was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    EnvFile,
    SecretsStore,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment => write!(f, "environment"),
            Self::EnvFile => write!(f, "env file"),
            Self::SecretsStore => write!(f, "secrets store"),
        }
    }
}

/// A resolved secret and where it came from
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    value: String,
    source: CredentialSource,
}

impl Credential {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn into_value(self) -> String {
        self.value
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Resolves one secret from the environment, `.env` and the secrets store
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    key: String,
    dotenv_path: PathBuf,
    secrets_path: PathBuf,
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new(OPENAI_API_KEY)
    }
}

impl CredentialResolver {
    /// Resolver for `key` using `.env` and `secrets.toml` in the working directory
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            dotenv_path: PathBuf::from(".env"),
            secrets_path: PathBuf::from("secrets.toml"),
        }
    }

    pub fn with_dotenv_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dotenv_path = path.into();
        self
    }

    pub fn with_secrets_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.secrets_path = path.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Resolve against the real process environment
    pub fn resolve(&self) -> Result<Credential, CredentialError> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve with a custom environment lookup
    pub fn resolve_with<F>(&self, env: F) -> Result<Credential, CredentialError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let found = if let Some(value) = non_blank(env(&self.key)) {
            Some((value, CredentialSource::Environment))
        } else if let Some(value) = self.from_dotenv()? {
            Some((value, CredentialSource::EnvFile))
        } else {
            self.from_secrets()?
                .map(|value| (value, CredentialSource::SecretsStore))
        };

        match found {
            Some((value, source)) => {
                info!(key = %self.key, source = %source, "Credential resolved");
                Ok(Credential { value, source })
            }
            None => Err(CredentialError::Missing {
                key: self.key.clone(),
            }),
        }
    }

    fn from_dotenv(&self) -> Result<Option<String>, CredentialError> {
        if !self.dotenv_path.is_file() {
            debug!(path = %self.dotenv_path.display(), "No env file");
            return Ok(None);
        }

        let env_file_error = |reason: String| CredentialError::EnvFile {
            path: self.dotenv_path.clone(),
            reason,
        };
        let entries =
            dotenvy::from_path_iter(&self.dotenv_path).map_err(|e| env_file_error(e.to_string()))?;

        let mut found = None;
        for entry in entries {
            let (name, value) = entry.map_err(|e| env_file_error(e.to_string()))?;
            if name == self.key {
                found = non_blank(Some(value));
            }
        }
        Ok(found)
    }

    fn from_secrets(&self) -> Result<Option<String>, CredentialError> {
        if !self.secrets_path.is_file() {
            debug!(path = %self.secrets_path.display(), "No secrets store");
            return Ok(None);
        }

        let secrets_error = |reason: String| CredentialError::SecretsStore {
            path: self.secrets_path.clone(),
            reason,
        };
        let content =
            std::fs::read_to_string(&self.secrets_path).map_err(|e| secrets_error(e.to_string()))?;
        let table: toml::Table = toml::from_str(&content).map_err(|e| secrets_error(e.to_string()))?;

        Ok(non_blank(
            table
                .get(&self.key)
                .and_then(toml::Value::as_str)
                .map(str::to_string),
        ))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn write(&self, name: &str, content: &str) -> &Self {
            std::fs::write(self.dir.path().join(name), content).unwrap();
            self
        }

        fn resolver(&self) -> CredentialResolver {
            CredentialResolver::default()
                .with_dotenv_path(self.dir.path().join(".env"))
                .with_secrets_path(self.dir.path().join("secrets.toml"))
        }
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_process_environment_wins() {
        let fixture = Fixture::new();
        fixture
            .write(".env", "OPENAI_API_KEY=from-dotenv\n")
            .write("secrets.toml", "OPENAI_API_KEY = \"from-secrets\"\n");

        let credential = fixture
            .resolver()
            .resolve_with(env(&[("OPENAI_API_KEY", "from-env")]))
            .unwrap();
        assert_eq!(credential.value(), "from-env");
        assert_eq!(credential.source(), CredentialSource::Environment);
    }

    #[test]
    fn test_falls_back_to_env_file() {
        let fixture = Fixture::new();
        fixture
            .write(".env", "# local dev\nOTHER=1\nOPENAI_API_KEY=\"sk-dotenv\"\n")
            .write("secrets.toml", "OPENAI_API_KEY = \"from-secrets\"\n");

        let credential = fixture.resolver().resolve_with(env(&[])).unwrap();
        assert_eq!(credential.value(), "sk-dotenv");
        assert_eq!(credential.source(), CredentialSource::EnvFile);
    }

    #[test]
    fn test_falls_back_to_secrets_store() {
        let fixture = Fixture::new();
        fixture
            .write(".env", "OTHER=1\n")
            .write("secrets.toml", "OPENAI_API_KEY = \"sk-secret\"\nOTHER = 3\n");

        let credential = fixture.resolver().resolve_with(env(&[])).unwrap();
        assert_eq!(credential.value(), "sk-secret");
        assert_eq!(credential.source(), CredentialSource::SecretsStore);
    }

    #[test]
    fn test_blank_values_are_skipped() {
        let fixture = Fixture::new();
        fixture
            .write(".env", "OPENAI_API_KEY=\n")
            .write("secrets.toml", "OPENAI_API_KEY = \"sk-secret\"\n");

        let credential = fixture
            .resolver()
            .resolve_with(env(&[("OPENAI_API_KEY", "  ")]))
            .unwrap();
        assert_eq!(credential.source(), CredentialSource::SecretsStore);
    }

    #[test]
    fn test_missing_everywhere() {
        let fixture = Fixture::new();
        let err = fixture.resolver().resolve_with(env(&[])).unwrap_err();

        assert!(matches!(err, CredentialError::Missing { .. }));
        assert_eq!(
            err.to_string(),
            "OPENAI_API_KEY not found in environment variables or secrets store."
        );
    }

    #[test]
    fn test_non_string_secret_is_missing() {
        let fixture = Fixture::new();
        fixture.write("secrets.toml", "OPENAI_API_KEY = 42\n");
        let err = fixture.resolver().resolve_with(env(&[])).unwrap_err();
        assert!(matches!(err, CredentialError::Missing { .. }));
    }

    #[test]
    fn test_malformed_secrets_store() {
        let fixture = Fixture::new();
        fixture.write("secrets.toml", "OPENAI_API_KEY = \n");
        let err = fixture.resolver().resolve_with(env(&[])).unwrap_err();
        assert!(matches!(err, CredentialError::SecretsStore { .. }));
    }

    #[test]
    fn test_debug_redacts_value() {
        let fixture = Fixture::new();
        let credential = fixture
            .resolver()
            .resolve_with(env(&[("OPENAI_API_KEY", "sk-very-secret")]))
            .unwrap();
        assert!(!format!("{credential:?}").contains("sk-very-secret"));
    }
}
