//! Secret service implementation.
//!
//! The Gemini credential is resolved in this order:
//! 1. `GEMINI_API_KEY` environment variable
//! 2. `API_KEY` environment variable
//! 3. `secret.json` (`{ "gemini": { "api_key": "..." } }`)
//!
//! Nothing found is not an error: the caller gets [`ApiKey::Placeholder`] and
//! the assistant degrades to a non-functional state instead of crashing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use joblink_core::config::SecretConfig;
use joblink_core::error::{JobLinkError, Result};
use joblink_core::secret::{ApiKey, SecretService};
use tracing::{debug, warn};

use crate::paths::JobLinkPaths;

pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_API_KEY: &str = "API_KEY";

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves secrets from the environment and `secret.json`.
#[derive(Clone)]
pub struct SecretServiceImpl {
    secret_file: PathBuf,
    env: EnvLookup,
}

impl SecretServiceImpl {
    /// Uses the default `secret.json` location and the process environment.
    pub fn new(paths: &JobLinkPaths) -> Result<Self> {
        let secret_file = paths
            .secret_file()
            .map_err(|e| JobLinkError::config(format!("Failed to get secret path: {e}")))?;
        Ok(Self::with_path(secret_file))
    }

    pub fn with_path(secret_file: impl Into<PathBuf>) -> Self {
        Self {
            secret_file: secret_file.into(),
            env: Arc::new(|key| std::env::var(key).ok()),
        }
    }

    /// Replaces the environment lookup.
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    pub fn secret_file(&self) -> &Path {
        &self.secret_file
    }

    fn env_key(&self) -> Option<String> {
        [ENV_GEMINI_API_KEY, ENV_API_KEY]
            .into_iter()
            .filter_map(|name| (self.env)(name))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    }

    async fn read_secret_file(&self) -> Result<SecretConfig> {
        if !tokio::fs::try_exists(&self.secret_file).await? {
            return Ok(SecretConfig::default());
        }
        let raw = tokio::fs::read_to_string(&self.secret_file).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[async_trait::async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> std::result::Result<SecretConfig, String> {
        // Error text carries the path only, never file contents
        self.read_secret_file().await.map_err(|e| {
            format!(
                "Failed to load {}: {}",
                self.secret_file.display(),
                match e {
                    JobLinkError::Serialization { format, .. } => format!("invalid {format}"),
                    other => other.to_string(),
                }
            )
        })
    }

    async fn resolve_api_key(&self) -> ApiKey {
        if let Some(key) = self.env_key() {
            debug!("Using Gemini API key from environment");
            return ApiKey::Configured(key);
        }

        match self.load_secrets().await {
            Ok(SecretConfig {
                gemini: Some(gemini),
            }) if !gemini.api_key.trim().is_empty() => {
                debug!(path = %self.secret_file.display(), "Using Gemini API key from secret file");
                ApiKey::Configured(gemini.api_key.trim().to_string())
            }
            Ok(_) => {
                warn!(
                    "API_KEY environment variable not set. Using a placeholder. AI features will not work."
                );
                ApiKey::Placeholder
            }
            Err(e) => {
                warn!(error = %e, "Could not read secret file. Using a placeholder. AI features will not work.");
                ApiKey::Placeholder
            }
        }
    }
}
