//! Wiring of configuration, credentials and the Gemini backend.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use joblink_core::assistant::AssistantEvent;
use joblink_core::config::AppConfig;
use joblink_core::secret::SecretService;
use joblink_core::session::SessionManager;
use joblink_infrastructure::{ConfigService, JobLinkPaths, SecretServiceImpl};
use joblink_interaction::GeminiBackend;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use crate::controller::AssistantController;

/// Loaded configuration plus a session manager bound to the real backend.
pub struct AssistantRuntime {
    pub config: AppConfig,
    pub sessions: SessionManager,
    api_key_configured: bool,
}

impl AssistantRuntime {
    /// Reads `config.toml`, or `config_file` when given. A missing file yields defaults.
    pub fn load_config(paths: &JobLinkPaths, config_file: Option<PathBuf>) -> Result<AppConfig> {
        let config_service = match config_file {
            Some(path) => ConfigService::with_path(path),
            None => ConfigService::new(paths).context("Failed to resolve config path")?,
        };
        config_service
            .get_config()
            .with_context(|| format!("Failed to load {}", config_service.path().display()))
    }

    /// Resolves the credential from the environment or `secret.json` and builds the backend.
    pub async fn load(paths: &JobLinkPaths, config: AppConfig) -> Result<Self> {
        let secrets = SecretServiceImpl::new(paths).context("Failed to resolve secret path")?;
        Ok(Self::from_parts(config, &secrets).await)
    }

    pub async fn from_parts(config: AppConfig, secrets: &dyn SecretService) -> Self {
        let api_key = secrets.resolve_api_key().await;
        let api_key_configured = !api_key.is_placeholder();
        let backend = GeminiBackend::new(api_key, config.gemini.clone());

        info!(
            chat_model = %config.gemini.chat_model,
            image_model = %config.gemini.image_model,
            edit_model = %config.gemini.edit_model,
            api_key_configured,
            "Assistant runtime ready"
        );

        Self {
            sessions: SessionManager::new(Arc::new(backend)),
            config,
            api_key_configured,
        }
    }

    /// Whether a real credential was found.
    pub fn api_key_configured(&self) -> bool {
        self.api_key_configured
    }

    /// A fresh controller publishing its events on `events`.
    pub fn controller(&self, events: UnboundedSender<AssistantEvent>) -> AssistantController {
        AssistantController::new(self.sessions.clone()).with_events(events)
    }
}
