//! Configuration service implementation.
//!
//! Loads [`AppConfig`] from `config.toml` and caches it.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use joblink_core::config::AppConfig;
use joblink_core::error::{JobLinkError, Result};
use tracing::debug;

use crate::paths::JobLinkPaths;

/// Configuration service that loads and caches the application configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<AppConfig>>>,
}

impl ConfigService {
    /// Uses the default `config.toml` location.
    pub fn new(paths: &JobLinkPaths) -> Result<Self> {
        let path = paths
            .config_file()
            .map_err(|e| JobLinkError::config(format!("Failed to get config path: {e}")))?;
        Ok(Self::with_path(path))
    }

    /// Uses an explicit file, e.g. from `--config`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A missing file yields the defaults. A malformed file is an error.
    pub fn get_config(&self) -> Result<AppConfig> {
        {
            let read_lock = self
                .config
                .read()
                .map_err(|e| JobLinkError::internal(format!("Config cache poisoned: {e}")))?;
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = Self::load_config(&self.path)?;

        let mut write_lock = self
            .config
            .write()
            .map_err(|e| JobLinkError::internal(format!("Config cache poisoned: {e}")))?;
        *write_lock = Some(loaded.clone());

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = None;
        }
    }

    fn load_config(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(AppConfig::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&raw)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }
}
