//! Unified path management for joblink configuration files.
//!
//! ```text
//! ~/.config/joblink/           # Config directory
//! ├── config.toml              # Models, endpoint, log level
//! └── secret.json              # API key
//!
//! ~/.local/share/joblink/      # Data directory
//! └── images/                  # Generated and edited images
//! ```

use std::path::{Path, PathBuf};

const APP_DIR: &str = "joblink";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Path resolution rooted either at the platform directories or at an
/// explicit base directory (tests, `--config` overrides).
#[derive(Debug, Clone, Default)]
pub struct JobLinkPaths {
    base: Option<PathBuf>,
}

impl JobLinkPaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the joblink configuration directory.
    ///
    /// - `Ok(PathBuf)`: e.g. `~/.config/joblink/`
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    /// Returns the joblink data directory (e.g. `~/.local/share/joblink/`).
    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.join("data")),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the path to the secrets file.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn secret_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("secret.json"))
    }

    /// Default directory produced images are written to.
    pub fn images_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("images"))
    }
}
