//! Error types for the JobLink assistant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the assistant panel.
///
/// Every backend failure is mapped into one of these variants at the point of
/// invocation, so callers only ever see a user-readable message.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum AssistantError {
    /// A send was attempted before a session existed for the current user.
    #[error("Chat session not initialized.")]
    SessionNotInitialized,

    /// The generative backend failed (network, HTTP status, empty result).
    #[error("{0}")]
    BackendRequestFailed(String),

    /// Local validation failed; no request was made.
    #[error("{0}")]
    InvalidInput(String),
}

impl AssistantError {
    /// Creates a BackendRequestFailed error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::BackendRequestFailed(message.into())
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Whether the user can recover by retrying or choosing different input.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::SessionNotInitialized)
    }

    pub fn is_backend(&self) -> bool {
        matches!(self, Self::BackendRequestFailed(_))
    }
}

/// A shared error type for configuration and infrastructure code.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum JobLinkError {
    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl JobLinkError {
    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for JobLinkError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for JobLinkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for JobLinkError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, JobLinkError>`.
pub type Result<T> = std::result::Result<T, JobLinkError>;
