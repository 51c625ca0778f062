//! Secret management service trait.
//!
//! Defines the interface for resolving the backend credential.

use crate::config::SecretConfig;

/// Credential the backend is built with.
#[derive(Clone, PartialEq, Eq)]
pub enum ApiKey {
    Configured(String),
    /// No credential was found; requests will be rejected by the service.
    Placeholder,
}

impl ApiKey {
    pub const PLACEHOLDER: &'static str = "placeholder-key";

    pub fn as_str(&self) -> &str {
        match self {
            ApiKey::Configured(key) => key,
            ApiKey::Placeholder => Self::PLACEHOLDER,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ApiKey::Placeholder)
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiKey::Configured(_) => f.write_str("ApiKey::Configured(<redacted>)"),
            ApiKey::Placeholder => f.write_str("ApiKey::Placeholder"),
        }
    }
}

/// Service for loading secret configuration.
///
/// Implementations must never log or embed secrets in error messages.
#[async_trait::async_trait]
pub trait SecretService: Send + Sync {
    /// Loads the secret configuration.
    async fn load_secrets(&self) -> Result<SecretConfig, String>;

    /// Resolves the Gemini credential, falling back to the placeholder.
    async fn resolve_api_key(&self) -> ApiKey;
}
