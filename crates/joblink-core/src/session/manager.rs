use std::sync::Arc;

use tracing::{debug, info, warn};

use super::instruction::system_instruction;
use crate::backend::{GenerativeBackend, SessionHandle};
use crate::error::AssistantError;
use crate::user::User;

/// A backend session bound to exactly one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    pub handle: SessionHandle,
    pub user: User,
    /// Timestamp when the session was created (ISO 8601 format)
    pub created_at: String,
}

impl ChatSession {
    pub fn id(&self) -> &str {
        &self.handle.id
    }
}

/// Creates and tears down per-user assistant sessions.
///
/// The backend client is passed in explicitly; the manager keeps no state of
/// its own beyond that reference, so one manager can serve any number of
/// controllers.
#[derive(Clone)]
pub struct SessionManager {
    backend: Arc<dyn GenerativeBackend>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }

    /// The backend sessions are created against.
    pub fn backend(&self) -> Arc<dyn GenerativeBackend> {
        Arc::clone(&self.backend)
    }

    /// Creates a session scoped by the system instruction for `user`.
    ///
    /// No retries. A failure here means the caller has no session, and every
    /// later chat send reports `SessionNotInitialized`.
    pub async fn create_session(&self, user: &User) -> Result<ChatSession, AssistantError> {
        let instruction = system_instruction(user);
        debug!(user = %user.name, role = %user.user_type, "Creating assistant session");

        let handle = self
            .backend
            .create_session(&instruction)
            .await
            .inspect_err(|e| warn!(user = %user.name, error = %e, "Session creation failed"))?;

        info!(session_id = %handle.id, user = %user.name, "Assistant session created");
        Ok(ChatSession {
            handle,
            user: user.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Discards a session. Called on logout or user change.
    pub async fn end_session(&self, session: ChatSession) {
        info!(session_id = %session.id(), user = %session.user.name, "Assistant session ended");
        self.backend.close_session(&session.handle).await;
    }
}
