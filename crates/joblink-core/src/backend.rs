//! Contract of the generative-AI service the assistant talks to.
//!
//! The service owns the wire format. This trait only fixes what goes in and
//! what comes out, so the controller can be driven by the real HTTP client or
//! by a scripted double in tests.

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;

use crate::assistant::{EditedImage, ImageReference};
use crate::error::AssistantError;

/// Lazily produced, finite sequence of reply fragments for one chat turn.
pub type TextStream = BoxStream<'static, Result<String, AssistantError>>;

/// Opaque handle to a conversational session held by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    /// Backend-issued identifier (UUID format)
    pub id: String,
    /// System instruction the session was created with
    pub system_instruction: Arc<str>,
}

impl SessionHandle {
    pub fn new(id: impl Into<String>, system_instruction: impl Into<Arc<str>>) -> Self {
        Self {
            id: id.into(),
            system_instruction: system_instruction.into(),
        }
    }
}

/// A generative-AI service providing chat, image generation and image editing.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Opens a session scoped by `system_instruction`.
    async fn create_session(&self, system_instruction: &str)
    -> Result<SessionHandle, AssistantError>;

    /// Sends one user turn and returns the streamed reply.
    ///
    /// Each call starts a new turn appended to the session's history. The
    /// returned stream is not restartable.
    async fn stream_chat(
        &self,
        session: &SessionHandle,
        message: &str,
    ) -> Result<TextStream, AssistantError>;

    /// Generates one image from a description.
    ///
    /// Fails with `BackendRequestFailed` when the service returns no image.
    async fn generate_image(&self, prompt: &str) -> Result<ImageReference, AssistantError>;

    /// Applies `instruction` to the given image.
    async fn edit_image(
        &self,
        image_bytes: &[u8],
        media_type: &str,
        instruction: &str,
    ) -> Result<EditedImage, AssistantError>;

    /// Drops any server-side state kept for the session.
    async fn close_session(&self, _session: &SessionHandle) {}
}
