//! Observable state of one assistant controller.

use joblink_core::AssistantError;
use joblink_core::assistant::{ImageReference, InteractionMode, SourceImage, Transcript};
use joblink_core::user::User;

/// Everything a presentation layer needs to render the assistant.
///
/// Obtained through [`AssistantController::snapshot`](crate::AssistantController::snapshot);
/// the copy is detached, so later controller changes never show up in it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistantState {
    /// Identity the current session was started for
    pub user: Option<User>,
    /// Backend session id, absent when session creation failed or no user is signed in
    pub session_id: Option<String>,
    pub mode: InteractionMode,
    pub transcript: Transcript,
    pub prompt: String,
    pub awaiting_response: bool,
    /// Most recent failure; replaced, never accumulated
    pub error: Option<AssistantError>,
    pub produced_image: Option<ImageReference>,
    pub edit_explanation: Option<String>,
    pub source_image: Option<SourceImage>,
}

impl AssistantState {
    pub(crate) fn for_user(user: User) -> Self {
        Self {
            user: Some(user),
            ..Self::default()
        }
    }

    /// Whether the prompt input accepts text.
    ///
    /// Disabled while a request is in flight, and in image-edit mode until a
    /// source image is staged.
    pub fn input_enabled(&self) -> bool {
        !self.awaiting_response
            && !(self.mode.requires_source_image() && self.source_image.is_none())
    }

    /// Whether a submission would be accepted right now.
    pub fn can_submit(&self) -> bool {
        self.input_enabled() && !self.prompt.trim().is_empty()
    }

    pub fn placeholder(&self) -> &'static str {
        self.mode.placeholder()
    }

    pub fn has_session(&self) -> bool {
        self.session_id.is_some()
    }

    /// Drops everything tied to the previous mode or request.
    pub(crate) fn clear_transient(&mut self) {
        self.prompt.clear();
        self.error = None;
        self.produced_image = None;
        self.edit_explanation = None;
        self.source_image = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joblink_core::user::UserType;

    fn png() -> SourceImage {
        SourceImage::new("cat.png", "image/png", vec![1, 2, 3])
    }

    #[test]
    fn test_input_disabled_while_awaiting() {
        let mut state = AssistantState::for_user(User::demo(UserType::Student));
        state.prompt = "hi".to_string();
        assert!(state.can_submit());

        state.awaiting_response = true;
        assert!(!state.input_enabled());
        assert!(!state.can_submit());
    }

    #[test]
    fn test_edit_mode_needs_source_image() {
        let mut state = AssistantState {
            mode: InteractionMode::ImageEdit,
            prompt: "add a hat".to_string(),
            ..AssistantState::default()
        };
        assert!(!state.input_enabled());

        state.source_image = Some(png());
        assert!(state.can_submit());
    }

    #[test]
    fn test_whitespace_prompt_cannot_submit() {
        let state = AssistantState {
            prompt: "  \n\t".to_string(),
            ..AssistantState::default()
        };
        assert!(state.input_enabled());
        assert!(!state.can_submit());
    }

    #[test]
    fn test_clear_transient_keeps_transcript() {
        let mut state = AssistantState::default();
        state.transcript.push_user("hello");
        state.prompt = "draft".to_string();
        state.error = Some(AssistantError::backend("boom"));
        state.edit_explanation = Some("added a hat".to_string());
        state.source_image = Some(png());

        state.clear_transient();

        assert_eq!(state.transcript.len(), 1);
        assert!(state.prompt.is_empty());
        assert!(state.error.is_none());
        assert!(state.edit_explanation.is_none());
        assert!(state.source_image.is_none());
        assert_eq!(state.placeholder(), "Ask me anything...");
    }
}
