//! Assistant controller.
//!
//! Owns one user's session and all assistant state, and routes each
//! submission to chat streaming, image generation or image editing depending
//! on the active mode.
//!
//! # Concurrency
//!
//! Methods take `&self` and state sits behind a `tokio::sync::RwLock`. The lock
//! is never held across a backend call. At most one request is in flight per
//! controller: `awaiting_response` is checked and set under a single write
//! lock, and every state-changing method refuses to run while it is set.

use futures::StreamExt;
use joblink_core::AssistantError;
use joblink_core::assistant::{
    AssistantEvent, EditedImage, ImageReference, InteractionMode, SourceImage,
};
use joblink_core::backend::SessionHandle;
use joblink_core::session::{ChatSession, SessionManager, greeting};
use joblink_core::user::User;
use tokio::sync::RwLock;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::AssistantState;

pub const INVALID_IMAGE_MESSAGE: &str = "Please select a valid image file (e.g., PNG, JPG, WEBP).";

/// Result of [`AssistantController::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// A guard failed; nothing changed.
    Ignored,
    /// The streamed reply completed into the given transcript entry.
    Replied { message_id: Uuid },
    /// An image was produced (generated or edited).
    ImageReady(ImageReference),
    /// The request failed; the error is also in the state's error slot.
    Failed(AssistantError),
}

/// Outcome of staging a source image.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Staged,
    /// Outside image-edit mode or while busy.
    Ignored,
    /// Not an image; the previous staged image is kept.
    Rejected(AssistantError),
}

struct ControllerState {
    view: AssistantState,
    session: Option<ChatSession>,
}

/// Work captured under the lock when a submission is accepted.
enum PendingRequest {
    Chat {
        prompt: String,
        user_entry: Uuid,
        target: Uuid,
        session: Option<SessionHandle>,
    },
    Generate {
        prompt: String,
    },
    Edit {
        prompt: String,
        source: SourceImage,
    },
}

pub struct AssistantController {
    sessions: SessionManager,
    state: RwLock<ControllerState>,
    events: Option<UnboundedSender<AssistantEvent>>,
}

impl AssistantController {
    /// Creates a controller with no signed-in user.
    pub fn new(sessions: SessionManager) -> Self {
        Self {
            sessions,
            state: RwLock::new(ControllerState {
                view: AssistantState::default(),
                session: None,
            }),
            events: None,
        }
    }

    /// Publishes [`AssistantEvent`]s on `sender` from now on.
    pub fn with_events(mut self, sender: UnboundedSender<AssistantEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    fn emit(&self, event: AssistantEvent) {
        if let Some(events) = &self.events {
            // Receiver gone means nobody is rendering; state is still authoritative
            let _ = events.send(event);
        }
    }

    /// Detached copy of the current state.
    pub async fn snapshot(&self) -> AssistantState {
        self.state.read().await.view.clone()
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    /// Signs `user` in, replacing any previous user.
    ///
    /// The previous session and transcript are discarded, mode resets to chat
    /// and the transcript is seeded with the greeting. Returns `Ok(false)`
    /// without touching anything while a request is in flight.
    ///
    /// When the backend refuses to open a session the error lands in the error
    /// slot and is returned; the controller stays usable but chat submissions
    /// report `SessionNotInitialized`.
    pub async fn start_session(&self, user: User) -> Result<bool, AssistantError> {
        let (previous, greeting_id, greeting_text) = {
            let mut state = self.state.write().await;
            if state.view.awaiting_response {
                debug!(user = %user.name, "Ignoring user change while a request is in flight");
                return Ok(false);
            }

            let previous = state.session.take();
            state.view = AssistantState::for_user(user.clone());
            let text = greeting(&user);
            let id = state.view.transcript.push_assistant(text.clone());
            // Held busy until the new session exists
            state.view.awaiting_response = true;
            (previous, id, text)
        };

        self.emit(AssistantEvent::ModeChanged {
            mode: InteractionMode::Chat,
        });
        self.emit(AssistantEvent::AssistantMessage {
            id: greeting_id,
            text: greeting_text,
        });
        self.emit(AssistantEvent::BusyChanged {
            awaiting_response: true,
        });

        if let Some(previous) = previous {
            self.sessions.end_session(previous).await;
        }

        let created = self.sessions.create_session(&user).await;

        let mut state = self.state.write().await;
        state.view.awaiting_response = false;
        self.emit(AssistantEvent::BusyChanged {
            awaiting_response: false,
        });
        match created {
            Ok(session) => {
                state.view.session_id = Some(session.id().to_string());
                state.session = Some(session);
                Ok(true)
            }
            Err(error) => {
                warn!(user = %user.name, error = %error, "Assistant started without a session");
                state.view.error = Some(error.clone());
                drop(state);
                self.emit(AssistantEvent::Failed {
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    /// Signs the current user out, discarding the session and all state.
    ///
    /// Returns `false` while a request is in flight.
    pub async fn end_session(&self) -> bool {
        let previous = {
            let mut state = self.state.write().await;
            if state.view.awaiting_response {
                return false;
            }
            state.view = AssistantState::default();
            state.session.take()
        };

        if let Some(previous) = previous {
            self.sessions.end_session(previous).await;
        }
        true
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Switches mode and clears transient state. The transcript is kept.
    ///
    /// Switching to the active mode still clears. Rejected while busy.
    pub async fn set_mode(&self, mode: InteractionMode) -> bool {
        {
            let mut state = self.state.write().await;
            if state.view.awaiting_response {
                debug!(%mode, "Ignoring mode switch while a request is in flight");
                return false;
            }
            state.view.mode = mode;
            state.view.clear_transient();
        }
        debug!(%mode, "Interaction mode changed");
        self.emit(AssistantEvent::ModeChanged { mode });
        true
    }

    /// Replaces the prompt text. Ignored while busy.
    pub async fn set_prompt(&self, prompt: impl Into<String>) -> bool {
        let mut state = self.state.write().await;
        if state.view.awaiting_response {
            return false;
        }
        state.view.prompt = prompt.into();
        true
    }

    /// Stages the image an edit is applied to.
    pub async fn stage_source_image(&self, image: SourceImage) -> StageOutcome {
        let outcome = {
            let mut state = self.state.write().await;
            let view = &mut state.view;
            if view.awaiting_response || view.mode != InteractionMode::ImageEdit {
                return StageOutcome::Ignored;
            }

            if image.is_image() {
                debug!(name = %image.name, media_type = %image.media_type, bytes = image.len(), "Source image staged");
                view.source_image = Some(image);
                view.produced_image = None;
                view.error = None;
                StageOutcome::Staged
            } else {
                debug!(name = %image.name, media_type = %image.media_type, "Rejected non-image source");
                let error = AssistantError::invalid_input(INVALID_IMAGE_MESSAGE);
                view.error = Some(error.clone());
                StageOutcome::Rejected(error)
            }
        };

        if let StageOutcome::Rejected(error) = &outcome {
            self.emit(AssistantEvent::Failed {
                error: error.clone(),
            });
        }
        outcome
    }

    /// Clears the staged source image. Returns whether one was staged.
    pub async fn unstage_source_image(&self) -> bool {
        self.state.write().await.view.source_image.take().is_some()
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Submits the current prompt in the active mode.
    ///
    /// A no-op returning [`SubmitOutcome::Ignored`] when the prompt is blank,
    /// a request is already in flight, or image-edit mode has no staged image.
    pub async fn submit(&self) -> SubmitOutcome {
        let (request, mode) = {
            let mut state = self.state.write().await;
            let Some(request) = Self::begin_request(&mut state) else {
                return SubmitOutcome::Ignored;
            };
            (request, state.view.mode)
        };

        info!(%mode, "Submitting assistant request");
        self.emit(AssistantEvent::BusyChanged {
            awaiting_response: true,
        });

        let outcome = match request {
            PendingRequest::Chat {
                prompt,
                user_entry,
                target,
                session,
            } => {
                self.emit(AssistantEvent::UserMessage {
                    id: user_entry,
                    text: prompt.clone(),
                });
                self.run_chat(prompt, target, session).await
            }
            PendingRequest::Generate { prompt } => self.run_generate(prompt).await,
            PendingRequest::Edit { prompt, source } => self.run_edit(prompt, source).await,
        };

        if let SubmitOutcome::Failed(error) = &outcome {
            self.emit(AssistantEvent::Failed {
                error: error.clone(),
            });
        }
        self.emit(AssistantEvent::BusyChanged {
            awaiting_response: false,
        });
        outcome
    }

    /// Applies the guards and the entry-side state changes of a submission.
    fn begin_request(state: &mut ControllerState) -> Option<PendingRequest> {
        let view = &mut state.view;
        if view.awaiting_response || view.prompt.trim().is_empty() {
            return None;
        }

        let request = match view.mode {
            InteractionMode::Chat => {
                let prompt = std::mem::take(&mut view.prompt);
                let user_entry = view.transcript.push_user(prompt.clone());
                let target = view.transcript.push_assistant("");
                view.error = None;
                PendingRequest::Chat {
                    prompt,
                    user_entry,
                    target,
                    session: state.session.as_ref().map(|s| s.handle.clone()),
                }
            }
            InteractionMode::ImageGenerate => {
                view.produced_image = None;
                view.error = None;
                PendingRequest::Generate {
                    prompt: view.prompt.clone(),
                }
            }
            InteractionMode::ImageEdit => {
                let source = view.source_image.clone()?;
                view.produced_image = None;
                view.edit_explanation = None;
                view.error = None;
                PendingRequest::Edit {
                    prompt: view.prompt.clone(),
                    source,
                }
            }
        };

        view.awaiting_response = true;
        Some(request)
    }

    async fn run_chat(
        &self,
        prompt: String,
        target: Uuid,
        session: Option<SessionHandle>,
    ) -> SubmitOutcome {
        self.emit(AssistantEvent::StreamStarted { message_id: target });

        let Some(session) = session else {
            return self
                .fail_chat(target, AssistantError::SessionNotInitialized)
                .await;
        };

        let mut stream = match self.sessions.backend().stream_chat(&session, &prompt).await {
            Ok(stream) => stream,
            Err(error) => return self.fail_chat(target, error).await,
        };

        let mut fragments = 0usize;
        while let Some(item) = stream.next().await {
            let fragment = match item {
                Ok(fragment) => fragment,
                Err(error) => {
                    debug!(session_id = %session.id, fragments, "Chat stream failed mid-reply");
                    return self.fail_chat(target, error).await;
                }
            };

            let applied = self
                .state
                .write()
                .await
                .view
                .transcript
                .append_to(target, &fragment);
            if applied {
                fragments += 1;
                self.emit(AssistantEvent::StreamChunk {
                    message_id: target,
                    fragment,
                });
            } else {
                debug!(%target, "Dropping fragment for missing stream target");
            }
        }

        self.state.write().await.view.awaiting_response = false;
        info!(session_id = %session.id, fragments, "Chat reply completed");
        self.emit(AssistantEvent::StreamFinished { message_id: target });
        SubmitOutcome::Replied { message_id: target }
    }

    /// Keeps the partial reply and appends an apology after it.
    async fn fail_chat(&self, target: Uuid, error: AssistantError) -> SubmitOutcome {
        warn!(error = %error, "Chat request failed");
        let apology = format!("Sorry, something went wrong: {error}");
        let apology_id = {
            let mut state = self.state.write().await;
            let id = state.view.transcript.push_assistant(apology.clone());
            state.view.error = Some(error.clone());
            state.view.awaiting_response = false;
            id
        };

        self.emit(AssistantEvent::StreamFinished { message_id: target });
        self.emit(AssistantEvent::AssistantMessage {
            id: apology_id,
            text: apology,
        });
        SubmitOutcome::Failed(error)
    }

    async fn run_generate(&self, prompt: String) -> SubmitOutcome {
        let result = self.sessions.backend().generate_image(&prompt).await;

        let mut state = self.state.write().await;
        let view = &mut state.view;
        view.awaiting_response = false;
        view.prompt.clear();

        match result {
            Ok(image) => {
                info!(media_type = %image.media_type(), "Image generated");
                view.produced_image = Some(image.clone());
                drop(state);
                self.emit(AssistantEvent::ImageProduced {
                    image: image.clone(),
                    explanation: None,
                });
                SubmitOutcome::ImageReady(image)
            }
            Err(error) => {
                warn!(error = %error, "Image generation failed");
                view.produced_image = None;
                view.error = Some(error.clone());
                SubmitOutcome::Failed(error)
            }
        }
    }

    async fn run_edit(&self, prompt: String, source: SourceImage) -> SubmitOutcome {
        let result = self
            .sessions
            .backend()
            .edit_image(&source.bytes, &source.media_type, &prompt)
            .await;

        let mut state = self.state.write().await;
        let view = &mut state.view;
        view.awaiting_response = false;
        view.prompt.clear();

        match result {
            Ok(EditedImage { image, explanation }) => {
                info!(source = %source.name, has_explanation = explanation.is_some(), "Image edited");
                view.produced_image = Some(image.clone());
                view.edit_explanation = explanation.clone();
                drop(state);
                self.emit(AssistantEvent::ImageProduced {
                    image: image.clone(),
                    explanation,
                });
                SubmitOutcome::ImageReady(image)
            }
            Err(error) => {
                warn!(source = %source.name, error = %error, "Image edit failed");
                view.produced_image = None;
                view.edit_explanation = None;
                view.error = Some(error.clone());
                SubmitOutcome::Failed(error)
            }
        }
    }
}
