use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use joblink_application::{AssistantController, StageOutcome, SubmitOutcome};
use joblink_core::AssistantError;
use joblink_core::assistant::{
    AssistantEvent, EditedImage, ImageReference, InteractionMode, MessageSender, SourceImage,
};
use joblink_core::backend::{GenerativeBackend, SessionHandle, TextStream};
use joblink_core::session::SessionManager;
use joblink_core::user::{User, UserType};
use tokio::sync::{Notify, mpsc};

type Fragments = Vec<Result<String, AssistantError>>;

/// Scripted backend. Replies are consumed in order; an optional gate holds
/// every call until the test releases it.
#[derive(Default)]
struct MockBackend {
    refuse_sessions: bool,
    chat_replies: Mutex<VecDeque<Result<Fragments, AssistantError>>>,
    image_results: Mutex<VecDeque<Result<ImageReference, AssistantError>>>,
    edit_results: Mutex<VecDeque<Result<EditedImage, AssistantError>>>,
    chat_messages: Mutex<Vec<String>>,
    edit_requests: Mutex<Vec<(Vec<u8>, String, String)>>,
    closed: Mutex<Vec<String>>,
    sessions_opened: Mutex<usize>,
    gate: Option<Arc<Notify>>,
    entered: Arc<Notify>,
}

impl MockBackend {
    fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let backend = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (backend, gate)
    }

    fn reply(self, fragments: &[&str]) -> Self {
        self.chat_replies
            .lock()
            .unwrap()
            .push_back(Ok(fragments.iter().map(|f| Ok(f.to_string())).collect()));
        self
    }

    fn reply_with(self, fragments: Fragments) -> Self {
        self.chat_replies.lock().unwrap().push_back(Ok(fragments));
        self
    }

    fn image(self, result: Result<ImageReference, AssistantError>) -> Self {
        self.image_results.lock().unwrap().push_back(result);
        self
    }

    fn edit(self, result: Result<EditedImage, AssistantError>) -> Self {
        self.edit_results.lock().unwrap().push_back(result);
        self
    }

    async fn pass_gate(&self) {
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl GenerativeBackend for MockBackend {
    async fn create_session(
        &self,
        system_instruction: &str,
    ) -> Result<SessionHandle, AssistantError> {
        if self.refuse_sessions {
            return Err(AssistantError::backend("API key not valid"));
        }
        let mut opened = self.sessions_opened.lock().unwrap();
        *opened += 1;
        Ok(SessionHandle::new(
            format!("session-{opened}"),
            system_instruction,
        ))
    }

    async fn stream_chat(
        &self,
        _session: &SessionHandle,
        message: &str,
    ) -> Result<TextStream, AssistantError> {
        self.chat_messages.lock().unwrap().push(message.to_string());
        self.pass_gate().await;
        let reply = self
            .chat_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))?;
        Ok(futures::stream::iter(reply).boxed())
    }

    async fn generate_image(&self, _prompt: &str) -> Result<ImageReference, AssistantError> {
        self.pass_gate().await;
        self.image_results
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted generate_image call")
    }

    async fn edit_image(
        &self,
        image_bytes: &[u8],
        media_type: &str,
        instruction: &str,
    ) -> Result<EditedImage, AssistantError> {
        self.edit_requests.lock().unwrap().push((
            image_bytes.to_vec(),
            media_type.to_string(),
            instruction.to_string(),
        ));
        self.pass_gate().await;
        self.edit_results
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted edit_image call")
    }

    async fn close_session(&self, session: &SessionHandle) {
        self.closed.lock().unwrap().push(session.id.clone());
    }
}

fn alex() -> User {
    User::new("Alex", "alex@university.edu", UserType::Student)
}

fn jpeg() -> ImageReference {
    ImageReference::from_base64("image/jpeg", "/9j/4AAQ")
}

fn png_source() -> SourceImage {
    SourceImage::new("cat.png", "image/png", vec![0x89, b'P', b'N', b'G'])
}

async fn controller_for(backend: MockBackend) -> (Arc<AssistantController>, Arc<MockBackend>) {
    let backend = Arc::new(backend);
    let dyn_backend: Arc<dyn GenerativeBackend> = Arc::clone(&backend) as _;
    let controller = AssistantController::new(SessionManager::new(dyn_backend));
    controller.start_session(alex()).await.unwrap();
    (Arc::new(controller), backend)
}

async fn send(controller: &AssistantController, prompt: &str) -> SubmitOutcome {
    controller.set_prompt(prompt).await;
    controller.submit().await
}

#[tokio::test]
async fn test_session_start_seeds_greeting() {
    let (controller, _) = controller_for(MockBackend::default()).await;
    let state = controller.snapshot().await;

    assert_eq!(state.transcript.len(), 1);
    let greeting = &state.transcript.messages()[0];
    assert_eq!(greeting.sender, MessageSender::Assistant);
    assert!(greeting.text.starts_with("Hello Alex! I'm your AI assistant."));
    assert_eq!(state.session_id.as_deref(), Some("session-1"));
    assert_eq!(state.mode, InteractionMode::Chat);
}

#[tokio::test]
async fn test_chat_scenario_awaits_then_streams_reply() {
    let (backend, gate) = MockBackend::gated();
    let (controller, backend) = controller_for(backend.reply(&["Hel", "lo!"])).await;

    controller.set_prompt("How do I apply?").await;
    let task = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit().await })
    };

    backend.entered.notified().await;
    let during = controller.snapshot().await;
    assert!(during.awaiting_response);
    assert!(during.prompt.is_empty());
    assert_eq!(during.transcript.len(), 3);
    assert_eq!(during.transcript.messages()[2].text, "");

    gate.notify_one();
    let outcome = task.await.unwrap();

    let after = controller.snapshot().await;
    assert!(!after.awaiting_response);
    let messages = after.transcript.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].sender, MessageSender::User);
    assert_eq!(messages[1].text, "How do I apply?");
    assert_eq!(messages[2].sender, MessageSender::Assistant);
    assert_eq!(messages[2].text, "Hello!");
    assert_eq!(
        outcome,
        SubmitOutcome::Replied {
            message_id: messages[2].id
        }
    );
    assert_eq!(*backend.chat_messages.lock().unwrap(), vec!["How do I apply?"]);
    assert!(after.error.is_none());
}

#[tokio::test]
async fn test_transcript_grows_by_two_per_chat_turn() {
    let backend = MockBackend::default()
        .reply(&["one"])
        .reply(&["two"])
        .reply(&["three"]);
    let (controller, _) = controller_for(backend).await;

    for prompt in ["first", "second", "third"] {
        send(&controller, prompt).await;
    }

    let state = controller.snapshot().await;
    assert_eq!(state.transcript.len(), 1 + 2 * 3);
    let texts: Vec<&str> = state.transcript.iter().skip(1).map(|m| m.text.as_str()).collect();
    assert_eq!(texts, ["first", "one", "second", "two", "third", "three"]);
}

#[tokio::test]
async fn test_blank_prompt_is_noop() {
    let (controller, backend) = controller_for(MockBackend::default()).await;
    let before = controller.snapshot().await;

    assert_eq!(send(&controller, "   \n").await, SubmitOutcome::Ignored);

    let after = controller.snapshot().await;
    assert_eq!(after.transcript, before.transcript);
    assert!(after.error.is_none());
    assert!(!after.awaiting_response);
    assert!(backend.chat_messages.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_mode_switch_clears_transient_state_but_not_transcript() {
    let backend = MockBackend::default()
        .reply(&["hi"])
        .image(Err(AssistantError::backend("Failed to generate image. Please try again.")));
    let (controller, _) = controller_for(backend).await;
    send(&controller, "hello").await;

    controller.set_mode(InteractionMode::ImageGenerate).await;
    send(&controller, "a cat").await;
    controller.set_prompt("draft").await;
    let before = controller.snapshot().await;
    assert!(before.error.is_some());

    assert!(controller.set_mode(InteractionMode::ImageEdit).await);
    controller.stage_source_image(png_source()).await;
    controller.set_prompt("edit draft").await;
    assert!(controller.set_mode(InteractionMode::ImageEdit).await);

    let after = controller.snapshot().await;
    assert_eq!(after.mode, InteractionMode::ImageEdit);
    assert!(after.prompt.is_empty());
    assert!(after.error.is_none());
    assert!(after.produced_image.is_none());
    assert!(after.edit_explanation.is_none());
    assert!(after.source_image.is_none());
    assert_eq!(after.transcript.len(), before.transcript.len());
}

#[tokio::test]
async fn test_edit_without_source_is_noop() {
    let (controller, backend) = controller_for(MockBackend::default()).await;
    controller.set_mode(InteractionMode::ImageEdit).await;

    assert_eq!(send(&controller, "add a hat").await, SubmitOutcome::Ignored);

    let state = controller.snapshot().await;
    assert!(!state.input_enabled());
    assert!(!state.awaiting_response);
    assert!(backend.edit_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_staging_non_image_keeps_previous_source() {
    let (controller, _) = controller_for(MockBackend::default()).await;
    controller.set_mode(InteractionMode::ImageEdit).await;
    assert_eq!(
        controller.stage_source_image(png_source()).await,
        StageOutcome::Staged
    );

    let resume = SourceImage::new("resume.pdf", "application/pdf", b"%PDF".to_vec());
    let outcome = controller.stage_source_image(resume).await;

    let expected = AssistantError::invalid_input(
        "Please select a valid image file (e.g., PNG, JPG, WEBP).",
    );
    assert_eq!(outcome, StageOutcome::Rejected(expected.clone()));
    let state = controller.snapshot().await;
    assert_eq!(state.source_image.map(|s| s.name), Some("cat.png".to_string()));
    assert_eq!(state.error, Some(expected));
}

#[tokio::test]
async fn test_staging_outside_edit_mode_is_ignored() {
    let (controller, _) = controller_for(MockBackend::default()).await;

    assert_eq!(
        controller.stage_source_image(png_source()).await,
        StageOutcome::Ignored
    );
    assert!(controller.snapshot().await.source_image.is_none());
}

#[tokio::test]
async fn test_unstage_clears_only_source() {
    let (controller, _) = controller_for(MockBackend::default()).await;
    controller.set_mode(InteractionMode::ImageEdit).await;
    controller.stage_source_image(png_source()).await;
    controller.set_prompt("add a hat").await;
    let before = controller.snapshot().await;

    assert!(controller.unstage_source_image().await);

    let after = controller.snapshot().await;
    assert!(after.source_image.is_none());
    assert_eq!(after.mode, InteractionMode::ImageEdit);
    assert_eq!(after.prompt, "add a hat");
    assert_eq!(after.transcript, before.transcript);
    assert!(!after.input_enabled());
    assert!(!controller.unstage_source_image().await);
}

#[tokio::test]
async fn test_staging_image_clears_previous_output_and_error() {
    let backend = MockBackend::default()
        .edit(Ok(EditedImage {
            image: ImageReference::from_base64("image/png", "AAAA"),
            explanation: None,
        }))
        .edit(Err(AssistantError::backend(
            "The model did not return an edited image.",
        )));
    let (controller, _) = controller_for(backend).await;
    controller.set_mode(InteractionMode::ImageEdit).await;
    controller.stage_source_image(png_source()).await;

    send(&controller, "add a hat").await;
    assert!(controller.snapshot().await.produced_image.is_some());
    let dog = SourceImage::new("dog.jpg", "image/jpeg", vec![0xFF, 0xD8]);
    assert_eq!(
        controller.stage_source_image(dog).await,
        StageOutcome::Staged
    );
    let state = controller.snapshot().await;
    assert!(state.produced_image.is_none());
    assert!(state.error.is_none());

    send(&controller, "now a scarf").await;
    assert!(controller.snapshot().await.error.is_some());
    assert_eq!(
        controller.stage_source_image(png_source()).await,
        StageOutcome::Staged
    );
    let state = controller.snapshot().await;
    assert!(state.produced_image.is_none());
    assert!(state.error.is_none());
    assert_eq!(state.source_image.map(|s| s.name), Some("cat.png".to_string()));
}

#[tokio::test]
async fn test_generation_failure_then_success() {
    let backend = MockBackend::default()
        .image(Err(AssistantError::backend("Failed to generate image. Please try again.")))
        .image(Ok(jpeg()));
    let (controller, _) = controller_for(backend).await;
    controller.set_mode(InteractionMode::ImageGenerate).await;

    let failed = send(&controller, "a cat in a spacesuit").await;
    let state = controller.snapshot().await;
    assert!(matches!(failed, SubmitOutcome::Failed(ref e) if e.is_backend()));
    assert!(state.produced_image.is_none());
    assert!(state.error.as_ref().is_some_and(|e| e.is_backend()));
    assert!(state.prompt.is_empty());
    assert_eq!(state.transcript.len(), 1);

    let produced = send(&controller, "a cat in a spacesuit").await;
    let state = controller.snapshot().await;
    assert_eq!(produced, SubmitOutcome::ImageReady(jpeg()));
    assert_eq!(state.produced_image, Some(jpeg()));
    assert!(state.error.is_none());
    assert!(!state.awaiting_response);
}

#[tokio::test]
async fn test_mid_stream_failure_keeps_partial_and_apologizes() {
    let backend = MockBackend::default().reply_with(vec![
        Ok("You can ".to_string()),
        Err(AssistantError::backend("connection reset")),
    ]);
    let (controller, _) = controller_for(backend).await;

    let outcome = send(&controller, "How do I post a job?").await;

    assert_eq!(
        outcome,
        SubmitOutcome::Failed(AssistantError::backend("connection reset"))
    );
    let state = controller.snapshot().await;
    let texts: Vec<&str> = state.transcript.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(
        &texts[1..],
        [
            "How do I post a job?",
            "You can ",
            "Sorry, something went wrong: connection reset"
        ]
    );
    assert_eq!(state.error, Some(AssistantError::backend("connection reset")));
    assert!(!state.awaiting_response);
}

#[tokio::test]
async fn test_chat_without_session_reports_not_initialized() {
    let backend = Arc::new(MockBackend {
        refuse_sessions: true,
        ..MockBackend::default()
    });
    let dyn_backend: Arc<dyn GenerativeBackend> = Arc::clone(&backend) as _;
    let controller = AssistantController::new(SessionManager::new(dyn_backend));

    let started = controller.start_session(alex()).await;
    assert_eq!(started, Err(AssistantError::backend("API key not valid")));
    assert!(!controller.snapshot().await.has_session());

    let outcome = send(&controller, "hello").await;

    assert_eq!(
        outcome,
        SubmitOutcome::Failed(AssistantError::SessionNotInitialized)
    );
    let state = controller.snapshot().await;
    assert_eq!(state.error, Some(AssistantError::SessionNotInitialized));
    assert_eq!(
        state.transcript.last().map(|m| m.text.as_str()),
        Some("Sorry, something went wrong: Chat session not initialized.")
    );
    assert!(backend.chat_messages.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_in_flight_request_blocks_submit_and_mode_switch() {
    let (backend, gate) = MockBackend::gated();
    let (controller, backend) = controller_for(backend.image(Ok(jpeg()))).await;
    controller.set_mode(InteractionMode::ImageGenerate).await;
    controller.set_prompt("a lighthouse").await;

    let task = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit().await })
    };
    backend.entered.notified().await;

    assert_eq!(controller.submit().await, SubmitOutcome::Ignored);
    assert!(!controller.set_mode(InteractionMode::Chat).await);
    assert!(!controller.set_prompt("something else").await);
    assert_eq!(controller.start_session(alex()).await, Ok(false));
    let during = controller.snapshot().await;
    assert_eq!(during.mode, InteractionMode::ImageGenerate);
    assert_eq!(during.prompt, "a lighthouse");

    gate.notify_one();
    assert_eq!(task.await.unwrap(), SubmitOutcome::ImageReady(jpeg()));
    assert!(controller.snapshot().await.prompt.is_empty());
}

#[tokio::test]
async fn test_edit_success_keeps_source_staged() {
    let backend = MockBackend::default().edit(Ok(EditedImage {
        image: ImageReference::from_base64("image/png", "AAAA"),
        explanation: Some("Added a party hat.".to_string()),
    }));
    let (controller, backend) = controller_for(backend).await;
    controller.set_mode(InteractionMode::ImageEdit).await;
    controller.stage_source_image(png_source()).await;

    let outcome = send(&controller, "make the cat wear a party hat").await;

    assert!(matches!(outcome, SubmitOutcome::ImageReady(_)));
    let state = controller.snapshot().await;
    assert_eq!(state.edit_explanation.as_deref(), Some("Added a party hat."));
    assert_eq!(
        state.produced_image.as_ref().map(|i| i.media_type()),
        Some("image/png")
    );
    assert!(state.source_image.is_some());
    assert!(state.prompt.is_empty());

    let requests = backend.edit_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, vec![0x89, b'P', b'N', b'G']);
    assert_eq!(requests[0].1, "image/png");
    assert_eq!(requests[0].2, "make the cat wear a party hat");
}

#[tokio::test]
async fn test_edit_failure_clears_stale_output() {
    let backend = MockBackend::default()
        .edit(Ok(EditedImage {
            image: ImageReference::from_base64("image/png", "AAAA"),
            explanation: Some("Done.".to_string()),
        }))
        .edit(Err(AssistantError::backend(
            "The model did not return an edited image.",
        )));
    let (controller, _) = controller_for(backend).await;
    controller.set_mode(InteractionMode::ImageEdit).await;
    controller.stage_source_image(png_source()).await;
    send(&controller, "add a hat").await;

    send(&controller, "now a scarf").await;

    let state = controller.snapshot().await;
    assert!(state.produced_image.is_none());
    assert!(state.edit_explanation.is_none());
    assert_eq!(
        state.error.map(|e| e.to_string()),
        Some("The model did not return an edited image.".to_string())
    );
}

#[tokio::test]
async fn test_change_user_replaces_session_and_transcript() {
    let (controller, backend) = controller_for(MockBackend::default().reply(&["ok"])).await;
    send(&controller, "hello").await;
    controller.set_mode(InteractionMode::ImageGenerate).await;

    let company = User::demo(UserType::Company);
    assert_eq!(controller.start_session(company.clone()).await, Ok(true));

    let state = controller.snapshot().await;
    assert_eq!(state.user, Some(company));
    assert_eq!(state.mode, InteractionMode::Chat);
    assert_eq!(state.transcript.len(), 1);
    assert!(state.transcript.messages()[0].text.starts_with("Hello Rehan Khan!"));
    assert_eq!(state.session_id.as_deref(), Some("session-2"));
    assert_eq!(*backend.closed.lock().unwrap(), vec!["session-1"]);
}

#[tokio::test]
async fn test_end_session_discards_everything() {
    let (controller, backend) = controller_for(MockBackend::default()).await;

    assert!(controller.end_session().await);

    let state = controller.snapshot().await;
    assert!(state.user.is_none());
    assert!(state.transcript.is_empty());
    assert!(!state.has_session());
    assert_eq!(*backend.closed.lock().unwrap(), vec!["session-1"]);
}

#[tokio::test]
async fn test_events_follow_the_stream() {
    let backend = Arc::new(MockBackend::default().reply(&["Hel", "lo!"]));
    let dyn_backend: Arc<dyn GenerativeBackend> = Arc::clone(&backend) as _;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let controller = AssistantController::new(SessionManager::new(dyn_backend)).with_events(tx);
    controller.start_session(alex()).await.unwrap();
    while rx.try_recv().is_ok() {}

    send(&controller, "hi").await;

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    let target = controller.snapshot().await.transcript.messages()[2].id;
    let fragments: Vec<&str> = events
        .iter()
        .filter_map(|event| match event {
            AssistantEvent::StreamChunk {
                message_id,
                fragment,
            } if *message_id == target => Some(fragment.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(fragments, ["Hel", "lo!"]);
    assert!(matches!(
        events.first(),
        Some(AssistantEvent::BusyChanged {
            awaiting_response: true
        })
    ));
    assert!(matches!(
        events.last(),
        Some(AssistantEvent::BusyChanged {
            awaiting_response: false
        })
    ));
}

#[tokio::test]
async fn test_session_start_reports_busy_while_creating() {
    let backend: Arc<dyn GenerativeBackend> = Arc::new(MockBackend::default());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let controller = AssistantController::new(SessionManager::new(backend)).with_events(tx);

    controller.start_session(alex()).await.unwrap();

    let mut busy = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let AssistantEvent::BusyChanged { awaiting_response } = event {
            busy.push(awaiting_response);
        }
    }
    assert_eq!(busy, [true, false]);
    assert!(!controller.snapshot().await.awaiting_response);
}
