//! GeminiBackend - Direct REST API implementation for Gemini.
//!
//! Chat sessions live client-side: the REST API is stateless, so each session
//! keeps its system instruction and turn history here and the full history is
//! sent with every streamed turn.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use futures::StreamExt;
use futures::stream::BoxStream;
use joblink_core::AssistantError;
use joblink_core::assistant::{EditedImage, ImageReference};
use joblink_core::backend::{GenerativeBackend, SessionHandle, TextStream};
use joblink_core::config::GeminiSettings;
use joblink_core::secret::ApiKey;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use crate::gemini_types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
    PredictRequest, PredictResponse, extract_edited_image, extract_generated_image,
    map_http_error, parse_stream_event,
};
use crate::sse::SseDecoder;

const API_KEY_HEADER: &str = "x-goog-api-key";
const GENERATE_FAILED: &str = "Failed to generate image. Please try again.";

#[derive(Debug, Clone)]
struct SessionState {
    system_instruction: Arc<str>,
    history: Vec<Content>,
}

type SessionMap = Arc<RwLock<HashMap<String, SessionState>>>;

/// Backend implementation that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    api_key: ApiKey,
    settings: GeminiSettings,
    sessions: SessionMap,
}

impl GeminiBackend {
    /// Creates a backend with the provided credential and settings.
    ///
    /// A placeholder credential is accepted; every request will then fail
    /// with the service's authentication error instead of crashing here.
    pub fn new(api_key: ApiKey, settings: GeminiSettings) -> Self {
        if api_key.is_placeholder() {
            warn!("Gemini backend created without an API key; AI features will not work");
        }
        Self {
            client: Client::new(),
            api_key,
            settings,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{model}:{method}",
            self.settings.api_base.trim_end_matches('/')
        )
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.settings.request_timeout_secs.max(1))
    }

    /// POSTs `body` and decodes a JSON response, mapping every failure.
    async fn post_json<B, R>(&self, url: String, body: &B) -> Result<R, AssistantError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .timeout(self.timeout())
            .json(body)
            .send()
            .await
            .map_err(|err| AssistantError::backend(format!("Gemini API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        response
            .json()
            .await
            .map_err(|err| AssistantError::backend(format!("Failed to parse Gemini response: {err}")))
    }

    async fn open_chat_stream(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<BoxStream<'static, Result<Vec<u8>, AssistantError>>, AssistantError> {
        let url = format!(
            "{}?alt=sse",
            self.endpoint(&self.settings.chat_model, "streamGenerateContent")
        );

        let send = self
            .client
            .post(url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(request)
            .send();

        let response = tokio::time::timeout(self.timeout(), send)
            .await
            .map_err(|_| AssistantError::backend("Gemini API request timed out"))?
            .map_err(|err| AssistantError::backend(format!("Gemini API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| {
                chunk.map(|bytes| bytes.to_vec()).map_err(|err| {
                    AssistantError::backend(format!("Gemini stream interrupted: {err}"))
                })
            })
            .boxed())
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn create_session(
        &self,
        system_instruction: &str,
    ) -> Result<SessionHandle, AssistantError> {
        let handle = SessionHandle::new(uuid::Uuid::new_v4().to_string(), system_instruction);
        self.sessions.write().await.insert(
            handle.id.clone(),
            SessionState {
                system_instruction: Arc::clone(&handle.system_instruction),
                history: Vec::new(),
            },
        );
        debug!(session_id = %handle.id, model = %self.settings.chat_model, "Gemini chat session created");
        Ok(handle)
    }

    async fn stream_chat(
        &self,
        session: &SessionHandle,
        message: &str,
    ) -> Result<TextStream, AssistantError> {
        let state = self
            .sessions
            .read()
            .await
            .get(&session.id)
            .cloned()
            .ok_or_else(|| AssistantError::backend("Chat session is no longer available."))?;

        let user_turn = Content::user_text(message);
        let mut contents = state.history;
        contents.push(user_turn.clone());

        let request = GenerateContentRequest {
            contents,
            system_instruction: Some(Content::instruction(&*state.system_instruction)),
            generation_config: None,
        };

        debug!(session_id = %session.id, turns = request.contents.len(), "Streaming Gemini chat turn");
        let bytes = self.open_chat_stream(&request).await?;

        let stream = ChatStream {
            bytes,
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            reply: String::new(),
            finished: false,
            failed: false,
            deferred: None,
            commit: Some(TurnCommit {
                sessions: Arc::clone(&self.sessions),
                session_id: session.id.clone(),
                user_turn,
            }),
        };

        Ok(futures::stream::unfold(stream, |mut stream| async move {
            stream.next_fragment().await.map(|item| (item, stream))
        })
        .boxed())
    }

    async fn generate_image(&self, prompt: &str) -> Result<ImageReference, AssistantError> {
        let url = self.endpoint(&self.settings.image_model, "predict");
        let request = PredictRequest::single_jpeg(prompt);

        let result = match self.post_json::<_, PredictResponse>(url, &request).await {
            Ok(response) => extract_generated_image(response),
            Err(err) => Err(err),
        };

        result.map_err(|err| {
            error!(model = %self.settings.image_model, error = %err, "Error generating image");
            AssistantError::backend(GENERATE_FAILED)
        })
    }

    async fn edit_image(
        &self,
        image_bytes: &[u8],
        media_type: &str,
        instruction: &str,
    ) -> Result<EditedImage, AssistantError> {
        let url = self.endpoint(&self.settings.edit_model, "generateContent");
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: media_type.to_string(),
                            data: BASE64_STANDARD.encode(image_bytes),
                        },
                    },
                    Part::Text {
                        text: instruction.to_string(),
                    },
                ],
            }],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            }),
        };

        let response: GenerateContentResponse = self
            .post_json(url, &request)
            .await
            .inspect_err(|err| error!(model = %self.settings.edit_model, error = %err, "Error editing image"))?;
        extract_edited_image(response)
    }

    async fn close_session(&self, session: &SessionHandle) {
        if self.sessions.write().await.remove(&session.id).is_some() {
            debug!(session_id = %session.id, "Gemini chat session closed");
        }
    }
}

/// Records a finished turn in the session history.
struct TurnCommit {
    sessions: SessionMap,
    session_id: String,
    user_turn: Content,
}

impl TurnCommit {
    async fn apply(self, reply: String) {
        let mut sessions = self.sessions.write().await;
        // A session closed mid-stream simply loses the turn
        if let Some(state) = sessions.get_mut(&self.session_id) {
            state.history.push(self.user_turn);
            state.history.push(Content::model_text(reply));
        }
    }
}

/// Turns the SSE byte stream into reply fragments.
///
/// The turn is only written to history once the body ends cleanly, so a
/// failed turn never leaves a dangling user message behind.
struct ChatStream {
    bytes: BoxStream<'static, Result<Vec<u8>, AssistantError>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    reply: String,
    finished: bool,
    failed: bool,
    /// Error held back until the fragments decoded before it are yielded
    deferred: Option<AssistantError>,
    commit: Option<TurnCommit>,
}

impl ChatStream {
    async fn next_fragment(&mut self) -> Option<Result<String, AssistantError>> {
        loop {
            if let Some(fragment) = self.pending.pop_front() {
                self.reply.push_str(&fragment);
                return Some(Ok(fragment));
            }
            if let Some(err) = self.deferred.take() {
                self.failed = true;
                return Some(Err(err));
            }
            if self.failed {
                return None;
            }
            if self.finished {
                if let Some(commit) = self.commit.take() {
                    commit.apply(std::mem::take(&mut self.reply)).await;
                }
                return None;
            }

            let events = match self.bytes.next().await {
                Some(Ok(chunk)) => self.decoder.push(&chunk),
                Some(Err(err)) => {
                    self.fail(err);
                    continue;
                }
                None => {
                    self.finished = true;
                    self.decoder.finish()
                }
            };

            for payload in events {
                match parse_stream_event(&payload) {
                    Ok(Some(fragment)) => self.pending.push_back(fragment),
                    Ok(None) => {}
                    Err(err) => {
                        // events after an error are dropped
                        self.fail(err);
                        break;
                    }
                }
            }
        }
    }

    /// Stops reading and drops the commit. Fragments already decoded are
    /// still yielded before the error.
    fn fail(&mut self, err: AssistantError) {
        self.deferred = Some(err);
        self.commit = None;
    }
}
