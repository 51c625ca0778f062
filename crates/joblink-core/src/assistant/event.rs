use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ImageReference, InteractionMode};
use crate::error::AssistantError;

/// Notifications the controller publishes while it changes state.
///
/// A presentation layer subscribes to these to render streaming text as it
/// arrives instead of polling snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantEvent {
    ModeChanged {
        mode: InteractionMode,
    },
    /// The in-flight flag flipped.
    BusyChanged {
        awaiting_response: bool,
    },
    UserMessage {
        id: Uuid,
        text: String,
    },
    /// A complete assistant entry was appended (greeting, apology).
    AssistantMessage {
        id: Uuid,
        text: String,
    },
    /// An empty assistant entry was appended and is now the stream target.
    StreamStarted {
        message_id: Uuid,
    },
    StreamChunk {
        message_id: Uuid,
        fragment: String,
    },
    StreamFinished {
        message_id: Uuid,
    },
    ImageProduced {
        image: ImageReference,
        #[serde(default)]
        explanation: Option<String>,
    },
    Failed {
        error: AssistantError,
    },
}
