//! Transcript entries.
//!
//! The transcript is append-only. The only in-place mutation is growing the
//! text of the assistant entry a stream was started for, addressed by id.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    User,
    Assistant,
}

/// A single entry in the assistant transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Stable identity, used to address the entry a stream writes into
    pub id: Uuid,
    pub sender: MessageSender,
    pub text: String,
    /// Timestamp when the entry was created (ISO 8601 format)
    pub timestamp: String,
}

impl Message {
    fn new(sender: MessageSender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.sender == MessageSender::Assistant
    }
}

/// Ordered conversation record for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a user entry and returns its id.
    pub fn push_user(&mut self, text: impl Into<String>) -> Uuid {
        self.push(Message::new(MessageSender::User, text))
    }

    /// Appends an assistant entry and returns its id.
    pub fn push_assistant(&mut self, text: impl Into<String>) -> Uuid {
        self.push(Message::new(MessageSender::Assistant, text))
    }

    fn push(&mut self, message: Message) -> Uuid {
        let id = message.id;
        self.messages.push(message);
        id
    }

    /// Appends `fragment` to the assistant entry with the given id.
    ///
    /// Returns `false` (and changes nothing) when no such entry exists or the
    /// entry is not an assistant entry.
    pub fn append_to(&mut self, id: Uuid, fragment: &str) -> bool {
        match self.messages.iter_mut().rev().find(|m| m.id == id) {
            Some(message) if message.is_assistant() => {
                message.text.push_str(fragment);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
