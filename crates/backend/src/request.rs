use serde::{Deserialize, Serialize};

/// A request to be sent to the chat backend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChatRequest {
    /// The conversation, oldest message first. The last message is always
    /// the newly submitted user text.
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Returns the newly submitted text, which is the last message.
    #[inline]
    pub fn latest(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

/// Who authored a message, from the backend's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The player.
    User,
    /// The persona.
    Assistant,
}

/// One entry of the conversation history.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The author of the message.
    pub role: Role,
    /// The text of the message.
    pub content: String,
}

impl ChatMessage {
    /// Creates a user-authored message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant-authored message.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
