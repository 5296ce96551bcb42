use super::role::Role;
use serde::{Deserialize, Serialize};

/// A chat message as sent by a chat UI
///
/// The role is kept as a plain string so that unknown roles survive decoding; they are only
/// interpreted when the message is adapted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    pub fn new<R: Into<String>, C: Into<String>>(role: R, content: C) -> Self {
        ChatMessage {
            role: role.into(),
            content: content.into(),
            id: None,
            name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
/// A message to or from an LLM
pub enum Message {
    Human { content: String },
    Assistant { content: String },
}

impl Message {
    pub fn human<S: Into<String>>(content: S) -> Self {
        Message::Human {
            content: content.into(),
        }
    }

    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Message::Assistant {
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Message::Human { .. } => Role::User,
            Message::Assistant { .. } => Role::Assistant,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::Human { content } | Message::Assistant { content } => content,
        }
    }
}

impl From<ChatMessage> for Message {
    /// Only the exact role `"user"` is human authored, every other role is treated as assistant
    fn from(message: ChatMessage) -> Self {
        if message.role == "user" {
            Message::human(message.content)
        } else {
            Message::assistant(message.content)
        }
    }
}

/// Adapt incoming chat messages into model messages, preserving order
pub fn adapt(messages: &[ChatMessage]) -> Vec<Message> {
    messages.iter().cloned().map(Message::from).collect()
}
