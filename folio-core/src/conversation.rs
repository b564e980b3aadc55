//! In-memory conversation model.
//!
//! A [`Conversation`] is append-only for the life of a session. Only the
//! newest assistant message may change after it is appended, and only while
//! it is still streaming.

use crate::content::ContentStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque message identifier, unique within a conversation
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl From<Role> for llm::Role {
    fn from(role: Role) -> Self {
        match role {
            Role::User => llm::Role::User,
            Role::Assistant => llm::Role::Assistant,
        }
    }
}

/// Kind of a content part. Anything that is not text (tool calls, files,
/// reasoning) maps to `Other` and is ignored for display.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    Text,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PartState {
    Streaming,
    #[default]
    Complete,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type", default)]
    pub kind: PartKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub state: PartState,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: PartKind::Text,
            text: text.into(),
            state: PartState::Complete,
        }
    }

    pub fn streaming_text(text: impl Into<String>) -> Self {
        Self {
            kind: PartKind::Text,
            text: text.into(),
            state: PartState::Streaming,
        }
    }

    pub fn other(text: impl Into<String>) -> Self {
        Self {
            kind: PartKind::Other,
            text: text.into(),
            state: PartState::Complete,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    id: MessageId,
    role: Role,
    #[serde(default)]
    parts: Vec<ContentPart>,
    /// Flat text carried by messages that predate structured parts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

impl Message {
    pub fn new(role: Role, parts: Vec<ContentPart>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            parts,
            content: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentPart::text(text)])
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![ContentPart::text(text)])
    }

    /// Message with no parts and only a flat text field
    pub fn flat(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            parts: Vec::new(),
            content: Some(content.into()),
        }
    }

    pub(crate) fn assistant_placeholder() -> Self {
        Self::new(Role::Assistant, vec![ContentPart::streaming_text("")])
    }

    pub fn with_id(mut self, id: MessageId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn parts(&self) -> &[ContentPart] {
        &self.parts
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn text(&self) -> String {
        crate::normalize::extract_text(self)
    }

    pub fn is_streaming(&self) -> bool {
        crate::normalize::is_streaming(self)
    }

    /// Replace the in-flight text. Ignored once the message is complete.
    pub(crate) fn set_streaming_text(&mut self, text: &str) -> bool {
        let Some(part) = self
            .parts
            .iter_mut()
            .rev()
            .find(|p| p.kind == PartKind::Text && p.state == PartState::Streaming)
        else {
            return false;
        };
        part.text.clear();
        part.text.push_str(text);
        true
    }

    /// Mark every part complete. Parts never go back to streaming.
    pub(crate) fn complete(&mut self) {
        for part in &mut self.parts {
            part.state = PartState::Complete;
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    /// True while the latest assistant message is still receiving text
    pub fn is_busy(&self) -> bool {
        self.last_assistant().is_some_and(Message::is_streaming)
    }

    pub(crate) fn push(&mut self, message: Message) -> MessageId {
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    /// Only the newest assistant message is writable.
    pub(crate) fn in_flight_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.messages
            .iter_mut()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .filter(|m| &m.id == id)
    }

    pub(crate) fn clear(&mut self) {
        self.messages.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestedPrompt {
    pub label: &'static str,
    pub prompt: &'static str,
}

pub const SUGGESTED_PROMPTS: [SuggestedPrompt; 4] = [
    SuggestedPrompt {
        label: "Experience",
        prompt: "Tell me about your professional experience",
    },
    SuggestedPrompt {
        label: "Skills",
        prompt: "What technologies do you specialize in?",
    },
    SuggestedPrompt {
        label: "Projects",
        prompt: "What projects have you worked on?",
    },
    SuggestedPrompt {
        label: "About",
        prompt: "Tell me about yourself",
    },
];

pub const GREETING: &str = "How can I help you today?";

pub const PLACEHOLDER_INPUT: &str = "Ask me anything...";

/// Display-only opener shown while a conversation is empty. Never sent to
/// the provider.
pub fn welcome_message(store: &ContentStore) -> Message {
    Message::assistant(format!(
        "Hi! I'm {}'s AI assistant. \
         Ask me anything about my work, experience, skills, or projects!",
        store.full_name()
    ))
    .with_id(MessageId::from_string("welcome"))
}
