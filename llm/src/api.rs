use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[default]
    Assistant,
    System,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    /// Model reasoning that providers expose separately; never shown as reply text
    Thought { text: String },
}

#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ChatPayload {
    pub content: Vec<ContentBlock>,
}

impl From<&String> for ChatPayload {
    fn from(text: &String) -> Self {
        ChatPayload::text(text)
    }
}

impl From<String> for ChatPayload {
    fn from(text: String) -> Self {
        ChatPayload::text(text)
    }
}

impl From<&str> for ChatPayload {
    fn from(text: &str) -> Self {
        ChatPayload::text(text)
    }
}

impl ChatPayload {
    pub fn new(content: Vec<ContentBlock>) -> Self {
        ChatPayload { content }
    }

    pub fn text(text: impl Into<String>) -> Self {
        ChatPayload {
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Concatenated text blocks, thoughts excluded
    pub fn get_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Thought { .. } => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: Role,
    pub payload: ChatPayload,
}

impl ChatMessage {
    pub fn new(role: Role, payload: ChatPayload) -> Self {
        ChatMessage { role, payload }
    }

    pub fn user(payload: impl Into<ChatPayload>) -> Self {
        Self::new(Role::User, payload.into())
    }

    pub fn assistant(payload: impl Into<ChatPayload>) -> Self {
        Self::new(Role::Assistant, payload.into())
    }

    pub fn system(payload: impl Into<ChatPayload>) -> Self {
        Self::new(Role::System, payload.into())
    }

    pub fn get_text(&self) -> String {
        self.payload.get_text()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ChatChunk {
    pub role: Role,
    pub payload: ChatPayload,
    /// Set by providers on the last event of a reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl ChatChunk {
    pub fn new(role: Role, payload: ChatPayload) -> Self {
        ChatChunk {
            role,
            payload,
            finish_reason: None,
        }
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, ChatPayload::text(text))
    }

    pub fn get_text(&self) -> String {
        self.payload.get_text()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatRequest {
    pub(crate) messages: Vec<ChatMessage>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        ChatRequest { messages }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Text of all system messages, joined in order
    pub fn system_text(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.get_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_text_skips_thoughts() {
        let payload = ChatPayload::new(vec![
            ContentBlock::Thought {
                text: "planning...".to_string(),
            },
            ContentBlock::Text {
                text: "Hello".to_string(),
            },
            ContentBlock::Text {
                text: ", world".to_string(),
            },
        ]);
        assert_eq!(payload.get_text(), "Hello, world");
    }

    #[test]
    fn test_content_block_serialization() {
        let block = ContentBlock::Text {
            text: "hi".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&block).unwrap(),
            r#"{"type":"text","text":"hi"}"#
        );
    }

    #[test]
    fn test_request_system_text() {
        let request = ChatRequest::new(vec![
            ChatMessage::system("Be brief."),
            ChatMessage::user("Hi"),
            ChatMessage::system("Use English."),
        ]);
        assert_eq!(request.system_text(), "Be brief.\nUse English.");
        assert_eq!(request.messages().len(), 3);
    }
}
