//! Message normalization: plain text and streaming status from whatever
//! shape a message arrived in. Never fails; unknown shapes give "".

use crate::conversation::{Message, PartKind, PartState};

/// In-order concatenation of the message's text parts. A message with no
/// parts falls back to its flat `content` field.
pub fn extract_text(message: &Message) -> String {
    if message.parts().is_empty() {
        return message.content().unwrap_or_default().to_string();
    }
    message
        .parts()
        .iter()
        .filter(|part| part.kind == PartKind::Text)
        .map(|part| part.text.as_str())
        .collect()
}

/// True iff at least one part is still streaming
pub fn is_streaming(message: &Message) -> bool {
    message
        .parts()
        .iter()
        .any(|part| part.state == PartState::Streaming)
}
