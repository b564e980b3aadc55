//! Chat core for the folio portfolio assistant
//!
//! This crate provides:
//! - **Content**: `ContentStore`, the read-only portfolio records
//! - **Prompt**: `assemble_system_prompt` built from the store
//! - **Conversation**: `Message`, `ContentPart` and the normalizer
//! - **Session**: `ChatSession` for streaming replies from a `ChatModel`
//! - **Reveal**: `RevealController` for paced display of streamed text
//! - **Contact**: `submit_contact` with field validation
//!
//! # Example
//!
//! ```ignore
//! use folio_core::{ChatSession, ContentStore};
//!
//! let content = Arc::new(ContentStore::bundled()?);
//! let mut session = ChatSession::from_settings(&settings, content)?;
//! if let Some(reply) = session.send("What projects have you worked on?")? {
//!     session.drive(reply).await?;
//! }
//! ```
pub mod contact;
pub mod content;
pub mod conversation;
pub mod error;
pub mod normalize;
pub mod prompt;
pub mod reveal;
pub mod session;

pub use contact::{
    ContactError, ContactReceipt, ContactSink, ContactSubmission, LogContactSink, submit_contact,
};
pub use content::ContentStore;
pub use conversation::{
    ContentPart, Conversation, GREETING, Message, MessageId, PLACEHOLDER_INPUT, PartKind, PartState,
    Role, SUGGESTED_PROMPTS, SuggestedPrompt, welcome_message,
};
pub use error::{ChatError, ConfigurationError, TransportError, ValidationError};
pub use normalize::{extract_text, is_streaming};
pub use prompt::{PromptLimits, assemble_system_prompt};
pub use reveal::{RevealConfig, RevealController, RevealEvent, RevealState, RevealTarget};
pub use session::{ChatSession, IncomingChunk, ReplyStream};
