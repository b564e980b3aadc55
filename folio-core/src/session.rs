//! Chat transport: one conversation, one reply in flight at a time.
//!
//! [`ChatSession::send`] appends the user turn plus a streaming assistant
//! placeholder and hands back a [`ReplyStream`]. The stream owns everything
//! it needs, so the caller can poll it while still reading the session, and
//! feeds each [`IncomingChunk`] back through [`ChatSession::apply`].
//!
//! # Example
//!
//! ```ignore
//! let mut session = ChatSession::new(Some(model), content);
//! if let Some(reply) = session.send("Tell me about your experience")? {
//!     session.drive(reply).await?;
//! }
//! ```

use crate::content::ContentStore;
use crate::conversation::{Conversation, Message, MessageId, welcome_message};
use crate::error::{ChatError, ConfigurationError, TransportError};
use crate::prompt::{PromptLimits, assemble_system_prompt};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use llm::{ChatMessage, ChatModel, ChatRequest, ChatStream, ModelProvider};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Instant, timeout_at};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Cumulative state of the assistant message after one network event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingChunk {
    pub message_id: MessageId,
    /// Full text received so far
    pub text: String,
    /// No further chunks follow
    pub terminal: bool,
}

/// Reply to one `send`. Ends after a terminal chunk or an error item.
pub struct ReplyStream {
    message_id: MessageId,
    inner: BoxStream<'static, Result<IncomingChunk, ChatError>>,
}

impl ReplyStream {
    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }
}

impl Stream for ReplyStream {
    type Item = Result<IncomingChunk, ChatError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

enum Phase {
    Connect(Arc<dyn ChatModel + Send + Sync>, ChatRequest),
    Streaming(ChatStream),
    Done,
}

struct Reply {
    phase: Phase,
    message_id: MessageId,
    text: String,
    timeout: Duration,
    deadline: Option<Instant>,
}

impl Reply {
    fn chunk(&self, terminal: bool) -> IncomingChunk {
        IncomingChunk {
            message_id: self.message_id.clone(),
            text: self.text.clone(),
            terminal,
        }
    }

    fn timed_out(&self) -> ChatError {
        tracing::warn!(message_id = %self.message_id, "reply timed out");
        TransportError::Timeout(self.timeout).into()
    }

    /// Next item for the caller. The deadline starts on first poll and covers
    /// connecting and every chunk after it.
    async fn next(mut self) -> Option<(Result<IncomingChunk, ChatError>, Self)> {
        loop {
            match std::mem::replace(&mut self.phase, Phase::Done) {
                Phase::Done => return None,
                Phase::Connect(model, request) => {
                    let deadline = Instant::now() + self.timeout;
                    self.deadline = Some(deadline);
                    match timeout_at(deadline, model.stream_chat(&request)).await {
                        Err(_) => return Some((Err(self.timed_out()), self)),
                        Ok(Err(e)) => {
                            tracing::warn!(
                                message_id = %self.message_id,
                                "chat request failed: {:#}",
                                e
                            );
                            return Some((Err(TransportError::provider(&e).into()), self));
                        }
                        Ok(Ok(stream)) => self.phase = Phase::Streaming(stream),
                    }
                }
                Phase::Streaming(mut stream) => {
                    let deadline = self
                        .deadline
                        .unwrap_or_else(|| Instant::now() + self.timeout);
                    match timeout_at(deadline, stream.next()).await {
                        Err(_) => return Some((Err(self.timed_out()), self)),
                        Ok(None) => {
                            tracing::debug!(
                                message_id = %self.message_id,
                                chars = self.text.chars().count(),
                                "reply complete"
                            );
                            let chunk = self.chunk(true);
                            return Some((Ok(chunk), self));
                        }
                        Ok(Some(Err(e))) => {
                            tracing::warn!(
                                message_id = %self.message_id,
                                "chat stream failed: {:#}",
                                e
                            );
                            return Some((Err(TransportError::provider(&e).into()), self));
                        }
                        Ok(Some(Ok(chunk))) => {
                            self.phase = Phase::Streaming(stream);
                            let delta = chunk.get_text();
                            if delta.is_empty() {
                                continue;
                            }
                            self.text.push_str(&delta);
                            let chunk = self.chunk(false);
                            return Some((Ok(chunk), self));
                        }
                    }
                }
            }
        }
    }
}

pub struct ChatSession {
    model: Option<Arc<dyn ChatModel + Send + Sync>>,
    content: Arc<ContentStore>,
    limits: PromptLimits,
    timeout: Duration,
    conversation: Conversation,
    last_error: Option<ChatError>,
}

impl ChatSession {
    /// `model` is None when no provider credential is configured; every
    /// send then fails with a configuration error.
    pub fn new(
        model: Option<Arc<dyn ChatModel + Send + Sync>>,
        content: Arc<ContentStore>,
    ) -> Self {
        Self {
            model,
            content,
            limits: PromptLimits::default(),
            timeout: DEFAULT_TIMEOUT,
            conversation: Conversation::new(),
            last_error: None,
        }
    }

    /// Session for the Gemini provider described by settings and the
    /// environment.
    pub fn from_settings(
        settings: &config::Settings,
        content: Arc<ContentStore>,
    ) -> anyhow::Result<Self> {
        Self::with_provider(config::ProviderConfig::resolve(settings), settings, content)
    }

    /// Like `from_settings` with an already resolved provider.
    pub fn with_provider(
        provider: Option<config::ProviderConfig>,
        settings: &config::Settings,
        content: Arc<ContentStore>,
    ) -> anyhow::Result<Self> {
        let model = match provider {
            Some(provider_config) => {
                let provider = llm::GeminiProvider::from_config(&provider_config)?;
                provider.create_chat_model(&provider_config.model)
            }
            None => {
                tracing::warn!("no Gemini API key configured; chat is disabled");
                None
            }
        };

        Ok(Self::new(model, content)
            .with_limits(PromptLimits::from(&settings.prompt))
            .with_timeout(settings.chat.timeout()))
    }

    pub fn with_limits(mut self, limits: PromptLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model.as_ref().map(|m| m.name())
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Submission is disabled while this is true
    pub fn is_busy(&self) -> bool {
        self.conversation.is_busy()
    }

    pub fn system_prompt(&self) -> String {
        assemble_system_prompt(&self.content, &self.limits)
    }

    /// Messages to show: the conversation, or the welcome message while it
    /// is empty.
    pub fn display_messages(&self) -> Vec<Message> {
        if self.conversation.is_empty() {
            vec![welcome_message(&self.content)]
        } else {
            self.conversation.messages().to_vec()
        }
    }

    /// Submit a user turn.
    ///
    /// Returns `Ok(None)` without touching the conversation when the input
    /// is blank or a reply is still streaming.
    pub fn send(&mut self, text: &str) -> Result<Option<ReplyStream>, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if self.is_busy() {
            tracing::debug!("send ignored while a reply is streaming");
            return Ok(None);
        }
        let Some(model) = self.model.clone() else {
            return Err(ConfigurationError.into());
        };

        let mut messages = vec![ChatMessage::system(self.system_prompt())];
        messages.extend(
            self.conversation
                .messages()
                .iter()
                .filter_map(|m| {
                    let text = m.text();
                    (!text.is_empty()).then(|| ChatMessage::new(m.role().into(), text.into()))
                }),
        );
        messages.push(ChatMessage::user(text));
        let request = ChatRequest::new(messages);

        self.last_error = None;
        self.conversation.push(Message::user(text));
        let message_id = self.conversation.push(Message::assistant_placeholder());
        tracing::info!(
            message_id = %message_id,
            model = model.name(),
            history = self.conversation.len() - 2,
            "sending chat request"
        );

        let reply = Reply {
            phase: Phase::Connect(model, request),
            message_id: message_id.clone(),
            text: String::new(),
            timeout: self.timeout,
            deadline: None,
        };
        let inner = stream::unfold(reply, Reply::next).boxed();
        Ok(Some(ReplyStream { message_id, inner }))
    }

    /// Write a chunk into its assistant message. Returns false when the
    /// message is gone (conversation cleared) or already complete.
    pub fn apply(&mut self, chunk: &IncomingChunk) -> bool {
        let Some(message) = self.conversation.in_flight_mut(&chunk.message_id) else {
            tracing::debug!(message_id = %chunk.message_id, "chunk for abandoned message dropped");
            return false;
        };
        if !message.set_streaming_text(&chunk.text) {
            return false;
        }
        if chunk.terminal {
            message.complete();
        }
        true
    }

    /// End a reply with an error. Text received so far is kept and the
    /// message is marked complete so the user can resubmit.
    pub fn fail(&mut self, message_id: &MessageId, error: ChatError) {
        if let Some(message) = self.conversation.in_flight_mut(message_id) {
            message.complete();
        }
        self.last_error = Some(error);
    }

    /// Stop waiting for a reply the user abandoned. Keeps the partial text
    /// and records no error.
    pub fn cancel(&mut self, message_id: &MessageId) {
        if let Some(message) = self.conversation.in_flight_mut(message_id) {
            tracing::debug!(message_id = %message_id, "reply cancelled");
            message.complete();
        }
    }

    /// Consume `reply` to the end, applying every chunk.
    pub async fn drive(&mut self, mut reply: ReplyStream) -> Result<(), ChatError> {
        while let Some(item) = reply.next().await {
            match item {
                Ok(chunk) => {
                    self.apply(&chunk);
                    if chunk.terminal {
                        return Ok(());
                    }
                }
                Err(error) => {
                    self.fail(reply.message_id(), error.clone());
                    return Err(error);
                }
            }
        }
        Ok(())
    }

    /// Start a new conversation. Any reply still in flight is abandoned;
    /// its chunks no longer match a message.
    pub fn clear(&mut self) {
        tracing::debug!(messages = self.conversation.len(), "conversation cleared");
        self.conversation.clear();
        self.last_error = None;
    }

    pub fn last_error(&self) -> Option<&ChatError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }
}
