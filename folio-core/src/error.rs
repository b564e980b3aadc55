//! Errors surfaced to the user.
//!
//! Only the transport boundary and contact validation produce these.
//! Normalization and reveal pacing never fail.

use std::time::Duration;
use thiserror::Error;

/// Failure of a chat send
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// No provider credential is configured. Fatal for chat; not retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("chat is not configured: set GOOGLE_GENERATIVE_AI_API_KEY or GEMINI_API_KEY")]
pub struct ConfigurationError;

/// Network or provider failure. The conversation is kept and the user may
/// resubmit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("no complete reply within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("provider error: {0}")]
    Provider(String),
}

impl TransportError {
    pub(crate) fn provider(err: &anyhow::Error) -> Self {
        TransportError::Provider(format!("{:#}", err))
    }
}

/// Required contact fields that were empty
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("please fill in: {}", .missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}
