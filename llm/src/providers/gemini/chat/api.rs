use serde::{Deserialize, Serialize};

use crate::{ChatPayload, ChatRequest, ContentBlock};

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl TryFrom<crate::api::Role> for Role {
    type Error = anyhow::Error;

    fn try_from(value: crate::api::Role) -> Result<Self, Self::Error> {
        match value {
            crate::api::Role::User => Ok(Role::User),
            crate::api::Role::Assistant => Ok(Role::Model),
            crate::api::Role::System => Err(anyhow::anyhow!(
                "Gemini does not support system messages directly."
            )),
        }
    }
}

impl From<Role> for crate::api::Role {
    fn from(value: Role) -> Self {
        match value {
            Role::User => crate::api::Role::User,
            Role::Model => crate::api::Role::Assistant,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub(crate) struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) thought: Option<bool>,
}

impl Part {
    pub fn new_text(text: impl Into<String>) -> Self {
        Part {
            text: Some(text.into()),
            thought: None,
        }
    }
}

impl From<&Part> for Option<ContentBlock> {
    fn from(part: &Part) -> Self {
        // Parts without text (inline data, function calls) have no text rendering.
        let text = part.text.clone()?;
        if part.thought.unwrap_or(false) {
            Some(ContentBlock::Thought { text })
        } else {
            Some(ContentBlock::Text { text })
        }
    }
}

impl From<&ContentBlock> for Part {
    fn from(block: &ContentBlock) -> Self {
        match block {
            ContentBlock::Text { text } => Part::new_text(text.clone()),
            ContentBlock::Thought { text } => Part {
                text: Some(text.clone()),
                thought: Some(true),
            },
        }
    }
}

// Gemini representation of messages.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub(crate) struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) role: Option<Role>,

    #[serde(default)]
    pub(crate) parts: Vec<Part>,
}

impl Content {
    fn from_payload(payload: &ChatPayload, role: Option<Role>) -> Self {
        Content {
            role,
            parts: payload.content.iter().map(Part::from).collect(),
        }
    }

    fn to_payload(&self) -> ChatPayload {
        ChatPayload::new(
            self.parts
                .iter()
                .filter_map(|p| Option::<ContentBlock>::from(p))
                .collect(),
        )
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub(crate) contents: Vec<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) system_instruction: Option<Content>,
}

impl From<&ChatRequest> for GenerateContentRequest {
    fn from(request: &ChatRequest) -> Self {
        // System messages go into systemInstruction rather than contents.
        let system_parts: Vec<Part> = request
            .messages
            .iter()
            .filter(|m| m.role == crate::api::Role::System)
            .flat_map(|m| m.payload.content.iter().map(Part::from))
            .collect();
        let system_instruction = (!system_parts.is_empty()).then(|| Content {
            role: None,
            parts: system_parts,
        });

        let contents = request
            .messages
            .iter()
            .filter_map(|m| {
                let role = Role::try_from(m.role).ok()?;
                Some(Content::from_payload(&m.payload, Some(role)))
            })
            .collect();

        GenerateContentRequest {
            contents,
            system_instruction,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub(crate) content: Option<Content>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) finish_reason: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) prompt_feedback: Option<serde_json::Value>,

    /// Set instead of candidates when the request fails mid-stream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<ApiError>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct ApiError {
    #[serde(default)]
    pub(crate) code: Option<i64>,

    #[serde(default)]
    pub(crate) message: String,

    #[serde(default)]
    pub(crate) status: Option<String>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Gemini error")?;
        if let Some(code) = self.code {
            write!(f, " {}", code)?;
        }
        if let Some(status) = &self.status {
            write!(f, " {}", status)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl TryFrom<GenerateContentResponse> for crate::ChatChunk {
    type Error = anyhow::Error;

    fn try_from(response: GenerateContentResponse) -> Result<Self, Self::Error> {
        if let Some(error) = response.error {
            return Err(anyhow::anyhow!("{}", error));
        }

        // A blocked prompt comes back with no candidates; that is an empty chunk.
        let Some(candidate) = response.candidates.into_iter().next() else {
            return Ok(crate::ChatChunk::new(
                crate::api::Role::Assistant,
                ChatPayload::default(),
            ));
        };

        let payload = candidate
            .content
            .as_ref()
            .map(Content::to_payload)
            .unwrap_or_default();
        let mut chunk = crate::ChatChunk::new(crate::api::Role::Assistant, payload);
        chunk.finish_reason = candidate.finish_reason;
        Ok(chunk)
    }
}
