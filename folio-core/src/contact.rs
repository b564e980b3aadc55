//! Contact form submission.

use crate::error::ValidationError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

impl ContactSubmission {
    /// Name, email and message must be non-blank
    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing: Vec<&'static str> = [
            ("name", self.name.as_str()),
            ("email", self.email.as_str()),
            ("message", self.message.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { missing })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactReceipt {
    pub received_at: DateTime<Utc>,
}

/// Where valid submissions go
#[async_trait]
pub trait ContactSink {
    async fn deliver(&self, submission: &ContactSubmission) -> anyhow::Result<()>;
}

/// Records submissions in the application log
pub struct LogContactSink;

#[async_trait]
impl ContactSink for LogContactSink {
    async fn deliver(&self, submission: &ContactSubmission) -> anyhow::Result<()> {
        tracing::info!(
            name = %submission.name,
            email = %submission.email,
            subject = submission.subject.as_deref().unwrap_or(""),
            timestamp = %Utc::now().to_rfc3339(),
            "contact form submission: {}",
            submission.message
        );
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("failed to send message: {0:#}")]
    Delivery(anyhow::Error),
}

/// Validate, then hand off to the sink. Nothing reaches the sink unless
/// validation passes.
pub async fn submit_contact(
    submission: &ContactSubmission,
    sink: &(dyn ContactSink + Send + Sync),
) -> Result<ContactReceipt, ContactError> {
    submission.validate()?;
    sink.deliver(submission)
        .await
        .map_err(ContactError::Delivery)?;
    Ok(ContactReceipt {
        received_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<ContactSubmission>>,
    }

    #[async_trait]
    impl ContactSink for RecordingSink {
        async fn deliver(&self, submission: &ContactSubmission) -> anyhow::Result<()> {
            self.delivered.lock().unwrap().push(submission.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl ContactSink for FailingSink {
        async fn deliver(&self, _: &ContactSubmission) -> anyhow::Result<()> {
            anyhow::bail!("mail relay unreachable")
        }
    }

    fn submission() -> ContactSubmission {
        ContactSubmission {
            name: "Grace".to_string(),
            email: "grace@example.test".to_string(),
            subject: None,
            message: "Are you available in March?".to_string(),
        }
    }

    #[test]
    fn test_validate_lists_missing_fields() {
        let blank = ContactSubmission {
            name: " ".to_string(),
            message: "\n".to_string(),
            ..submission()
        };
        assert_eq!(
            blank.validate(),
            Err(ValidationError {
                missing: vec!["name", "message"]
            })
        );
        assert_eq!(submission().validate(), Ok(()));
    }

    #[tokio::test]
    async fn test_empty_message_never_reaches_sink() {
        let sink = RecordingSink::default();
        let empty = ContactSubmission {
            message: String::new(),
            ..submission()
        };

        let result = submit_contact(&empty, &sink).await;
        assert!(
            matches!(result, Err(ContactError::Invalid(ref e)) if e.missing == vec!["message"])
        );
        assert!(sink.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_valid_submission_is_delivered() {
        let sink = RecordingSink::default();
        submit_contact(&submission(), &sink).await.unwrap();
        assert_eq!(sink.delivered.lock().unwrap().as_slice(), &[submission()]);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_reported() {
        let err = submit_contact(&submission(), &FailingSink).await.unwrap_err();
        assert_eq!(err.to_string(), "failed to send message: mail relay unreachable");
    }

    #[tokio::test]
    async fn test_log_sink_accepts() {
        assert!(submit_contact(&submission(), &LogContactSink).await.is_ok());
    }
}
