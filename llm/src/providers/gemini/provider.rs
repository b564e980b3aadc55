use super::chat::model::GeminiChatModel;
use crate::client::Client;
use crate::{ChatModel, ModelProvider};
use anyhow::Context;
use reqwest::header::{self, HeaderValue};
use std::sync::Arc;

pub struct GeminiProvider {
    client: Client,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        let mut key =
            HeaderValue::from_str(api_key).context("API key is not a valid header value")?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);
        Ok(GeminiProvider {
            client: Client::with_headers(headers)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &config::ProviderConfig) -> anyhow::Result<Self> {
        Self::new(&config.base_url, &config.api_key)
    }
}

impl ModelProvider for GeminiProvider {
    fn create_chat_model(&self, model_name: &str) -> Option<Arc<dyn ChatModel + Send + Sync>> {
        if model_name.trim().is_empty() {
            return None;
        }
        Some(Arc::new(GeminiChatModel::new(
            self.client.clone(),
            self.base_url.clone(),
            model_name.to_string(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::provider::DEFAULT_BASE_URL;

    #[test]
    fn test_rejects_key_with_newline() {
        assert!(GeminiProvider::new(DEFAULT_BASE_URL, "abc\ndef").is_err());
    }

    #[test]
    fn test_creates_named_model() {
        let provider = GeminiProvider::new("https://example.test/v1beta/", "key").unwrap();
        let model = provider.create_chat_model("gemini-1.5-flash").unwrap();
        assert_eq!(model.name(), "gemini-1.5-flash");
        assert!(provider.create_chat_model("  ").is_none());
    }
}
