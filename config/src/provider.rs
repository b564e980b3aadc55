//! Provider credential resolution.
//!
//! The API key only ever comes from the environment; settings.toml carries
//! the non-secret parts (model, endpoint).

use crate::Settings;

pub const API_KEY_ENVS: &[&str] = &["GOOGLE_GENERATIVE_AI_API_KEY", "GEMINI_API_KEY"];
pub const MODEL_ENV: &str = "GOOGLE_MODEL_NAME";
pub const BASE_URL_ENV: &str = "GEMINI_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl ProviderConfig {
    /// Resolve from the process environment. Returns None when no API key is set.
    pub fn resolve(settings: &Settings) -> Option<Self> {
        Self::resolve_with(settings, |name| std::env::var(name).ok())
    }

    pub fn resolve_with<F>(settings: &Settings, lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = API_KEY_ENVS.iter().find_map(|name| non_empty(*name))?;
        let model = non_empty(MODEL_ENV).unwrap_or_else(|| settings.chat.model.clone());
        let base_url = non_empty(BASE_URL_ENV)
            .or_else(|| settings.chat.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Some(ProviderConfig {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }
}
