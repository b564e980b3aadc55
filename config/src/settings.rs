//! Application settings management

use crate::PathManager;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Application settings stored in settings.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub chat: ChatSettings,
    pub reveal: RevealSettings,
    pub prompt: PromptSettings,
    /// Portfolio content file; the bundled portfolio is used when unset
    pub content_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatSettings {
    /// Gemini model name, e.g. "gemini-1.5-flash"
    pub model: String,
    /// Override for the Gemini REST endpoint (proxies, emulators)
    pub base_url: Option<String>,
    /// Ceiling on a single reply, from request to terminal chunk
    pub timeout_secs: u64,
}

impl ChatSettings {
    /// Reply ceiling, never shorter than one second
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            base_url: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RevealSettings {
    pub chunk_chars: usize,
    pub tick_ms: u64,
    pub drift_tolerance: usize,
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self {
            chunk_chars: 3,
            tick_ms: 15,
            drift_tolerance: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PromptSettings {
    pub skills: usize,
    pub experiences: usize,
    pub achievements: usize,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            skills: 10,
            experiences: 3,
            achievements: 3,
        }
    }
}

impl Settings {
    /// Load settings from the settings file, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = PathManager::settings_path() else {
            return Self::default();
        };

        let Ok(content) = fs::read_to_string(&path) else {
            return Self::default();
        };

        Self::from_toml_str(&content).unwrap_or_default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.chat.timeout_secs, 30);
        assert_eq!(settings.reveal.chunk_chars, 3);
        assert_eq!(settings.reveal.tick_ms, 15);
        assert_eq!(settings.reveal.drift_tolerance, 50);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            content_path = "/srv/portfolio.toml"

            [chat]
            model = "gemini-1.5-pro"

            [reveal]
            tick_ms = 40
            "#,
        )
        .unwrap();

        assert_eq!(settings.chat.model, "gemini-1.5-pro");
        assert_eq!(settings.chat.timeout_secs, 30);
        assert_eq!(settings.reveal.tick_ms, 40);
        assert_eq!(settings.reveal.chunk_chars, 3);
        assert_eq!(settings.prompt.skills, 10);
        assert_eq!(
            settings.content_path,
            Some(PathBuf::from("/srv/portfolio.toml"))
        );
    }

    #[test]
    fn test_zero_timeout_is_clamped_to_one_second() {
        let settings = Settings::from_toml_str("[chat]\ntimeout_secs = 0").unwrap();
        assert_eq!(settings.chat.timeout_secs, 0);
        assert_eq!(settings.chat.timeout(), Duration::from_secs(1));
        assert_eq!(Settings::default().chat.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(Settings::from_toml_str("[chat\nmodel = 1").is_err());
    }
}
