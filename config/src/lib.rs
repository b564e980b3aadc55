pub mod paths;
pub mod provider;
pub mod settings;

pub use paths::PathManager;
pub use provider::ProviderConfig;
pub use settings::{ChatSettings, PromptSettings, RevealSettings, Settings};

/// Load environment variables from ~/.env, then ./.env.
/// Call this before parsing CLI args so `env` fallbacks see the values.
pub fn load_env_file() {
    if let Some(home) = dirs::home_dir() {
        dotenv::from_path(home.join(".env")).ok();
    }

    // dotenv does not overwrite variables that are already set, so the
    // project file only fills in what the home file left out.
    dotenv::dotenv().ok();
}
