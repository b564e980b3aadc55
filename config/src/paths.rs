use directories::BaseDirs;
use std::path::PathBuf;
use std::sync::OnceLock;

const APP_DIR: &str = "folio";

static DATA_DIR_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

pub struct PathManager;

impl PathManager {
    /// Set a custom data directory (tests, portable installs)
    pub fn set_data_dir(path: PathBuf) {
        let _ = DATA_DIR_OVERRIDE.set(path);
    }

    pub fn data_dir() -> Option<PathBuf> {
        if let Some(d) = DATA_DIR_OVERRIDE.get() {
            return Some(d.clone());
        }
        BaseDirs::new().map(|d| d.data_dir().join(APP_DIR))
    }

    pub fn config_dir() -> Option<PathBuf> {
        if let Some(d) = DATA_DIR_OVERRIDE.get() {
            return Some(d.clone());
        }
        BaseDirs::new().map(|d| d.config_dir().join(APP_DIR))
    }

    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("settings.toml"))
    }

    pub fn logs_dir() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(dirs) = directories::UserDirs::new() {
                return Some(dirs.home_dir().join("Library/Logs/Folio"));
            }
        }
        Self::data_dir().map(|d| d.join("logs"))
    }

    pub fn log_file_path() -> Option<PathBuf> {
        Self::logs_dir().map(|d| d.join("folio.log"))
    }

    /// Raw provider traffic. Kept apart from `log_file_path`, which the
    /// tracing appender owns.
    pub fn traffic_log_path() -> Option<PathBuf> {
        Self::logs_dir().map(|d| d.join("traffic.log"))
    }

    pub fn ensure_dirs_exist() -> std::io::Result<()> {
        for dir in [Self::data_dir(), Self::config_dir(), Self::logs_dir()]
            .into_iter()
            .flatten()
        {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_roots_every_path() {
        let root = std::env::temp_dir().join("folio-paths-test");
        PathManager::set_data_dir(root.clone());

        assert_eq!(PathManager::settings_path(), Some(root.join("settings.toml")));
        #[cfg(not(target_os = "macos"))]
        {
            let logs = root.join("logs");
            assert_eq!(PathManager::log_file_path(), Some(logs.join("folio.log")));
            assert_eq!(PathManager::traffic_log_path(), Some(logs.join("traffic.log")));
        }
        assert_ne!(PathManager::traffic_log_path(), PathManager::log_file_path());

        PathManager::ensure_dirs_exist().unwrap();
        assert!(root.is_dir());
    }
}
