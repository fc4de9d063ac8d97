use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::catalog::{Category, Size};
use crate::error::ConfigError;

/// Session lengths offered to the user, in seconds.
pub const ALLOWED_DURATIONS: [u64; 4] = [15, 30, 60, 120];

pub const DEFAULT_DURATION_SECS: u64 = 60;

/// Persisted user preferences. Not validated; see [`SessionConfig`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub duration_secs: u64,
    pub category: Category,
    pub size: Size,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            category: Category::Plain,
            size: Size::Medium,
        }
    }
}

impl From<&SessionConfig> for Config {
    fn from(sc: &SessionConfig) -> Self {
        Self {
            duration_secs: sc.duration_secs(),
            category: sc.category(),
            size: sc.size(),
        }
    }
}

/// Validated settings a session is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    duration_secs: u64,
    category: Category,
    size: Size,
}

impl SessionConfig {
    pub fn new(duration_secs: u64, category: Category, size: Size) -> Result<Self, ConfigError> {
        validate_duration(duration_secs)?;
        Ok(Self {
            duration_secs,
            category,
            size,
        })
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn with_duration(self, duration_secs: u64) -> Result<Self, ConfigError> {
        Self::new(duration_secs, self.category, self.size)
    }

    pub fn with_category(self, category: Category) -> Self {
        Self { category, ..self }
    }

    pub fn with_size(self, size: Size) -> Self {
        Self { size, ..self }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            category: Category::Plain,
            size: Size::Medium,
        }
    }
}

impl TryFrom<&Config> for SessionConfig {
    type Error = ConfigError;

    fn try_from(cfg: &Config) -> Result<Self, Self::Error> {
        Self::new(cfg.duration_secs, cfg.category, cfg.size)
    }
}

pub fn validate_duration(duration_secs: u64) -> Result<u64, ConfigError> {
    if ALLOWED_DURATIONS.contains(&duration_secs) {
        Ok(duration_secs)
    } else {
        Err(ConfigError::InvalidDuration(duration_secs))
    }
}

/// Next allowed duration after `current`, wrapping around.
pub fn next_duration(current: u64) -> u64 {
    ALLOWED_DURATIONS
        .iter()
        .copied()
        .find(|d| *d > current)
        .unwrap_or(ALLOWED_DURATIONS[0])
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(err) => warn!("ignoring unreadable config {}: {err}", self.path.display()),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            duration_secs: 120,
            category: Category::SpecialCharacters,
            size: Size::Large,
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn load_missing_or_corrupt_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, b"{\"duration_secs\": 30, \"category\": \"poetry\"}").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn config_serializes_snake_case() {
        let cfg = Config {
            duration_secs: 15,
            category: Category::NumbersAndPunctuation,
            size: Size::Small,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"numbers_and_punctuation\""));
        assert!(json.contains("\"small\""));
    }

    #[test]
    fn session_config_rejects_invalid_duration() {
        assert_matches!(
            SessionConfig::new(0, Category::Plain, Size::Small),
            Err(ConfigError::InvalidDuration(0))
        );
        assert_matches!(
            SessionConfig::new(45, Category::Plain, Size::Small),
            Err(ConfigError::InvalidDuration(45))
        );
        for d in ALLOWED_DURATIONS {
            assert!(SessionConfig::new(d, Category::Plain, Size::Small).is_ok());
        }
    }

    #[test]
    fn session_config_from_config() {
        let bad = Config {
            duration_secs: 7,
            ..Config::default()
        };
        assert_matches!(
            SessionConfig::try_from(&bad),
            Err(ConfigError::InvalidDuration(7))
        );

        let good = SessionConfig::try_from(&Config::default()).unwrap();
        assert_eq!(good, SessionConfig::default());
        assert_eq!(Config::from(&good), Config::default());
    }

    #[test]
    fn session_config_builders() {
        let sc = SessionConfig::default()
            .with_category(Category::Quotes)
            .with_size(Size::Small)
            .with_duration(15)
            .unwrap();
        assert_eq!(sc.category(), Category::Quotes);
        assert_eq!(sc.size(), Size::Small);
        assert_eq!(sc.duration_secs(), 15);
        assert!(sc.with_duration(16).is_err());
    }

    #[test]
    fn next_duration_cycles() {
        assert_eq!(next_duration(15), 30);
        assert_eq!(next_duration(60), 120);
        assert_eq!(next_duration(120), 15);
    }
}
