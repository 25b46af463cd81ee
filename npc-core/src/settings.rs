//! World-scoped module settings.
//!
//! Holds the provider API keys. The settings are an explicit value handed to
//! the handler rather than ambient global state, so tests can build one
//! inline.

use crate::form::Provider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// File name of the settings document inside a world directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Errors from settings persistence.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Provider credentials for one world.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub gemini_api_key: String,

    #[serde(default)]
    pub open_ai_api_key: String,
}

/// A partial write from the settings menu. `None` leaves a key untouched.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub gemini_api_key: Option<String>,
    pub open_ai_api_key: Option<String>,
}

impl Settings {
    pub fn new(gemini_api_key: impl Into<String>, open_ai_api_key: impl Into<String>) -> Self {
        Self {
            gemini_api_key: gemini_api_key.into(),
            open_ai_api_key: open_ai_api_key.into(),
        }
    }

    /// Settings path for a world directory.
    pub fn path_in(world_dir: impl AsRef<Path>) -> PathBuf {
        world_dir.as_ref().join(SETTINGS_FILE)
    }

    /// Load settings, returning defaults if the file does not exist yet.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        match fs::read_to_string(path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Save settings as pretty JSON, creating the parent directory.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Overlay `GEMINI_API_KEY` / `OPENAI_API_KEY` from the environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(key) = non_empty_env("GEMINI_API_KEY") {
            self.gemini_api_key = key;
        }
        if let Some(key) = non_empty_env("OPENAI_API_KEY") {
            self.open_ai_api_key = key;
        }
        self
    }

    /// Apply a settings-menu submission. Returns true if anything changed.
    pub fn update(&mut self, update: SettingsUpdate) -> bool {
        let before = self.clone();
        if let Some(key) = update.gemini_api_key {
            tracing::info!("Gemini API key changed");
            self.gemini_api_key = key;
        }
        if let Some(key) = update.open_ai_api_key {
            tracing::info!("OpenAI API key changed");
            self.open_ai_api_key = key;
        }
        *self != before
    }

    /// The configured key for a provider, if any.
    pub fn api_key(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::Gemini => &self.gemini_api_key,
            Provider::OpenAi => &self.open_ai_api_key,
        };
        let key = key.trim();
        (!key.is_empty()).then_some(key)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("open_ai_api_key", &redact(&self.open_ai_api_key))
            .finish()
    }
}

/// Show that a key is set without revealing it.
pub fn redact(key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        "<not set>".to_string()
    } else if key.chars().count() <= 8 {
        "****".to_string()
    } else {
        let tail: String = key.chars().skip(key.chars().count() - 4).collect();
        format!("****{tail}")
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_blank_is_none() {
        let settings = Settings::new("  ", "");
        assert_eq!(settings.api_key(Provider::Gemini), None);
        assert_eq!(settings.api_key(Provider::OpenAi), None);

        let settings = Settings::new(" abc ", "def");
        assert_eq!(settings.api_key(Provider::Gemini), Some("abc"));
        assert_eq!(settings.api_key(Provider::OpenAi), Some("def"));
    }

    #[test]
    fn test_update_only_touches_submitted_fields() {
        let mut settings = Settings::new("gem", "oai");
        let changed = settings.update(SettingsUpdate {
            gemini_api_key: Some("new-gem".to_string()),
            open_ai_api_key: None,
        });
        assert!(changed);
        assert_eq!(settings.gemini_api_key, "new-gem");
        assert_eq!(settings.open_ai_api_key, "oai");

        assert!(!settings.update(SettingsUpdate::default()));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let settings = Settings::new("AIzaSyVerySecretKey1234", "");
        let shown = format!("{settings:?}");
        assert!(!shown.contains("VerySecret"));
        assert!(shown.contains("****1234"));
        assert!(shown.contains("<not set>"));
    }

    #[test]
    fn test_env_overrides_only_non_empty_keys() {
        std::env::set_var("GEMINI_API_KEY", "env-gem");
        std::env::set_var("OPENAI_API_KEY", "   ");

        let settings = Settings::new("file-gem", "file-oai").with_env_overrides();

        std::env::remove_var("GEMINI_API_KEY");
        std::env::remove_var("OPENAI_API_KEY");

        assert_eq!(settings, Settings::new("env-gem", "file-oai"));
    }

    #[tokio::test]
    async fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(Settings::path_in(dir.path())).await.unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = Settings::path_in(dir.path().join("world"));
        let settings = Settings::new("gem-key", "");
        settings.save(&path).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"geminiApiKey\""));

        let loaded = Settings::load(&path).await.unwrap();
        assert_eq!(loaded, settings);
    }
}
