use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::kv::{validate_key, KvKeyError};
use crate::model::{Category, Priority, TodoDraft};

pub const DEFAULT_ITEMS_KEY: &str = "todos";
pub const DEFAULT_THEME_KEY: &str = "theme";
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid storage key: {0}")]
    InvalidKey(#[from] KvKeyError),

    #[error("items and theme must use different storage keys (both '{0}')")]
    KeyCollision(String),

    #[error("max_text_length must be greater than zero")]
    ZeroTextLength,
}

/// Names of the two entries in the local key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    pub items: String,
    pub theme: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            items: DEFAULT_ITEMS_KEY.to_string(),
            theme: DEFAULT_THEME_KEY.to_string(),
        }
    }
}

/// Runtime configuration, sent by the shell with `Event::Configure`.
/// Every field is optional on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageKeys,
    pub default_category: String,
    pub default_priority: Priority,
    pub max_text_length: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageKeys::default(),
            default_category: Category::default().as_str().to_string(),
            default_priority: Priority::default(),
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_key(&self.storage.items)?;
        validate_key(&self.storage.theme)?;
        if self.storage.items == self.storage.theme {
            return Err(ConfigError::KeyCollision(self.storage.items.clone()));
        }
        if self.max_text_length == 0 {
            return Err(ConfigError::ZeroTextLength);
        }
        Ok(())
    }

    /// Fills the draft's missing metadata and clamps its text to
    /// `max_text_length` characters.
    #[must_use]
    pub fn prepare_draft(&self, mut draft: TodoDraft) -> TodoDraft {
        draft.text = self.clamp_text(&draft.text);
        let category = draft
            .category
            .take()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.default_category.clone());
        draft.category = Some(category);
        draft.priority = Some(draft.priority.unwrap_or(self.default_priority));
        draft
    }

    #[must_use]
    pub fn clamp_text(&self, text: &str) -> String {
        let trimmed = text.trim();
        match trimmed.char_indices().nth(self.max_text_length) {
            Some((cut, _)) => trimmed[..cut].trim_end().to_string(),
            None => trimmed.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.items, "todos");
        assert_eq!(config.storage.theme, "theme");
        assert_eq!(config.default_category, "personal");
    }

    #[test]
    fn rejects_colliding_keys() {
        let mut config = AppConfig::default();
        config.storage.theme = config.storage.items.clone();
        assert_eq!(
            config.validate(),
            Err(ConfigError::KeyCollision("todos".into()))
        );
    }

    #[test]
    fn rejects_blank_key_and_zero_length() {
        let mut config = AppConfig::default();
        config.storage.items = "  ".into();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidKey(_))));

        let config = AppConfig {
            max_text_length: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTextLength));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"storage":{"items":"my-todos"},"default_priority":"high"}"#)
                .unwrap();
        assert_eq!(config.storage.items, "my-todos");
        assert_eq!(config.storage.theme, "theme");
        assert_eq!(config.default_priority, Priority::High);
        assert_eq!(config.max_text_length, DEFAULT_MAX_TEXT_LENGTH);
    }

    #[test]
    fn prepare_draft_applies_defaults_and_clamps() {
        let config = AppConfig {
            default_category: "errands".into(),
            max_text_length: 5,
            ..AppConfig::default()
        };
        let draft = config.prepare_draft(TodoDraft::new("  héllo world  ").with_category(" "));
        assert_eq!(draft.text, "héllo");
        assert_eq!(draft.category.as_deref(), Some("errands"));
        assert_eq!(draft.priority, Some(Priority::Medium));

        let kept = config.prepare_draft(TodoDraft::new("hi").with_priority(Priority::Low));
        assert_eq!(kept.text, "hi");
        assert_eq!(kept.priority, Some(Priority::Low));
    }
}
