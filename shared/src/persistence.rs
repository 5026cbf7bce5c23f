//! Persistence of items and theme in a local key-value store.
//!
//! Two entries: a JSON array of [`TodoItem`] and a bare theme string.
//! Reads fail soft to defaults; writes report a [`StorageError`] that the
//! caller logs and otherwise ignores. The in-memory state stays authoritative.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::StorageKeys;
use crate::model::{Category, Priority, Theme, TodoId, TodoItem};
use crate::store::{created_at_from_id, AppState};

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum StorageError {
    #[error("local store unavailable: {message}")]
    Unavailable { message: String },

    #[error("quota exceeded writing '{key}' ({size} bytes)")]
    QuotaExceeded { key: String, size: usize },

    #[error("serialization error: {message}")]
    Serialization { message: String },

    #[error("storage backend error: {message}")]
    Backend { message: String },
}

impl StorageError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// String-keyed local store, shaped after the browser's `localStorage`.
pub trait LocalStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-process store with an optional byte quota (key + value lengths).
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota_bytes: Option<usize>,
    available: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            quota_bytes: None,
            available: true,
        }
    }

    #[must_use]
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::new()
        }
    }

    /// A store on which every call fails, like storage disabled by the
    /// browser.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.available {
            Ok(())
        } else {
            Err(StorageError::Unavailable {
                message: "memory store disabled".into(),
            })
        }
    }
}

impl LocalStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(self.entries.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;
        if let Some(quota) = self.quota_bytes {
            let replaced = self.entries.get(key).map_or(0, |old| key.len() + old.len());
            let projected = self.used_bytes() - replaced + key.len() + value.len();
            if projected > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    size: value.len(),
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        self.entries.remove(key);
        Ok(())
    }
}

/// What `load` recovers from the local store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    pub items: Vec<TodoItem>,
    pub theme: Theme,
}

#[instrument(skip_all, fields(items_key = %keys.items, theme_key = %keys.theme))]
pub fn load<S: LocalStore + ?Sized>(store: &S, keys: &StorageKeys) -> PersistedState {
    let items = match store.get_item(&keys.items) {
        Ok(raw) => decode_items(raw.as_deref().map(str::as_bytes)),
        Err(e) => {
            warn!(error = %e, "failed to read items, starting empty");
            Vec::new()
        }
    };
    let theme = match store.get_item(&keys.theme) {
        Ok(raw) => decode_theme(raw.as_deref().map(str::as_bytes)),
        Err(e) => {
            warn!(error = %e, "failed to read theme, using default");
            Theme::default()
        }
    };
    debug!(count = items.len(), theme = theme.as_str(), "loaded persisted state");
    PersistedState { items, theme }
}

/// Writes items and theme. Both writes are attempted; the first failure is
/// returned.
#[instrument(skip_all, fields(items_key = %keys.items, theme_key = %keys.theme))]
pub fn save<S: LocalStore + ?Sized>(
    store: &mut S,
    keys: &StorageKeys,
    state: &AppState,
) -> Result<(), StorageError> {
    let items_result =
        encode_items(state.items()).and_then(|json| store.set_item(&keys.items, &json));
    let theme_result = store.set_item(&keys.theme, encode_theme(state.theme()));
    items_result.and(theme_result)
}

pub fn encode_items(items: &[TodoItem]) -> Result<String, StorageError> {
    serde_json::to_string(items).map_err(|e| StorageError::Serialization {
        message: e.to_string(),
    })
}

#[must_use]
pub const fn encode_theme(theme: Theme) -> &'static str {
    theme.as_str()
}

/// Record shape accepted on read. Only `id` and `text` are required so that
/// lists written before categories, priorities and timestamps existed still
/// load. The remaining fields are read as raw JSON and fall back to defaults
/// when they do not parse, so one odd field never costs the whole record.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTodo {
    id: TodoId,
    text: String,
    #[serde(default)]
    completed: Option<serde_json::Value>,
    #[serde(default)]
    category: Option<serde_json::Value>,
    #[serde(default)]
    priority: Option<serde_json::Value>,
    #[serde(default)]
    due_date: Option<serde_json::Value>,
    #[serde(default)]
    created_at: Option<serde_json::Value>,
}

fn lenient_str(value: Option<&serde_json::Value>) -> Option<&str> {
    value.and_then(serde_json::Value::as_str).map(str::trim)
}

/// Accepts `YYYY-MM-DD` or the date part of an RFC 3339 timestamp.
fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

impl From<StoredTodo> for TodoItem {
    fn from(stored: StoredTodo) -> Self {
        let completed = stored
            .completed
            .as_ref()
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        let category = lenient_str(stored.category.as_ref())
            .map(Category::new)
            .unwrap_or_default();
        let priority = lenient_str(stored.priority.as_ref())
            .and_then(|raw| {
                Priority::ALL
                    .into_iter()
                    .find(|p| p.as_str().eq_ignore_ascii_case(raw))
            })
            .unwrap_or_default();
        let due_date = lenient_str(stored.due_date.as_ref()).and_then(parse_due_date);
        let created_at = lenient_str(stored.created_at.as_ref())
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map_or_else(
                || created_at_from_id(stored.id),
                |dt| dt.with_timezone(&Utc),
            );

        Self {
            id: stored.id,
            text: stored.text.trim().to_string(),
            completed,
            category,
            priority,
            due_date,
            created_at,
        }
    }
}

/// Decodes the items entry. Missing or unparseable data yields an empty
/// list; individual bad records, blank texts and repeated ids are skipped.
#[must_use]
pub fn decode_items(raw: Option<&[u8]>) -> Vec<TodoItem> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let records: Vec<serde_json::Value> = match serde_json::from_slice(raw) {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "persisted items are malformed, starting empty");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let item: TodoItem = match serde_json::from_value::<StoredTodo>(record) {
            Ok(stored) => stored.into(),
            Err(e) => {
                warn!(index, error = %e, "skipping unreadable todo record");
                continue;
            }
        };
        if item.text.is_empty() {
            warn!(index, id = %item.id, "skipping todo with blank text");
            continue;
        }
        if !seen.insert(item.id) {
            warn!(index, id = %item.id, "skipping todo with duplicate id");
            continue;
        }
        items.push(item);
    }
    items
}

#[must_use]
pub fn decode_theme(raw: Option<&[u8]>) -> Theme {
    let Some(raw) = raw else {
        return Theme::default();
    };
    let parsed = std::str::from_utf8(raw)
        .ok()
        .and_then(|s| Theme::parse(s.trim().trim_matches('"')));
    parsed.unwrap_or_else(|| {
        warn!("persisted theme is malformed, using default");
        Theme::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TodoDraft;
    use chrono::TimeZone;

    fn keys() -> StorageKeys {
        StorageKeys::default()
    }

    fn sample_state() -> AppState {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        AppState::default()
            .add_todo(TodoDraft::new("Work task").with_category("work"), now)
            .add_todo(
                TodoDraft::new("Pay rent")
                    .with_priority(Priority::High)
                    .with_due_date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
                now,
            )
            .set_theme(Theme::Dark)
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut store = MemoryStore::new();
        let state = sample_state();
        let state = state.toggle_todo(state.items()[0].id);

        save(&mut store, &keys(), &state).unwrap();
        let loaded = load(&store, &keys());

        assert_eq!(loaded.items, state.items());
        assert_eq!(loaded.theme, Theme::Dark);
        assert_eq!(store.get_item("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn empty_store_loads_defaults() {
        let loaded = load(&MemoryStore::new(), &keys());
        assert_eq!(loaded, PersistedState::default());
    }

    #[test]
    fn unavailable_store_fails_soft_on_load_and_reports_on_save() {
        let mut store = MemoryStore::unavailable();
        assert_eq!(load(&store, &keys()), PersistedState::default());

        let err = save(&mut store, &keys(), &sample_state()).unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));
    }

    #[test]
    fn quota_failure_is_reported_but_theme_still_written() {
        let mut store = MemoryStore::with_quota(32);
        let err = save(&mut store, &keys(), &sample_state()).unwrap_err();

        assert!(err.is_quota());
        assert_eq!(store.get_item("todos").unwrap(), None);
        assert_eq!(store.get_item("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn malformed_items_load_as_empty() {
        assert!(decode_items(Some(b"{not json")).is_empty());
        assert!(decode_items(Some(b"{\"id\":1}")).is_empty());
        assert!(decode_items(Some(&[0xff, 0xfe])).is_empty());
        assert!(decode_items(None).is_empty());
    }

    #[test]
    fn legacy_records_get_defaults() {
        let raw = br#"[{"id":1700000000000,"text":"Old todo","completed":true}]"#;
        let items = decode_items(Some(raw));

        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert!(item.completed);
        assert_eq!(item.category.as_str(), "personal");
        assert_eq!(item.priority, Priority::Medium);
        assert_eq!(item.due_date, None);
        assert_eq!(
            item.created_at,
            Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
        );
    }

    #[test]
    fn bad_records_are_skipped_individually() {
        let raw = br#"[
            {"id":1,"text":"keep"},
            {"id":"two","text":"wrong id type"},
            {"id":3,"text":"   "},
            {"id":1,"text":"duplicate"},
            {"id":4,"text":"also keep","priority":"low"}
        ]"#;
        let items = decode_items(Some(raw));
        let texts: Vec<&str> = items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["keep", "also keep"]);
        assert_eq!(items[1].priority, Priority::Low);
    }

    #[test]
    fn odd_optional_fields_fall_back_instead_of_dropping_the_record() {
        let raw = br#"[
            {"id":1,"text":"empty due","completed":false,"category":"work","priority":"high","dueDate":""},
            {"id":2,"text":"iso due","dueDate":"2024-05-06T00:00:00.000Z"},
            {"id":3,"text":"null completed","completed":null},
            {"id":4,"text":"odd priority","priority":"urgent","category":7,"createdAt":"yesterday"}
        ]"#;
        let items = decode_items(Some(raw));

        assert_eq!(items.len(), 4);
        assert_eq!(items[0].due_date, None);
        assert_eq!(items[0].priority, Priority::High);
        assert_eq!(items[0].category.as_str(), "work");
        assert_eq!(items[1].due_date, NaiveDate::from_ymd_opt(2024, 5, 6));
        assert!(!items[2].completed);
        assert_eq!(items[3].priority, Priority::Medium);
        assert_eq!(items[3].category.as_str(), "personal");
        assert_eq!(items[3].created_at, created_at_from_id(TodoId(4)));
    }

    #[test]
    fn theme_decoding_is_lenient_about_quotes_and_defaults_otherwise() {
        assert_eq!(decode_theme(Some(b"dark")), Theme::Dark);
        assert_eq!(decode_theme(Some(b"\"dark\"")), Theme::Dark);
        assert_eq!(decode_theme(Some(b"purple")), Theme::Light);
        assert_eq!(decode_theme(None), Theme::Light);
    }

    #[test]
    fn memory_store_quota_accounts_for_replacement() {
        let mut store = MemoryStore::with_quota(10);
        store.set_item("k", "123456789").unwrap();
        // replacing the value frees the old bytes first
        store.set_item("k", "987654321").unwrap();
        assert!(store.set_item("j", "x").unwrap_err().is_quota());
        store.remove_item("k").unwrap();
        assert_eq!(store.used_bytes(), 0);
    }
}
