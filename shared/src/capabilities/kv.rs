use crux_kv::KeyValue;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::StorageKeys;
use crate::event::Event;
use crate::persistence::{encode_items, encode_theme, StorageError};
use crate::store::AppState;

pub type KvCapability = KeyValue<Event>;

pub const MAX_KEY_LENGTH: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KvKeyError {
    #[error("key cannot be empty or whitespace")]
    Blank,

    #[error("key exceeds maximum length of {max} bytes")]
    TooLong { max: usize },

    #[error("key contains control characters")]
    ControlCharacters,
}

pub fn validate_key(key: &str) -> Result<(), KvKeyError> {
    if key.trim().is_empty() {
        return Err(KvKeyError::Blank);
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(KvKeyError::TooLong {
            max: MAX_KEY_LENGTH,
        });
    }
    if key.chars().any(char::is_control) {
        return Err(KvKeyError::ControlCharacters);
    }
    Ok(())
}

/// Issues reads for both persisted entries. The shell answers with
/// `ItemsLoaded` and `ThemeLoaded`.
pub fn request_snapshot(kv: &KvCapability, keys: &StorageKeys) {
    debug!(items_key = %keys.items, theme_key = %keys.theme, "requesting persisted state");
    kv.get(keys.items.clone(), |result| {
        Event::ItemsLoaded(result.map_err(|e| StorageError::backend(e.to_string())))
    });
    kv.get(keys.theme.clone(), |result| {
        Event::ThemeLoaded(result.map_err(|e| StorageError::backend(e.to_string())))
    });
}

/// Writes the full items list and the theme. Every write reports back with
/// `Event::Persisted`; there is no coalescing, the last write wins.
pub fn write_snapshot(
    kv: &KvCapability,
    keys: &StorageKeys,
    state: &AppState,
) -> Result<(), StorageError> {
    let items = encode_items(state.items()).map_err(|e| {
        warn!(error = %e, "could not encode items for storage");
        e
    })?;

    write(kv, &keys.items, items.into_bytes());
    write(kv, &keys.theme, encode_theme(state.theme()).as_bytes().to_vec());
    Ok(())
}

fn write(kv: &KvCapability, key: &str, value: Vec<u8>) {
    let key = key.to_string();
    debug!(%key, bytes = value.len(), "writing to local store");
    kv.set(key.clone(), value, move |result| Event::Persisted {
        key,
        result: result
            .map(|_| ())
            .map_err(|e| StorageError::backend(e.to_string())),
    });
}
