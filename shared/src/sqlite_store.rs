//! SQLite-backed [`LocalStore`] for native shells.

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use tracing::{debug, instrument};

use crate::persistence::{LocalStore, StorageError};

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path.as_ref()).map_err(|e| StorageError::Unavailable {
            message: e.to_string(),
        })?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|e| StorageError::Unavailable {
            message: e.to_string(),
        })?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS local_store (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            );
            "#,
        )
        .map_err(map_sqlite_error)?;
        debug!("local store ready");
        Ok(Self { conn })
    }
}

fn map_sqlite_error(e: rusqlite::Error) -> StorageError {
    match e.sqlite_error_code() {
        Some(ErrorCode::DiskFull) => StorageError::QuotaExceeded {
            key: String::new(),
            size: 0,
        },
        Some(ErrorCode::CannotOpen | ErrorCode::PermissionDenied | ErrorCode::ReadOnly) => {
            StorageError::Unavailable {
                message: e.to_string(),
            }
        }
        _ => StorageError::backend(e.to_string()),
    }
}

impl LocalStore for SqliteStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.conn
            .query_row(
                "SELECT value FROM local_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_sqlite_error)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn
            .execute(
                r#"
                INSERT INTO local_store (key, value) VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value
                "#,
                params![key, value],
            )
            .map_err(|e| match map_sqlite_error(e) {
                StorageError::QuotaExceeded { .. } => StorageError::QuotaExceeded {
                    key: key.to_string(),
                    size: value.len(),
                },
                other => other,
            })?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM local_store WHERE key = ?1", params![key])
            .map_err(map_sqlite_error)?;
        Ok(())
    }
}
