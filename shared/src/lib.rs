// lib.rs - shared core of the todo app

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod capabilities;
pub mod config;
pub mod event;
pub mod filter;
pub mod model;
pub mod persistence;
pub mod stats;
pub mod store;
pub mod view;

#[cfg(not(target_arch = "wasm32"))]
pub mod sqlite_store;

pub use app::{App, Model};
pub use capabilities::{Capabilities, Effect};
pub use config::{AppConfig, ConfigError, StorageKeys};
pub use event::Event;
pub use filter::visible_todos;
pub use model::{Category, Filter, Priority, Theme, TodoDraft, TodoId, TodoItem};
pub use persistence::{load, save, LocalStore, MemoryStore, PersistedState, StorageError};
pub use stats::{compute_stats, Stats};
pub use store::AppState;
pub use view::{TodoView, ViewModel};

#[cfg(not(target_arch = "wasm32"))]
pub use sqlite_store::SqliteStore;

pub use crux_core::{render::Render, App as CruxApp};
