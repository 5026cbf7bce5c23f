use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::model::{Filter, Theme, TodoDraft, TodoId};
use crate::persistence::StorageError;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    // Lifecycle
    AppStarted,
    Configure(Box<AppConfig>),

    // User intents
    AddTodo(TodoDraft),
    ToggleTodo { id: TodoId },
    DeleteTodo { id: TodoId },
    UpdateTodo { id: TodoId, text: String },
    ClearCompleted,
    SetFilter(Filter),
    SetSearchTerm(String),
    SetTheme(Theme),
    ToggleTheme,
    SetShowStats(bool),

    // Capability responses, never sent by the shell
    #[serde(skip)]
    ItemsLoaded(Result<Option<Vec<u8>>, StorageError>),
    #[serde(skip)]
    ThemeLoaded(Result<Option<Vec<u8>>, StorageError>),
    #[serde(skip)]
    Persisted {
        key: String,
        result: Result<(), StorageError>,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AppStarted => "app_started",
            Self::Configure(_) => "configure",
            Self::AddTodo(_) => "add_todo",
            Self::ToggleTodo { .. } => "toggle_todo",
            Self::DeleteTodo { .. } => "delete_todo",
            Self::UpdateTodo { .. } => "update_todo",
            Self::ClearCompleted => "clear_completed",
            Self::SetFilter(_) => "set_filter",
            Self::SetSearchTerm(_) => "set_search_term",
            Self::SetTheme(_) => "set_theme",
            Self::ToggleTheme => "toggle_theme",
            Self::SetShowStats(_) => "set_show_stats",
            Self::ItemsLoaded(_) => "items_loaded",
            Self::ThemeLoaded(_) => "theme_loaded",
            Self::Persisted { .. } => "persisted",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        !matches!(
            self,
            Self::AppStarted
                | Self::Configure(_)
                | Self::ItemsLoaded(_)
                | Self::ThemeLoaded(_)
                | Self::Persisted { .. }
        )
    }
}
