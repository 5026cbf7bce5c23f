use serde::{Deserialize, Serialize};

use crate::filter::visible_todos;
use crate::model::{Filter, Priority, Theme, TodoId, TodoItem};
use crate::stats::{compute_stats, Stats};
use crate::store::AppState;

pub const EMPTY_LIST_MESSAGE: &str = "No todos yet. Add one above!";

/// Display fields of one visible item.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoView {
    pub id: TodoId,
    pub text: String,
    pub completed: bool,
    pub category: String,
    pub priority: Priority,
    /// `YYYY-MM-DD`
    pub due_date: Option<String>,
    /// RFC 3339
    pub created_at: String,
}

impl From<&TodoItem> for TodoView {
    fn from(item: &TodoItem) -> Self {
        Self {
            id: item.id,
            text: item.text.clone(),
            completed: item.completed,
            category: item.category.as_str().to_string(),
            priority: item.priority,
            due_date: item.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
            created_at: item.created_at.to_rfc3339(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewModel {
    pub items: Vec<TodoView>,
    pub filter: Filter,
    pub search_term: String,
    pub theme: Theme,
    pub show_stats: bool,
    pub stats: Stats,
    pub items_left_label: String,
    pub show_clear_completed: bool,
    pub empty_message: Option<String>,
    pub is_loaded: bool,
}

impl ViewModel {
    #[must_use]
    pub fn build(state: &AppState, is_loaded: bool) -> Self {
        let items: Vec<TodoView> =
            visible_todos(state.items(), state.filter(), state.search_term())
                .into_iter()
                .map(TodoView::from)
                .collect();
        let stats = compute_stats(state.items());

        Self {
            empty_message: items.is_empty().then(|| EMPTY_LIST_MESSAGE.to_string()),
            items,
            filter: state.filter(),
            search_term: state.search_term().to_string(),
            theme: state.theme(),
            show_stats: state.show_stats(),
            items_left_label: items_left_label(stats.active),
            show_clear_completed: stats.completed > 0,
            stats,
            is_loaded,
        }
    }
}

#[must_use]
pub fn items_left_label(active: usize) -> String {
    if active == 1 {
        "1 item left".to_string()
    } else {
        format!("{active} items left")
    }
}
