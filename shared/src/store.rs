//! The todo state container.
//!
//! Every operation borrows the current [`AppState`] and returns the next one.
//! Items live behind an `Arc<[TodoItem]>`: an operation that changes nothing
//! hands back the same allocation and the same `version`, so observers can
//! detect change with [`AppState::shares_items_with`] or by comparing
//! versions.

use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::model::{Category, Filter, Theme, TodoDraft, TodoId, TodoItem};
use crate::persistence::PersistedState;

#[derive(Clone, Debug, PartialEq)]
pub struct AppState {
    items: Arc<[TodoItem]>,
    filter: Filter,
    search_term: String,
    theme: Theme,
    show_stats: bool,
    version: u64,
    last_id: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            items: Arc::from(Vec::new()),
            filter: Filter::default(),
            search_term: String::new(),
            theme: Theme::default(),
            show_stats: false,
            version: 0,
            last_id: 0,
        }
    }
}

impl AppState {
    #[must_use]
    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, id: TodoId) -> Option<&TodoItem> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn filter(&self) -> Filter {
        self.filter
    }

    #[must_use]
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    #[must_use]
    pub const fn theme(&self) -> Theme {
        self.theme
    }

    #[must_use]
    pub const fn show_stats(&self) -> bool {
        self.show_stats
    }

    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// True when both snapshots hold the very same item allocation.
    #[must_use]
    pub fn shares_items_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }

    fn with_items(&self, items: Vec<TodoItem>) -> Self {
        Self {
            items: Arc::from(items),
            version: self.version + 1,
            ..self.clone()
        }
    }

    fn bumped(mut self) -> Self {
        self.version += 1;
        self
    }

    /// Appends a new item built from `draft`. Blank text is rejected
    /// silently and yields an unchanged snapshot.
    #[must_use]
    pub fn add_todo(&self, draft: TodoDraft, now: DateTime<Utc>) -> Self {
        let text = draft.text.trim();
        if text.is_empty() {
            debug!("ignoring todo with blank text");
            return self.clone();
        }

        let id = self.next_id(now);
        let item = TodoItem {
            id,
            text: text.to_string(),
            completed: false,
            category: draft.category.map(Category::new).unwrap_or_default(),
            priority: draft.priority.unwrap_or_default(),
            due_date: draft.due_date,
            created_at: now,
        };
        debug!(%id, "todo added");

        let mut items = self.items.to_vec();
        items.push(item);
        let mut next = self.with_items(items);
        next.last_id = id.get();
        next
    }

    /// `max(now_ms, last_id + 1)`: timestamp-shaped and strictly increasing.
    fn next_id(&self, now: DateTime<Utc>) -> TodoId {
        let now_ms = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        TodoId(now_ms.max(self.last_id.saturating_add(1)))
    }

    #[must_use]
    pub fn toggle_todo(&self, id: TodoId) -> Self {
        if self.get(id).is_none() {
            return self.clone();
        }
        let items = self
            .items
            .iter()
            .map(|item| {
                if item.id == id {
                    TodoItem {
                        completed: !item.completed,
                        ..item.clone()
                    }
                } else {
                    item.clone()
                }
            })
            .collect();
        self.with_items(items)
    }

    #[must_use]
    pub fn delete_todo(&self, id: TodoId) -> Self {
        let Some(index) = self.items.iter().position(|item| item.id == id) else {
            return self.clone();
        };
        let mut items = self.items.to_vec();
        items.remove(index);
        self.with_items(items)
    }

    /// Replaces the text of an item. Blank or unchanged text is a no-op.
    #[must_use]
    pub fn update_todo(&self, id: TodoId, text: &str) -> Self {
        let text = text.trim();
        let unchanged = match self.get(id) {
            Some(item) => item.text == text,
            None => true,
        };
        if text.is_empty() || unchanged {
            return self.clone();
        }
        let items = self
            .items
            .iter()
            .map(|item| {
                if item.id == id {
                    TodoItem {
                        text: text.to_string(),
                        ..item.clone()
                    }
                } else {
                    item.clone()
                }
            })
            .collect();
        self.with_items(items)
    }

    #[must_use]
    pub fn clear_completed(&self) -> Self {
        if !self.items.iter().any(|item| item.completed) {
            return self.clone();
        }
        let items = self
            .items
            .iter()
            .filter(|item| !item.completed)
            .cloned()
            .collect();
        self.with_items(items)
    }

    #[must_use]
    pub fn set_filter(&self, filter: Filter) -> Self {
        if self.filter == filter {
            return self.clone();
        }
        Self {
            filter,
            ..self.clone()
        }
        .bumped()
    }

    #[must_use]
    pub fn set_search_term(&self, term: impl Into<String>) -> Self {
        let term = term.into();
        if self.search_term == term {
            return self.clone();
        }
        Self {
            search_term: term,
            ..self.clone()
        }
        .bumped()
    }

    #[must_use]
    pub fn set_theme(&self, theme: Theme) -> Self {
        if self.theme == theme {
            return self.clone();
        }
        Self {
            theme,
            ..self.clone()
        }
        .bumped()
    }

    #[must_use]
    pub fn set_show_stats(&self, show_stats: bool) -> Self {
        if self.show_stats == show_stats {
            return self.clone();
        }
        Self {
            show_stats,
            ..self.clone()
        }
        .bumped()
    }

    /// Installs items read from storage ahead of anything added during this
    /// session, and moves the id watermark past every loaded id. A session
    /// item whose id is already taken by a loaded one gets a fresh id.
    #[must_use]
    pub fn hydrate_items(&self, loaded: Vec<TodoItem>) -> Self {
        let loaded_ids: HashSet<TodoId> = loaded.iter().map(|item| item.id).collect();
        let max_loaded = loaded.iter().map(|item| item.id.get()).max().unwrap_or(0);
        let mut last_id = self.last_id.max(max_loaded);

        let mut items = loaded;
        for item in self.items.iter() {
            let mut item = item.clone();
            if loaded_ids.contains(&item.id) {
                last_id += 1;
                debug!(old = %item.id, new = last_id, "re-keying session todo that clashes with stored id");
                item.id = TodoId(last_id);
            }
            items.push(item);
        }

        let mut next = self.with_items(items);
        next.last_id = last_id;
        next
    }

    #[must_use]
    pub fn hydrate(&self, persisted: PersistedState) -> Self {
        self.hydrate_items(persisted.items).set_theme(persisted.theme)
    }
}

/// Timestamp used for records that predate `createdAt`: the millisecond id.
pub(crate) fn created_at_from_id(id: TodoId) -> DateTime<Utc> {
    i64::try_from(id.get())
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or_default()
}
