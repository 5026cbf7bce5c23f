use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{Priority, TodoItem};

/// Aggregate counts over the complete item list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    /// Rounded down; 0 for an empty list.
    pub completion_percent: u8,
    /// Only categories that occur.
    pub by_category: BTreeMap<String, usize>,
    /// Always holds all three priorities.
    pub by_priority: BTreeMap<Priority, usize>,
}

#[must_use]
pub fn compute_stats(items: &[TodoItem]) -> Stats {
    let mut by_category = BTreeMap::new();
    let mut by_priority: BTreeMap<Priority, usize> =
        Priority::ALL.iter().map(|p| (*p, 0)).collect();
    let mut completed = 0;

    for item in items {
        if item.completed {
            completed += 1;
        }
        *by_category
            .entry(item.category.as_str().to_string())
            .or_insert(0) += 1;
        *by_priority.entry(item.priority).or_insert(0) += 1;
    }

    let total = items.len();
    let completion_percent = if total == 0 {
        0
    } else {
        u8::try_from(completed * 100 / total).unwrap_or(100)
    };

    Stats {
        total,
        completed,
        active: total - completed,
        completion_percent,
        by_category,
        by_priority,
    }
}
