use crate::model::{Filter, TodoItem};

/// Items admitted by `filter` whose text or category contains `search_term`
/// (case-insensitive), in their original order. A blank term matches
/// everything.
#[must_use]
pub fn visible_todos<'a>(
    items: &'a [TodoItem],
    filter: Filter,
    search_term: &str,
) -> Vec<&'a TodoItem> {
    let needle = search_term.trim().to_lowercase();
    items
        .iter()
        .filter(|item| filter.admits(item))
        .filter(|item| needle.is_empty() || matches_search(item, &needle))
        .collect()
}

/// `needle` must already be lowercased.
fn matches_search(item: &TodoItem, needle: &str) -> bool {
    item.text.to_lowercase().contains(needle)
        || item.category.as_str().to_lowercase().contains(needle)
}
