use std::collections::BTreeSet;

use crate::model::tracked_item::TrackedItem;

/// Marks a GitHub issue as owned by this sync.
pub const SENTINEL_LABEL: &str = "synced-from-jira";
pub const MAX_LABEL_CHARS: usize = 50;

/// Lowercase, replace anything outside `[a-z0-9-_:.]` with `-`, cap at 50 chars.
pub fn safe_label(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' | '_' | ':' | '.' => c,
            _ => '-',
        })
        .take(MAX_LABEL_CHARS)
        .collect()
}

pub fn derive_labels(item: &TrackedItem) -> BTreeSet<String> {
    let mut labels = BTreeSet::new();
    labels.insert(SENTINEL_LABEL.to_string());
    labels.insert(safe_label(&format!("jira-status:{}", item.status_name)));
    if let Some(epic) = &item.epic_key {
        labels.insert(format!("epic:{epic}"));
    }
    if let Some(parent) = &item.parent_key {
        labels.insert(format!("parent:{parent}"));
    }
    labels
}
