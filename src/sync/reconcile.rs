//! Per-item create/update/no-op decisions.
//!
//! Tracked items are joined to mirrored issues by exact title. The title
//! embeds the Jira key, so it works as a natural key, but nothing enforces
//! uniqueness: when several mirrored issues share a title the first one listed
//! wins, and two tracked items that render the same title bind to that same
//! issue.

use std::collections::{BTreeSet, HashMap};

use crate::model::decision::{FieldChanges, PlannedSync, SyncDecision};
use crate::model::mirrored_issue::{IssueState, MirroredIssue};
use crate::model::tracked_item::TrackedItem;

use super::format::{build_body, build_title};
use super::labels::derive_labels;

/// Title lookup over the mirrored issues fetched for this run.
pub struct MirrorIndex<'a> {
    by_title: HashMap<&'a str, &'a MirroredIssue>,
}

impl<'a> MirrorIndex<'a> {
    pub fn new(issues: &'a [MirroredIssue]) -> Self {
        let mut by_title = HashMap::with_capacity(issues.len());
        for issue in issues {
            by_title.entry(issue.title.as_str()).or_insert(issue);
        }
        Self { by_title }
    }

    pub fn find(&self, title: &str) -> Option<&'a MirroredIssue> {
        self.by_title.get(title).copied()
    }
}

pub fn target_state(item: &TrackedItem) -> IssueState {
    if item.status_category.is_terminal() {
        IssueState::Closed
    } else {
        IssueState::Open
    }
}

pub fn decide(item: &TrackedItem, index: &MirrorIndex<'_>, jira_base_url: &str) -> PlannedSync {
    let title = build_title(item);
    let body = build_body(item, jira_base_url);
    let labels = derive_labels(item);
    let state = target_state(item);

    let decision = match index.find(&title) {
        None => SyncDecision::Create {
            title: title.clone(),
            body,
            labels,
            state,
        },
        Some(existing) => {
            let existing_labels: BTreeSet<&str> =
                existing.labels.iter().map(String::as_str).collect();
            let wanted_labels: BTreeSet<&str> = labels.iter().map(String::as_str).collect();
            let changes = FieldChanges {
                body: existing.body != body,
                labels: existing_labels != wanted_labels,
                state: existing.state != state,
            };
            if changes.any() {
                SyncDecision::Update {
                    number: existing.number,
                    body,
                    labels,
                    state,
                    changes,
                }
            } else {
                SyncDecision::NoOp {
                    number: existing.number,
                }
            }
        }
    };

    PlannedSync {
        key: item.key.clone(),
        title,
        decision,
    }
}

/// One decision per tracked item, in the order the items were fetched.
pub fn plan(
    items: &[TrackedItem],
    mirrors: &[MirroredIssue],
    jira_base_url: &str,
) -> Vec<PlannedSync> {
    let index = MirrorIndex::new(mirrors);
    items
        .iter()
        .map(|item| decide(item, &index, jira_base_url))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tracked_item::StatusCategory;

    const BASE: &str = "https://acme.atlassian.net";

    fn item(key: &str, summary: &str, status: &str, category: StatusCategory) -> TrackedItem {
        TrackedItem {
            key: key.into(),
            summary: summary.into(),
            status_name: status.into(),
            status_category: category,
            epic_key: None,
            parent_key: None,
            description: None,
        }
    }

    fn fix_login() -> TrackedItem {
        item("XYZ-1", "Fix login", "To Do", StatusCategory::ToDo)
    }

    /// A mirrored issue exactly matching what `it` renders to, in `state`.
    fn mirror_of(it: &TrackedItem, number: u64, state: IssueState) -> MirroredIssue {
        MirroredIssue {
            number,
            title: build_title(it),
            body: build_body(it, BASE),
            labels: derive_labels(it).into_iter().collect(),
            state,
        }
    }

    fn labels(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn new_item_without_mirror_is_created_open() {
        let planned = plan(&[fix_login()], &[], BASE);
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].key, "XYZ-1");
        match &planned[0].decision {
            SyncDecision::Create {
                title,
                labels: got,
                state,
                ..
            } => {
                assert_eq!(title, "[JIRA XYZ-1] Fix login");
                assert_eq!(*state, IssueState::Open);
                assert_eq!(*got, labels(&["synced-from-jira", "jira-status:to-do"]));
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[test]
    fn done_item_with_open_mirror_updates_only_state() {
        let todo = fix_login();
        let mut done = todo.clone();
        done.status_category = StatusCategory::Done;
        // Same status name so body and labels are unchanged.
        let mirror = mirror_of(&todo, 7, IssueState::Open);

        let planned = plan(&[done], &[mirror], BASE);
        match &planned[0].decision {
            SyncDecision::Update {
                number,
                state,
                changes,
                ..
            } => {
                assert_eq!(*number, 7);
                assert_eq!(*state, IssueState::Closed);
                assert_eq!(
                    *changes,
                    FieldChanges {
                        body: false,
                        labels: false,
                        state: true
                    }
                );
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn identical_mirror_is_noop() {
        let it = fix_login();
        let mirror = mirror_of(&it, 3, IssueState::Open);
        let planned = plan(&[it], &[mirror], BASE);
        assert_eq!(planned[0].decision, SyncDecision::NoOp { number: 3 });
    }

    #[test]
    fn label_order_does_not_matter() {
        let it = fix_login();
        let mut mirror = mirror_of(&it, 3, IssueState::Open);
        mirror.labels.reverse();
        let planned = plan(&[it], &[mirror], BASE);
        assert_eq!(planned[0].decision, SyncDecision::NoOp { number: 3 });
    }

    #[test]
    fn extra_label_on_mirror_triggers_full_update() {
        let it = fix_login();
        let mut mirror = mirror_of(&it, 3, IssueState::Open);
        mirror.labels.push("needs-triage".into());

        let planned = plan(&[it.clone()], &[mirror], BASE);
        match &planned[0].decision {
            SyncDecision::Update {
                body,
                labels,
                changes,
                ..
            } => {
                assert!(changes.labels && !changes.body && !changes.state);
                assert_eq!(*body, build_body(&it, BASE));
                assert_eq!(*labels, derive_labels(&it));
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn edited_body_is_overwritten() {
        let it = fix_login();
        let mut mirror = mirror_of(&it, 3, IssueState::Open);
        mirror.body.push_str("\n\nedited on GitHub");
        let planned = plan(&[it], &[mirror], BASE);
        assert!(matches!(
            planned[0].decision,
            SyncDecision::Update { changes: FieldChanges { body: true, .. }, .. }
        ));
    }

    #[test]
    fn status_rename_changes_body_and_labels() {
        let old = fix_login();
        let mut renamed = old.clone();
        renamed.status_name = "In Progress".into();
        renamed.status_category = StatusCategory::InProgress;
        let mirror = mirror_of(&old, 4, IssueState::Open);

        let planned = plan(&[renamed], &[mirror], BASE);
        match &planned[0].decision {
            SyncDecision::Update { labels, changes, state, .. } => {
                assert!(changes.body && changes.labels && !changes.state);
                assert_eq!(*state, IssueState::Open);
                assert!(labels.contains("jira-status:in-progress"));
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn reopened_item_reopens_closed_mirror() {
        let it = fix_login();
        let mirror = mirror_of(&it, 5, IssueState::Closed);
        let planned = plan(&[it], &[mirror], BASE);
        assert!(matches!(
            planned[0].decision,
            SyncDecision::Update { state: IssueState::Open, .. }
        ));
    }

    #[test]
    fn title_match_is_exact() {
        let it = fix_login();
        let mut mirror = mirror_of(&it, 3, IssueState::Open);
        mirror.title = mirror.title.to_uppercase();
        let planned = plan(&[it], &[mirror], BASE);
        assert_eq!(planned[0].decision.action(), "create");
    }

    #[test]
    fn duplicate_titles_bind_to_first_listed_mirror() {
        // Known limitation: title is the only join key.
        let first = fix_login();
        let mut second = fix_login();
        second.status_name = "In Progress".into();
        let mirrors = vec![
            mirror_of(&first, 10, IssueState::Open),
            mirror_of(&first, 11, IssueState::Open),
        ];

        let planned = plan(&[first, second], &mirrors, BASE);
        assert_eq!(planned[0].decision, SyncDecision::NoOp { number: 10 });
        match &planned[1].decision {
            SyncDecision::Update { number, .. } => assert_eq!(*number, 10),
            other => panic!("expected update of #10, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_titles_without_mirror_both_create() {
        let planned = plan(&[fix_login(), fix_login()], &[], BASE);
        assert!(planned.iter().all(|p| p.decision.action() == "create"));
    }

    #[test]
    fn decisions_follow_source_order() {
        let items = vec![
            item("XYZ-3", "c", "To Do", StatusCategory::ToDo),
            item("XYZ-1", "a", "To Do", StatusCategory::ToDo),
            item("XYZ-2", "b", "To Do", StatusCategory::ToDo),
        ];
        let keys: Vec<_> = plan(&items, &[], BASE).into_iter().map(|p| p.key).collect();
        assert_eq!(keys, ["XYZ-3", "XYZ-1", "XYZ-2"]);
    }

    #[test]
    fn second_pass_over_created_mirrors_is_all_noop() {
        let items = vec![
            fix_login(),
            item("XYZ-2", "Add SSO", "In Progress", StatusCategory::InProgress),
            item("XYZ-3", "Old bug", "Closed", StatusCategory::Done),
        ];

        let first = plan(&items, &[], BASE);
        let mirrors: Vec<MirroredIssue> = first
            .iter()
            .enumerate()
            .map(|(i, p)| match &p.decision {
                SyncDecision::Create { title, body, labels, state } => MirroredIssue {
                    number: i as u64 + 1,
                    title: title.clone(),
                    body: body.clone(),
                    labels: labels.iter().cloned().collect(),
                    state: *state,
                },
                other => panic!("expected create, got {other:?}"),
            })
            .collect();

        let second = plan(&items, &mirrors, BASE);
        assert!(second
            .iter()
            .all(|p| matches!(p.decision, SyncDecision::NoOp { .. })));
    }
}
