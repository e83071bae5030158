use std::collections::BTreeSet;

use serde::Serialize;

use super::mirrored_issue::IssueState;

/// Which fields of an existing mirrored issue are out of date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FieldChanges {
    pub body: bool,
    pub labels: bool,
    pub state: bool,
}

impl FieldChanges {
    pub fn any(&self) -> bool {
        self.body || self.labels || self.state
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.body {
            names.push("body");
        }
        if self.labels {
            names.push("labels");
        }
        if self.state {
            names.push("state");
        }
        names
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncDecision {
    Create {
        title: String,
        body: String,
        labels: BTreeSet<String>,
        state: IssueState,
    },
    /// Always carries the full body, label set and state, whichever field differed.
    Update {
        number: u64,
        body: String,
        labels: BTreeSet<String>,
        state: IssueState,
        changes: FieldChanges,
    },
    NoOp {
        number: u64,
    },
}

impl SyncDecision {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::NoOp { .. } => "noop",
        }
    }
}

/// The decision for one tracked item, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSync {
    pub key: String,
    pub title: String,
    pub decision: SyncDecision,
}
