use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::decision::{PlannedSync, SyncDecision};

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub key: String,
    pub title: String,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<&'static str>,
}

/// Outcome of one run. In dry-run mode the counts describe what would happen.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub dry_run: bool,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub entries: Vec<ReportEntry>,
}

impl SyncReport {
    pub fn new(started_at: DateTime<Utc>, dry_run: bool, planned: &[PlannedSync]) -> Self {
        let mut report = Self {
            started_at,
            dry_run,
            created: 0,
            updated: 0,
            unchanged: 0,
            entries: Vec::with_capacity(planned.len()),
        };
        for p in planned {
            let (number, changes) = match &p.decision {
                SyncDecision::Create { .. } => {
                    report.created += 1;
                    (None, Vec::new())
                }
                SyncDecision::Update {
                    number, changes, ..
                } => {
                    report.updated += 1;
                    (Some(*number), changes.names())
                }
                SyncDecision::NoOp { number } => {
                    report.unchanged += 1;
                    (Some(*number), Vec::new())
                }
            };
            report.entries.push(ReportEntry {
                key: p.key.clone(),
                title: p.title.clone(),
                action: p.decision.action(),
                number,
                changes,
            });
        }
        report
    }

    /// Record the issue number GitHub assigned to a created entry.
    pub fn set_created_number(&mut self, key: &str, title: &str, number: u64) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.action == "create" && e.number.is_none() && e.key == key && e.title == title)
        {
            entry.number = Some(number);
        }
    }

    pub fn summary(&self) -> String {
        let prefix = if self.dry_run { "Dry run: would have " } else { "" };
        format!(
            "{prefix}created {}, updated {}, unchanged {}",
            self.created, self.updated, self.unchanged
        )
    }

    /// Human-readable lines for every create and update.
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.action != "noop")
            .map(|e| match (e.action, e.number) {
                ("create", Some(n)) => format!("Created #{n}: {}", e.title),
                ("create", None) => format!("Create: {}", e.title),
                (_, Some(n)) => format!("Updated #{n} ({}): {}", e.changes.join(", "), e.title),
                (_, None) => format!("Update: {}", e.title),
            })
            .collect()
    }
}
