//! One reconciliation run: fetch both sides, plan, apply, report.

pub mod format;
pub mod labels;
pub mod reconcile;
pub mod report;

use chrono::Utc;
use futures::{StreamExt, TryStreamExt};

use crate::error::{SyncError, TransportError};
use crate::model::decision::{PlannedSync, SyncDecision};
use crate::providers::{MirrorProvider, SourceProvider};
use report::SyncReport;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Jira base URL used for the links in issue bodies.
    pub jira_base_url: String,
    /// Maximum writes in flight; 1 applies decisions strictly in source order.
    pub concurrency: usize,
    pub dry_run: bool,
}

/// Fetch failures abort before anything is written; the first failed write
/// stops the run and no further writes are started.
pub async fn run(
    source: &dyn SourceProvider,
    mirror: &dyn MirrorProvider,
    opts: &RunOptions,
) -> Result<SyncReport, SyncError> {
    let started_at = Utc::now();

    let items = source.fetch_items().await?;
    let mirrors = mirror.list_issues().await?;

    tracing::info!(
        source = source.name(),
        mirror = mirror.name(),
        items = items.len(),
        mirrored = mirrors.len(),
        "planning sync"
    );

    let planned = reconcile::plan(&items, &mirrors, &opts.jira_base_url);
    let mut report = SyncReport::new(started_at, opts.dry_run, &planned);
    for p in &planned {
        match &p.decision {
            SyncDecision::NoOp { number } => {
                tracing::debug!(key = %p.key, number, "no update needed");
            }
            decision if opts.dry_run => {
                tracing::info!(key = %p.key, title = %p.title, action = decision.action(), "dry run");
            }
            _ => {}
        }
    }
    if opts.dry_run {
        return Ok(report);
    }

    let created = apply(mirror, &planned, opts.concurrency).await?;
    for (p, number) in planned.iter().zip(created) {
        if let Some(number) = number {
            report.set_created_number(&p.key, &p.title, number);
        }
    }

    tracing::info!(
        created = report.created,
        updated = report.updated,
        unchanged = report.unchanged,
        "sync complete"
    );
    Ok(report)
}

/// Returns, per planned item, the number of the issue it created (if any).
async fn apply(
    mirror: &dyn MirrorProvider,
    planned: &[PlannedSync],
    concurrency: usize,
) -> Result<Vec<Option<u64>>, TransportError> {
    futures::stream::iter(planned)
        .map(|p| apply_one(mirror, p))
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

async fn apply_one(
    mirror: &dyn MirrorProvider,
    p: &PlannedSync,
) -> Result<Option<u64>, TransportError> {
    match &p.decision {
        SyncDecision::Create {
            title,
            body,
            labels,
            state,
        } => {
            let number = mirror.create_issue(title, body, labels, *state).await?;
            tracing::info!(key = %p.key, number, "created mirrored issue");
            Ok(Some(number))
        }
        SyncDecision::Update {
            number,
            body,
            labels,
            state,
            changes,
        } => {
            mirror.update_issue(*number, body, labels, *state).await?;
            tracing::info!(
                key = %p.key,
                number,
                changes = ?changes.names(),
                "updated mirrored issue"
            );
            Ok(None)
        }
        SyncDecision::NoOp { .. } => Ok(None),
    }
}
