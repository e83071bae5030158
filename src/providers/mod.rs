pub mod github;
pub mod http;
pub mod jira;

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::model::mirrored_issue::{IssueState, MirroredIssue};
use crate::model::tracked_item::TrackedItem;

/// Upstream system holding the tracked items.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    fn name(&self) -> &str;
    /// The open working set, single page.
    async fn fetch_items(&self) -> Result<Vec<TrackedItem>, TransportError>;
}

/// Hosting-side issue tracker that receives the mirrored issues.
#[async_trait]
pub trait MirrorProvider: Send + Sync {
    fn name(&self) -> &str;
    /// All issues, open and closed, single page.
    async fn list_issues(&self) -> Result<Vec<MirroredIssue>, TransportError>;
    /// Returns the number of the new issue.
    async fn create_issue(
        &self,
        title: &str,
        body: &str,
        labels: &BTreeSet<String>,
        state: IssueState,
    ) -> Result<u64, TransportError>;
    async fn update_issue(
        &self,
        number: u64,
        body: &str,
        labels: &BTreeSet<String>,
        state: IssueState,
    ) -> Result<(), TransportError>;
}

#[cfg(test)]
pub mod test_server;
