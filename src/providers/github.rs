use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::{self, HttpPolicy, Retry};
use super::MirrorProvider;
use crate::config::GitHubConfig;
use crate::error::TransportError;
use crate::model::mirrored_issue::{IssueState, MirroredIssue};

const SERVICE: &str = "GitHub";
const PAGE_SIZE: u32 = 100;
const API_VERSION: &str = "2022-11-28";

pub struct GitHubProvider {
    issues_url: String,
    token: String,
    client: reqwest::Client,
    policy: HttpPolicy,
}

impl GitHubProvider {
    pub fn new(config: &GitHubConfig, policy: HttpPolicy) -> Result<Self, TransportError> {
        Ok(Self {
            issues_url: format!("{}/repos/{}/issues", config.api_url, config.repository),
            token: config.token.clone(),
            client: policy.client()?,
            policy,
        })
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    fn list_url(&self) -> String {
        format!("{}?state=all&per_page={PAGE_SIZE}", self.issues_url)
    }

    fn issue_url(&self, number: u64) -> String {
        format!("{}/{number}", self.issues_url)
    }
}

#[derive(Deserialize)]
struct GhIssue {
    number: u64,
    title: String,
    body: Option<String>,
    state: IssueState,
    #[serde(default)]
    labels: Vec<GhLabel>,
    /// Present when the "issue" is really a pull request.
    pull_request: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct GhLabel {
    name: String,
}

#[derive(Deserialize)]
struct GhCreated {
    number: u64,
}

#[derive(Serialize)]
struct CreatePayload<'a> {
    title: &'a str,
    body: &'a str,
    labels: &'a BTreeSet<String>,
}

#[derive(Serialize)]
struct UpdatePayload<'a> {
    body: &'a str,
    labels: &'a BTreeSet<String>,
    state: IssueState,
}

fn into_mirrored(issues: Vec<GhIssue>) -> Vec<MirroredIssue> {
    issues
        .into_iter()
        .filter(|issue| issue.pull_request.is_none())
        .map(|issue| MirroredIssue {
            number: issue.number,
            title: issue.title,
            body: issue.body.unwrap_or_default(),
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
            state: issue.state,
        })
        .collect()
}

#[async_trait]
impl MirrorProvider for GitHubProvider {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn list_issues(&self) -> Result<Vec<MirroredIssue>, TransportError> {
        let url = self.list_url();
        tracing::info!(%url, "fetching GitHub issues");
        let issues: Vec<GhIssue> =
            http::send_json(SERVICE, &self.policy, Retry::Transient, || {
                self.request(reqwest::Method::GET, &url)
            })
                .await?;
        let issues = into_mirrored(issues);
        tracing::info!(count = issues.len(), "fetched GitHub issues");
        Ok(issues)
    }

    async fn create_issue(
        &self,
        title: &str,
        body: &str,
        labels: &BTreeSet<String>,
        state: IssueState,
    ) -> Result<u64, TransportError> {
        tracing::info!(%title, "creating GitHub issue");
        let payload = CreatePayload {
            title,
            body,
            labels,
        };
        // Re-sending a create that reached GitHub would open a duplicate issue.
        let created: GhCreated = http::send_json(SERVICE, &self.policy, Retry::UnsentOnly, || {
            self.request(reqwest::Method::POST, &self.issues_url)
                .json(&payload)
        })
        .await?;

        // The create endpoint always opens the issue.
        if state == IssueState::Closed {
            self.update_issue(created.number, body, labels, state).await?;
        }
        Ok(created.number)
    }

    async fn update_issue(
        &self,
        number: u64,
        body: &str,
        labels: &BTreeSet<String>,
        state: IssueState,
    ) -> Result<(), TransportError> {
        tracing::info!(number, %state, "updating GitHub issue");
        let payload = UpdatePayload {
            body,
            labels,
            state,
        };
        let url = self.issue_url(number);
        http::send(SERVICE, &self.policy, Retry::Transient, || {
            self.request(reqwest::Method::PATCH, &url).json(&payload)
        })
        .await?;
        Ok(())
    }
}
