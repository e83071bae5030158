use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::http::{self, HttpPolicy, Retry};
use super::SourceProvider;
use crate::config::JiraConfig;
use crate::error::TransportError;
use crate::model::tracked_item::{StatusCategory, TrackedItem};

const SERVICE: &str = "Jira";
const PAGE_SIZE: u32 = 100;

pub struct JiraProvider {
    base_url: String,
    auth_header: String,
    project_key: String,
    epic_field: String,
    client: reqwest::Client,
    policy: HttpPolicy,
}

impl JiraProvider {
    pub fn new(config: &JiraConfig, policy: HttpPolicy) -> Result<Self, TransportError> {
        let creds = format!("{}:{}", config.email, config.api_token);
        let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
        Ok(Self {
            base_url: config.base_url.clone(),
            auth_header: format!("Basic {encoded}"),
            project_key: config.project_key.clone(),
            epic_field: config.epic_field.clone(),
            client: policy.client()?,
            policy,
        })
    }

    pub fn search_url(&self) -> String {
        let jql = format!("project={} AND statusCategory != Done", self.project_key);
        format!(
            "{}/rest/api/3/search?jql={}&maxResults={PAGE_SIZE}&fields=summary,description,status,parent,{}",
            self.base_url,
            urlencoding::encode(&jql),
            self.epic_field
        )
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

#[derive(Deserialize)]
struct JiraIssue {
    key: String,
    fields: IssueFields,
}

#[derive(Deserialize)]
struct IssueFields {
    summary: Option<String>,
    description: Option<Value>,
    status: Option<StatusField>,
    parent: Option<KeyRef>,
    /// Everything else, including the custom epic-link field.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusField {
    #[serde(default)]
    name: String,
    status_category: Option<CategoryField>,
}

#[derive(Deserialize)]
struct CategoryField {
    key: String,
}

#[derive(Deserialize)]
struct KeyRef {
    key: String,
}

/// Epic links come back either as a bare key or as an object with a `key`.
fn epic_key(extra: &Map<String, Value>, epic_field: &str) -> Option<String> {
    match extra.get(epic_field)? {
        Value::String(key) if !key.is_empty() => Some(key.clone()),
        Value::Object(obj) => obj.get("key").and_then(Value::as_str).map(String::from),
        _ => None,
    }
}

fn into_tracked_item(issue: JiraIssue, epic_field: &str) -> TrackedItem {
    let fields = issue.fields;
    let (status_name, status_category) = match fields.status {
        Some(status) => (
            status.name,
            status
                .status_category
                .map(|c| StatusCategory::from_key(&c.key))
                .unwrap_or_default(),
        ),
        None => (String::new(), StatusCategory::default()),
    };

    TrackedItem {
        epic_key: epic_key(&fields.extra, epic_field),
        key: issue.key,
        summary: fields.summary.unwrap_or_default(),
        status_name,
        status_category,
        parent_key: fields.parent.map(|p| p.key),
        description: fields.description.filter(|d| !d.is_null()),
    }
}

#[async_trait]
impl SourceProvider for JiraProvider {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn fetch_items(&self) -> Result<Vec<TrackedItem>, TransportError> {
        let url = self.search_url();
        tracing::info!(%url, "fetching Jira issues");

        let search: SearchResponse = http::send_json(SERVICE, &self.policy, Retry::Transient, || {
            self.client
                .get(&url)
                .header("Authorization", &self.auth_header)
                .header("Accept", "application/json")
        })
        .await?;

        let items: Vec<TrackedItem> = search
            .issues
            .into_iter()
            .map(|issue| into_tracked_item(issue, &self.epic_field))
            .collect();
        tracing::info!(count = items.len(), "fetched Jira issues");
        Ok(items)
    }
}
