use serde::{Deserialize, Serialize};

/// Jira status category, keyed the way the Jira REST API reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusCategory {
    ToDo,
    InProgress,
    Done,
    Other(String),
}

impl StatusCategory {
    pub fn from_key(key: &str) -> Self {
        match key {
            "new" => Self::ToDo,
            "indeterminate" => Self::InProgress,
            "done" => Self::Done,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::ToDo => "new",
            Self::InProgress => "indeterminate",
            Self::Done => "done",
            Self::Other(key) => key,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl Default for StatusCategory {
    fn default() -> Self {
        Self::Other("undefined".into())
    }
}

impl From<String> for StatusCategory {
    fn from(key: String) -> Self {
        Self::from_key(&key)
    }
}

impl From<StatusCategory> for String {
    fn from(category: StatusCategory) -> Self {
        category.key().to_string()
    }
}

/// Snapshot of one Jira issue, fetched once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedItem {
    pub key: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub status_name: String,
    #[serde(default)]
    pub status_category: StatusCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epic_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<String>,
    /// Raw description field: an ADF document, a plain string, or null.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<serde_json::Value>,
}
