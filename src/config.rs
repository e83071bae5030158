use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_EPIC_FIELD: &str = "customfield_10008";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;
const DEFAULT_CONCURRENCY: usize = 1;

/// Fully resolved settings for one run, built once at startup.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub jira: JiraConfig,
    pub github: GitHubConfig,
    pub sync: SyncOptions,
}

#[derive(Debug, Clone)]
pub struct JiraConfig {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    pub project_key: String,
    pub epic_field: String,
}

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_url: String,
    pub token: String,
    /// `owner/name`
    pub repository: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub concurrency: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub jira: Option<FileJira>,
    pub github: Option<FileGitHub>,
    pub sync: Option<FileSync>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FileJira {
    pub base_url: Option<String>,
    pub email: Option<String>,
    pub api_token: Option<String>,
    pub project_key: Option<String>,
    pub epic_field: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FileGitHub {
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub repository: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FileSync {
    pub request_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
    pub concurrency: Option<usize>,
}

pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".jira-mirror")
        .join("config.toml")
}

/// Read the TOML file layer. An explicit path must exist; the default path is optional.
pub fn load_file(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = default_config_path();
            if !p.exists() {
                return Ok(FileConfig::default());
            }
            p
        }
    };
    let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
}

impl SyncConfig {
    /// Load the file layer, then apply the process environment on top.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let file = load_file(explicit)?;
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merge a file layer with an environment lookup; environment wins.
    pub fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let lookup = |key: &str, fallback: Option<String>| {
            env(key)
                .filter(|v| !v.trim().is_empty())
                .or(fallback.filter(|v| !v.trim().is_empty()))
                .map(|v| v.trim().to_string())
        };
        let required = |key: &'static str, fallback: Option<String>| {
            lookup(key, fallback).ok_or(ConfigError::Missing { key })
        };

        let fj = file.jira.unwrap_or_default();
        let fg = file.github.unwrap_or_default();
        let fs = file.sync.unwrap_or_default();

        let jira = JiraConfig {
            base_url: required("JIRA_BASE_URL", fj.base_url)?
                .trim_end_matches('/')
                .to_string(),
            email: required("JIRA_EMAIL", fj.email)?,
            api_token: required("JIRA_API_TOKEN", fj.api_token)?,
            project_key: required("JIRA_PROJECT_KEY", fj.project_key)?,
            epic_field: lookup("JIRA_EPIC_FIELD", fj.epic_field)
                .unwrap_or_else(|| DEFAULT_EPIC_FIELD.to_string()),
        };

        let repository = required("GITHUB_REPOSITORY", fg.repository)?;
        validate_repository(&repository)?;
        let github = GitHubConfig {
            api_url: lookup("GITHUB_API_URL", fg.api_url)
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            token: required("GITHUB_TOKEN", fg.token)?,
            repository,
        };

        let defaults = SyncOptions::default();
        let timeout_secs = number(
            "SYNC_REQUEST_TIMEOUT_SECS",
            env("SYNC_REQUEST_TIMEOUT_SECS"),
            fs.request_timeout_secs,
        )?
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "SYNC_REQUEST_TIMEOUT_SECS",
                reason: "must be at least 1".into(),
            });
        }
        let concurrency = number("SYNC_CONCURRENCY", env("SYNC_CONCURRENCY"), fs.concurrency)?
            .unwrap_or(defaults.concurrency);
        if concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "SYNC_CONCURRENCY",
                reason: "must be at least 1".into(),
            });
        }
        let sync = SyncOptions {
            request_timeout: Duration::from_secs(timeout_secs),
            max_retries: number("SYNC_MAX_RETRIES", env("SYNC_MAX_RETRIES"), fs.max_retries)?
                .unwrap_or(defaults.max_retries),
            retry_base_delay: Duration::from_millis(
                number(
                    "SYNC_RETRY_BASE_DELAY_MS",
                    env("SYNC_RETRY_BASE_DELAY_MS"),
                    fs.retry_base_delay_ms,
                )?
                .unwrap_or(DEFAULT_RETRY_BASE_DELAY_MS),
            ),
            concurrency,
        };

        Ok(Self { jira, github, sync })
    }
}

fn number<T: std::str::FromStr>(
    key: &'static str,
    from_env: Option<String>,
    from_file: Option<T>,
) -> Result<Option<T>, ConfigError> {
    match from_env.filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                key,
                reason: format!("expected a non-negative integer, got {raw:?}"),
            }),
        None => Ok(from_file),
    }
}

fn validate_repository(repository: &str) -> Result<(), ConfigError> {
    match repository.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(())
        }
        _ => Err(ConfigError::Invalid {
            key: "GITHUB_REPOSITORY",
            reason: format!("expected owner/name, got {repository:?}"),
        }),
    }
}
