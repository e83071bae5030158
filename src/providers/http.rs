use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::SyncOptions;
use crate::error::TransportError;

pub const USER_AGENT: &str = concat!("jira-mirror/", env!("CARGO_PKG_VERSION"));

/// Timeout and retry settings shared by both API clients.
#[derive(Debug, Clone)]
pub struct HttpPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl From<&SyncOptions> for HttpPolicy {
    fn from(opts: &SyncOptions) -> Self {
        Self {
            timeout: opts.request_timeout,
            max_retries: opts.max_retries,
            base_delay: opts.retry_base_delay,
        }
    }
}

impl HttpPolicy {
    pub fn client(&self) -> Result<reqwest::Client, TransportError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| TransportError::Request {
                service: "http client",
                source,
            })
    }

    /// Delay before retry number `attempt` (1-based): base, 2x base, 4x base, ...
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Server errors and rate limiting are worth another attempt; other 4xx are not.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Which failures a request may be re-sent after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retry {
    /// Reads and full-state writes: any transient failure.
    Transient,
    /// Non-idempotent writes: only when the server cannot have acted on the
    /// request (connect failure or 429). A timeout or 5xx may follow a write
    /// that already happened.
    UnsentOnly,
}

impl Retry {
    fn status(self, status: StatusCode) -> bool {
        match self {
            Self::Transient => is_retryable_status(status),
            Self::UnsentOnly => status == StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn error(self, err: &reqwest::Error) -> bool {
        match self {
            Self::Transient => err.is_timeout() || err.is_connect(),
            Self::UnsentOnly => err.is_connect(),
        }
    }
}

/// Send a request built by `build`, retrying failures allowed by `retry`, and
/// return the first successful response.
pub async fn send(
    service: &'static str,
    policy: &HttpPolicy,
    retry: Retry,
    build: impl Fn() -> RequestBuilder,
) -> Result<Response, TransportError> {
    let mut attempt = 0;
    loop {
        let err = match build().send().await {
            Ok(resp) if resp.status().is_success() => return Ok(resp),
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                let retryable = retry.status(status);
                let err = TransportError::Status {
                    service,
                    status,
                    body,
                };
                if !retryable {
                    return Err(err);
                }
                err
            }
            Err(source) => {
                let retryable = retry.error(&source);
                let err = TransportError::Request { service, source };
                if !retryable {
                    return Err(err);
                }
                err
            }
        };

        attempt += 1;
        if attempt > policy.max_retries {
            return Err(err);
        }
        let delay = policy.backoff(attempt);
        tracing::warn!(
            service,
            attempt,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "transient failure, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

pub async fn send_json<T: DeserializeOwned>(
    service: &'static str,
    policy: &HttpPolicy,
    retry: Retry,
    build: impl Fn() -> RequestBuilder,
) -> Result<T, TransportError> {
    send(service, policy, retry, build)
        .await?
        .json()
        .await
        .map_err(|source| TransportError::Decode { service, source })
}
