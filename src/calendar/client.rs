//! Google Calendar API v3 client.
//!
//! Event inserts go through a retrying sender: 429/408/5xx and transport
//! timeouts are retried with capped exponential backoff, honoring
//! Retry-After when the API provides one.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::GoogleError;
use crate::types::CalendarEvent;

const CALENDAR_BASE: &str = "https://www.googleapis.com/calendar/v3";

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 2_000,
        }
    }
}

fn status_is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn retry_delay(
    attempt: u32,
    policy: &RetryPolicy,
    retry_after: Option<&reqwest::header::HeaderValue>,
) -> Duration {
    if let Some(value) = retry_after.and_then(|v| v.to_str().ok()) {
        if let Ok(secs) = value.parse::<u64>() {
            return Duration::from_secs(secs.min(30));
        }
    }

    let exponent = 2u64.saturating_pow(attempt.saturating_sub(1));
    let base = policy
        .initial_backoff_ms
        .saturating_mul(exponent)
        .min(policy.max_backoff_ms);
    Duration::from_millis(base)
}

pub async fn send_with_retry(
    request: reqwest::RequestBuilder,
    policy: &RetryPolicy,
) -> Result<reqwest::Response, GoogleError> {
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        let Some(cloned) = request.try_clone() else {
            return request.send().await.map_err(GoogleError::Http);
        };

        match cloned.send().await {
            Ok(response) => {
                let status = response.status();
                if status_is_retryable(status) && attempt < attempts {
                    let delay = retry_delay(
                        attempt,
                        policy,
                        response.headers().get(reqwest::header::RETRY_AFTER),
                    );
                    log::warn!(
                        "calendar retry {}/{} after status {} (sleep {:?})",
                        attempt,
                        attempts,
                        status,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                return Ok(response);
            }
            Err(err) => {
                if (err.is_timeout() || err.is_connect()) && attempt < attempts {
                    let delay = retry_delay(attempt, policy, None);
                    log::warn!(
                        "calendar retry {}/{} after transport error: {} (sleep {:?})",
                        attempt,
                        attempts,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                return Err(GoogleError::Http(err));
            }
        }
    }

    Err(GoogleError::Api {
        status: 0,
        message: "request exhausted retries".to_string(),
    })
}

/// Destination for synthesized events. The production implementation is
/// [`CalendarClient`]; tests substitute a recording sink.
#[async_trait]
pub trait CalendarSink: Send + Sync {
    async fn insert(&self, event: &CalendarEvent) -> Result<(), GoogleError>;
}

pub struct CalendarClient {
    http: reqwest::Client,
    access_token: String,
    base_url: String,
    retry: RetryPolicy,
}

impl CalendarClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        CalendarClient {
            http: reqwest::Client::new(),
            access_token: access_token.into(),
            base_url: CALENDAR_BASE.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    #[cfg(test)]
    fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        CalendarClient {
            http: reqwest::Client::new(),
            access_token: access_token.into(),
            base_url: base_url.into(),
            retry: RetryPolicy::default(),
        }
    }
}

#[async_trait]
impl CalendarSink for CalendarClient {
    async fn insert(&self, event: &CalendarEvent) -> Result<(), GoogleError> {
        let url = format!("{}/calendars/primary/events", self.base_url);
        let request = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(event);

        let response = send_with_retry(request, &self.retry).await?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GoogleError::AuthExpired);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GoogleError::Api {
                status: status.as_u16(),
                message,
            });
        }
        log::debug!("created calendar event: {}", event.summary);
        Ok(())
    }
}
