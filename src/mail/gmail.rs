//! Gmail API v1: fetch messages and flatten their bodies.
//!
//! Lists messages for a query, then fetches each with `format=full` and
//! runs the MIME tree through [`super::body::extract_body`] so downstream
//! consumers only ever see flattened text. Individual message fetch
//! failures are skipped, not fatal.

use serde::Deserialize;

use crate::error::GoogleError;
use crate::types::Email;

use super::body::{extract_body, MessagePart};

const GMAIL_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageStub>,
}

#[derive(Debug, Deserialize)]
struct MessageStub {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageDetail {
    #[serde(default)]
    id: String,
    #[serde(default)]
    payload: Option<FullPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FullPayload {
    #[serde(default)]
    headers: Vec<Header>,
    #[serde(flatten)]
    part: MessagePart,
}

#[derive(Debug, Deserialize)]
struct Header {
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: String,
}

/// Gmail fetch client. `base_url` is overridable for tests.
pub struct GmailClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for GmailClient {
    fn default() -> Self {
        GmailClient::new()
    }
}

impl GmailClient {
    pub fn new() -> Self {
        GmailClient {
            http: reqwest::Client::new(),
            base_url: GMAIL_BASE.to_string(),
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        GmailClient {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetch messages matching `query` and flatten each body to text.
    ///
    /// Mirrors the upstream behavior: list message ids, then fetch each in
    /// full. A message that fails to fetch is logged and skipped so one bad
    /// message never sinks the batch.
    pub async fn fetch_emails(
        &self,
        access_token: &str,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<Email>, GoogleError> {
        let resp = self
            .http
            .get(format!("{}/users/me/messages", self.base_url))
            .bearer_auth(access_token)
            .query(&[("q", query), ("maxResults", &max_results.to_string())])
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GoogleError::AuthExpired);
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(GoogleError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let list: MessageListResponse = resp.json().await?;
        let mut emails = Vec::with_capacity(list.messages.len());

        for stub in &list.messages {
            match self.fetch_message(access_token, &stub.id).await {
                Ok(email) => emails.push(email),
                Err(e) => {
                    log::debug!("skipping message {}: {}", stub.id, e);
                    continue;
                }
            }
        }

        Ok(emails)
    }

    /// Fetch one message in full and flatten it to an [`Email`].
    pub async fn fetch_message(
        &self,
        access_token: &str,
        message_id: &str,
    ) -> Result<Email, GoogleError> {
        let resp = self
            .http
            .get(format!("{}/users/me/messages/{}", self.base_url, message_id))
            .bearer_auth(access_token)
            .query(&[("format", "full")])
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GoogleError::AuthExpired);
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(GoogleError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let detail: MessageDetail = resp.json().await?;
        Ok(flatten_message(detail))
    }
}

fn flatten_message(detail: MessageDetail) -> Email {
    let subject = detail
        .payload
        .as_ref()
        .map(|p| header_value(&p.headers, "Subject"))
        .unwrap_or_default();
    let body = detail
        .payload
        .as_ref()
        .map(|p| extract_body(&p.part))
        .unwrap_or_default();

    Email {
        id: detail.id,
        subject,
        body,
    }
}

fn header_value(headers: &[Header], name: &str) -> String {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.clone())
        .unwrap_or_default()
}
