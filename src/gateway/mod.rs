//! Language-model gateway: ordered fallback chain over completion models.
//!
//! One call per email. Each model identifier in the chain gets exactly one
//! completion request; any transport, HTTP, extraction, or decode failure
//! advances to the next identifier. Chain order is load-bearing; earlier
//! models are preferred for cost and speed. Exhausting the chain
//! reports the last error. No caching, no per-model retry: backoff policy
//! for the rate budget lives in the sequential orchestrator above.

pub mod parse;
pub mod prompt;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Datelike;
use serde::Deserialize;

use crate::error::GatewayError;

use parse::{decode_tasks, extract_json_array, ParsedTask};
use prompt::{build_extraction_prompt, SYSTEM_INSTRUCTION};

/// Decoding is pinned near-deterministic; extraction is not a creative task.
const TEMPERATURE: f64 = 0.1;
/// Generous ceiling; a dense placement email can yield several tasks.
const MAX_TOKENS: u32 = 4096;

/// One completion request against a named model.
///
/// Dyn-compatible so tests can script responses without a network.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
    ) -> Result<String, GatewayError>;
}

// ============================================================================
// Groq client (OpenAI-compatible chat completions)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

pub struct GroqClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        GroqClient {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: crate::config::DEFAULT_GROQ_ENDPOINT.to_string(),
        }
    }

    /// Point at a different OpenAI-compatible endpoint (tests, proxies).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        GroqClient {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
    ) -> Result<String, GatewayError> {
        let body = serde_json::json!({
            "model": model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt},
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = resp.json().await.map_err(GatewayError::Http)?;
        Ok(chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }
}

// ============================================================================
// Gateway
// ============================================================================

/// Tasks extracted from one email, plus which model produced them.
#[derive(Debug)]
pub struct GatewayOutcome {
    pub tasks: Vec<ParsedTask>,
    pub model_used: String,
}

/// Drives the fallback chain for one email at a time.
///
/// The model list and prompt template are read-only shared configuration;
/// nothing here mutates between calls and no state survives a call.
pub struct ModelGateway {
    client: Arc<dyn CompletionClient>,
    models: Vec<String>,
}

impl ModelGateway {
    pub fn new(client: Arc<dyn CompletionClient>, models: Vec<String>) -> Self {
        ModelGateway { client, models }
    }

    /// Extract tasks from one email's flattened content.
    ///
    /// Tries each model in order; the first whose response yields a valid
    /// task array wins. Exhaustion carries the last error.
    pub async fn extract_tasks(
        &self,
        email_content: &str,
        subject: &str,
    ) -> Result<GatewayOutcome, GatewayError> {
        let year = chrono::Utc::now().year();
        let prompt = build_extraction_prompt(year, subject, email_content);

        let mut last_error: Option<GatewayError> = None;
        for model in &self.models {
            match self.try_model(model, &prompt).await {
                Ok(tasks) => {
                    return Ok(GatewayOutcome {
                        tasks,
                        model_used: model.clone(),
                    });
                }
                Err(e) => {
                    log::warn!("model {} failed: {}. Trying next model...", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(GatewayError::Exhausted {
            last: Box::new(last_error.unwrap_or(GatewayError::NoJsonArray)),
        })
    }

    async fn try_model(&self, model: &str, prompt: &str) -> Result<Vec<ParsedTask>, GatewayError> {
        let response = self
            .client
            .complete(model, SYSTEM_INSTRUCTION, prompt)
            .await?;
        let span = extract_json_array(&response).ok_or(GatewayError::NoJsonArray)?;
        decode_tasks(span)
    }
}
