//! Error types, one enum per layer.
//!
//! Failures stay local to the unit of work that produced them: a model
//! failure belongs to one email, an insert failure to one event. Only a
//! structurally invalid request aborts a whole batch, and that happens
//! before any upstream call is made.

use thiserror::Error;

/// Errors from the language-model gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The response text contained no JSON array literal at all.
    #[error("model response contained no JSON array")]
    NoJsonArray,

    /// The extracted span was not valid JSON for the task schema.
    #[error("model returned invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Every model identifier in the fallback chain failed.
    #[error("all models in the fallback chain failed: {last}")]
    Exhausted {
        #[source]
        last: Box<GatewayError>,
    },
}

/// Errors from the Google API collaborators (Gmail fetch, Calendar insert).
#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token expired or revoked")]
    AuthExpired,

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("no Groq API key configured")]
    MissingApiKey,
}

/// Errors surfaced by the request-facing service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request body had the wrong shape. Rejected before any work.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Manual single-task scheduling was given a dateless or past task.
    #[error("invalid task: {0}")]
    InvalidTask(String),

    #[error(transparent)]
    Calendar(#[from] GoogleError),
}

impl ServiceError {
    /// HTTP-style status code for transport adapters.
    pub fn status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) | ServiceError::InvalidTask(_) => 400,
            ServiceError::Calendar(GoogleError::AuthExpired) => 401,
            ServiceError::Calendar(GoogleError::Api { status, .. }) => *status,
            ServiceError::Calendar(GoogleError::Http(_)) => 502,
        }
    }
}
