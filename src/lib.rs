//! Mailminder turns placement-cell emails into calendar events.
//!
//! Pipeline: flattened email text → language-model task extraction behind an
//! ordered model fallback chain → consolidation of duplicate tasks → calendar
//! event synthesis in a fixed civil timezone → Google Calendar insert.
//!
//! The OAuth consent flow, session handling, and UI live outside this crate;
//! callers supply bearer tokens and email records and receive event payloads
//! and per-email results back.

pub mod calendar;
pub mod config;
pub mod error;
pub mod gateway;
pub mod mail;
pub mod pipeline;
pub mod service;
pub mod types;

/// Initialize logging from `RUST_LOG`. Host binaries call this once at
/// startup; calling it twice is a no-op.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env().try_init();
}

pub use config::Config;
pub use error::{ConfigError, GatewayError, GoogleError, ServiceError};
pub use types::{CalendarEvent, Email, ExtractedTask, TaskShape, TaskType};
