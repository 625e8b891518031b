//! The untrusted boundary between model text and typed tasks.
//!
//! Stage 1 pattern-extracts the first JSON array literal from the raw
//! response; models wrap their JSON in prose and are not trusted to emit
//! only JSON. Stage 2 runs the span through strict serde decoding into
//! typed tasks; nothing unvalidated escapes into consolidation.

use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::Deserialize;

use crate::error::GatewayError;
use crate::types::{ExtractedTask, TaskType};

/// Find the first JSON array literal in free-form model text.
///
/// Matches either an array of objects (non-greedy, dot-matches-newline) or
/// an empty array; the prompt asks for `[]` when no tasks exist.
pub fn extract_json_array(text: &str) -> Option<&str> {
    static ARRAY_RE: OnceLock<Regex> = OnceLock::new();
    let re = ARRAY_RE.get_or_init(|| {
        Regex::new(r"(?s)\[\s*\{.*?\}\s*\]|\[\s*\]").expect("valid regex")
    });
    re.find(text).map(|m| m.as_str())
}

/// The raw task object as the model emits it, before validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTask {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    task_type: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    is_actionable: bool,
}

/// A validated task, not yet stamped with provenance.
#[derive(Debug, Clone)]
pub struct ParsedTask {
    pub description: String,
    pub task_type: TaskType,
    pub company: Option<String>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub due_date: Option<NaiveDateTime>,
    pub is_actionable: bool,
}

impl ParsedTask {
    /// Attach provenance from the originating email.
    pub fn stamp(self, email_id: &str, email_subject: &str) -> ExtractedTask {
        ExtractedTask {
            description: self.description,
            task_type: self.task_type,
            company: self.company,
            start_date: self.start_date,
            end_date: self.end_date,
            due_date: self.due_date,
            is_actionable: self.is_actionable,
            email_id: email_id.to_string(),
            email_subject: email_subject.to_string(),
        }
    }
}

/// Decode an extracted JSON span into validated tasks.
///
/// Malformed JSON is a [`GatewayError::InvalidJson`] so the fallback chain
/// advances. Individual objects without a non-empty description are
/// structural garbage and get dropped with a log line rather than failing
/// the whole array.
pub fn decode_tasks(span: &str) -> Result<Vec<ParsedTask>, GatewayError> {
    let raw: Vec<RawTask> = serde_json::from_str(span)?;

    let mut tasks = Vec::with_capacity(raw.len());
    for item in raw {
        let description = match item.description {
            Some(d) if !d.trim().is_empty() => d,
            _ => {
                log::debug!("dropping model task with empty description");
                continue;
            }
        };
        tasks.push(ParsedTask {
            description,
            task_type: item
                .task_type
                .as_deref()
                .map(TaskType::from_label)
                .unwrap_or(TaskType::Other),
            company: item.company.filter(|c| !c.trim().is_empty()),
            start_date: item.start_date.as_deref().and_then(parse_model_datetime),
            end_date: item.end_date.as_deref().and_then(parse_model_datetime),
            due_date: item.due_date.as_deref().and_then(parse_model_datetime),
            is_actionable: item.is_actionable,
        });
    }
    Ok(tasks)
}

/// Parse the model's naive datetime strings.
///
/// The prompt mandates `YYYY-MM-DDTHH:mm:ss`; a bare date is tolerated and
/// assumed end-of-day, matching the prompt's own rule for dateless
/// deadlines. Anything else is treated as absent.
pub fn parse_model_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("null") {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(23, 59, 59);
    }
    log::debug!("unparseable model datetime: {:?}", s);
    None
}
