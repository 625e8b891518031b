//! Per-email extraction orchestration.
//!
//! Emails are processed strictly one at a time, in input order, awaiting
//! each gateway call before starting the next. The language-model service
//! enforces a shared rate budget; the sequential loop is the backpressure
//! mechanism, and callers rely on results coming back in input order.
//! Do not parallelize this without revisiting both contracts.

use serde::Serialize;

use crate::gateway::ModelGateway;
use crate::types::{Email, ExtractedTask};

/// Outcome for one email in a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerEmailResult {
    pub email_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<ExtractedTask>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

impl PerEmailResult {
    fn failure(email_id: &str, error: impl Into<String>) -> Self {
        PerEmailResult {
            email_id: email_id.to_string(),
            success: false,
            tasks: None,
            error: Some(error.into()),
            model_used: None,
        }
    }
}

/// A batch's worth of extraction output.
#[derive(Debug)]
pub struct BatchExtraction {
    /// One entry per input email, in input order.
    pub results: Vec<PerEmailResult>,
    /// Flattened union of all successful per-email task lists, stamped
    /// with provenance.
    pub tasks: Vec<ExtractedTask>,
}

pub struct TaskExtractionOrchestrator {
    gateway: ModelGateway,
}

impl TaskExtractionOrchestrator {
    pub fn new(gateway: ModelGateway) -> Self {
        TaskExtractionOrchestrator { gateway }
    }

    /// Run extraction over a batch of emails.
    ///
    /// A per-email failure (missing body, every model failed) is recorded
    /// in that email's result and never aborts the rest of the batch.
    pub async fn process(&self, emails: &[Email]) -> BatchExtraction {
        let mut results = Vec::with_capacity(emails.len());
        let mut all_tasks = Vec::new();

        for email in emails {
            if email.body.trim().is_empty() {
                results.push(PerEmailResult::failure(&email.id, "email body is missing"));
                continue;
            }

            match self.gateway.extract_tasks(&email.body, &email.subject).await {
                Ok(outcome) => {
                    let tasks: Vec<ExtractedTask> = outcome
                        .tasks
                        .into_iter()
                        .map(|t| t.stamp(&email.id, &email.subject))
                        .collect();
                    all_tasks.extend(tasks.iter().cloned());
                    results.push(PerEmailResult {
                        email_id: email.id.clone(),
                        success: true,
                        tasks: Some(tasks),
                        error: None,
                        model_used: Some(outcome.model_used),
                    });
                }
                Err(e) => {
                    log::warn!("extraction failed for email {}: {}", email.id, e);
                    results.push(PerEmailResult::failure(&email.id, e.to_string()));
                }
            }
        }

        BatchExtraction {
            results,
            tasks: all_tasks,
        }
    }
}
