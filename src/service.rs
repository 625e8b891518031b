//! Request-facing service layer.
//!
//! This is what a transport adapter (HTTP handler, CLI, job runner) calls:
//! request parsing, the extraction pipeline, consolidation, event
//! synthesis, and calendar inserts, with a summary of what happened.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{synthesize, CalendarSink, SynthesisPolicy};
use crate::error::ServiceError;
use crate::pipeline::consolidate::consolidate;
use crate::pipeline::orchestrator::{PerEmailResult, TaskExtractionOrchestrator};
use crate::types::{Email, ExtractedTask, TaskShape};

/// Accepted batch request shapes: either a bare array of emails or an
/// envelope object. The envelope's email list also answers to "messages".
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ExtractRequest {
    Batch(Vec<Email>),
    Envelope {
        #[serde(default, alias = "messages")]
        emails: Vec<Email>,
        #[serde(default, rename = "autoAddTask")]
        auto_add_task: bool,
    },
}

impl ExtractRequest {
    pub fn parse(body: &serde_json::Value) -> Result<Self, ServiceError> {
        // An untagged envelope would swallow any object, turning a typo'd
        // key into a silent empty batch. A non-empty object must name its
        // email list; a bare {} still means "nothing to process".
        if let Some(map) = body.as_object() {
            if !map.is_empty() && !map.contains_key("emails") && !map.contains_key("messages") {
                return Err(ServiceError::BadRequest(
                    "object request must carry an \"emails\" (or \"messages\") list".to_string(),
                ));
            }
        }
        serde_json::from_value(body.clone())
            .map_err(|_| ServiceError::BadRequest("expected an email array or an object with an \"emails\" list".to_string()))
    }

    pub fn into_parts(self) -> (Vec<Email>, bool) {
        match self {
            ExtractRequest::Batch(emails) => (emails, false),
            ExtractRequest::Envelope {
                emails,
                auto_add_task,
            } => (emails, auto_add_task),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total_emails: usize,
    pub successfully_processed: usize,
    pub errors: usize,
    /// Raw task count across all emails, before consolidation.
    pub total_tasks_extracted: usize,
    pub total_tasks_created: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub success: bool,
    pub results: Vec<PerEmailResult>,
    /// Consolidated tasks, duplicates collapsed.
    pub all_tasks: Vec<ExtractedTask>,
    pub summary: BatchSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleAck {
    pub success: bool,
    pub events_created: usize,
}

pub struct MailminderService {
    orchestrator: TaskExtractionOrchestrator,
    sink: Arc<dyn CalendarSink>,
    policy: SynthesisPolicy,
}

impl MailminderService {
    pub fn new(
        orchestrator: TaskExtractionOrchestrator,
        sink: Arc<dyn CalendarSink>,
        policy: SynthesisPolicy,
    ) -> Self {
        MailminderService {
            orchestrator,
            sink,
            policy,
        }
    }

    /// Process a batch of emails end to end.
    ///
    /// Extraction and insert failures are recorded per email and per
    /// event; the batch itself always completes and reports `success`.
    pub async fn extract_and_schedule(
        &self,
        emails: Vec<Email>,
        auto_add: bool,
        now: DateTime<Utc>,
    ) -> ExtractResponse {
        let batch = self.orchestrator.process(&emails).await;
        let total_tasks_extracted = batch.tasks.len();
        let all_tasks = consolidate(batch.tasks);

        // A task counts as created once at least one of its events landed;
        // a deadline's marker and heads-up pair is still one task.
        let mut total_tasks_created = 0;
        if auto_add {
            for task in &all_tasks {
                let mut inserted_any = false;
                for event in synthesize(task, now, &self.policy) {
                    match self.sink.insert(&event).await {
                        Ok(()) => inserted_any = true,
                        Err(e) => {
                            log::warn!("calendar insert failed for \"{}\": {}", event.summary, e);
                        }
                    }
                }
                if inserted_any {
                    total_tasks_created += 1;
                }
            }
        }

        let successfully_processed = batch.results.iter().filter(|r| r.success).count();
        let errors = batch.results.len() - successfully_processed;
        log::info!(
            "batch done: {}/{} emails ok, {} tasks extracted, {} after consolidation, {} events created",
            successfully_processed,
            emails.len(),
            total_tasks_extracted,
            all_tasks.len(),
            total_tasks_created
        );

        ExtractResponse {
            success: true,
            summary: BatchSummary {
                total_emails: emails.len(),
                successfully_processed,
                errors,
                total_tasks_extracted,
                total_tasks_created,
            },
            results: batch.results,
            all_tasks,
        }
    }

    /// Schedule one already-extracted task on the calendar.
    ///
    /// Dateless tasks and tasks whose time has already passed are
    /// rejected rather than silently skipped, since the caller asked for
    /// this specific task.
    pub async fn schedule_task(
        &self,
        task: &ExtractedTask,
        now: DateTime<Utc>,
    ) -> Result<ScheduleAck, ServiceError> {
        if matches!(task.shape(), TaskShape::Unscheduled) {
            return Err(ServiceError::InvalidTask(
                "task has no usable date".to_string(),
            ));
        }

        let events = synthesize(task, now, &self.policy);
        if events.is_empty() {
            return Err(ServiceError::InvalidTask(
                "task's date is already in the past".to_string(),
            ));
        }

        let mut events_created = 0;
        for event in &events {
            self.sink.insert(event).await?;
            events_created += 1;
        }

        Ok(ScheduleAck {
            success: true,
            events_created,
        })
    }
}
