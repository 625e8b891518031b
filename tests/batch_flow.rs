//! End-to-end batch flow: extraction through consolidation to calendar
//! inserts, with a scripted model client and a recording calendar sink.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use mailminder::calendar::{CalendarSink, SynthesisPolicy};
use mailminder::error::{GatewayError, GoogleError};
use mailminder::gateway::{CompletionClient, ModelGateway};
use mailminder::pipeline::orchestrator::TaskExtractionOrchestrator;
use mailminder::service::MailminderService;
use mailminder::types::CalendarEvent;
use mailminder::Email;

struct ScriptedClient {
    responses: Vec<Option<String>>,
    calls: AtomicUsize,
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        _model: &str,
        _system: &str,
        _prompt: &str,
    ) -> Result<String, GatewayError> {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(idx)
            .cloned()
            .flatten()
            .ok_or(GatewayError::Api {
                status: 500,
                message: "scripted failure".into(),
            })
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<CalendarEvent>>,
}

#[async_trait]
impl CalendarSink for RecordingSink {
    async fn insert(&self, event: &CalendarEvent) -> Result<(), GoogleError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

fn email(id: &str, subject: &str, body: &str) -> Email {
    Email {
        id: id.to_string(),
        subject: subject.to_string(),
        body: body.to_string(),
    }
}

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn service(responses: Vec<Option<String>>, sink: Arc<RecordingSink>) -> MailminderService {
    let client = Arc::new(ScriptedClient {
        responses,
        calls: AtomicUsize::new(0),
    });
    let gateway = ModelGateway::new(client, vec!["primary".into()]);
    MailminderService::new(
        TaskExtractionOrchestrator::new(gateway),
        sink,
        SynthesisPolicy::default(),
    )
}

#[tokio::test]
async fn batch_of_three_emails_end_to_end() {
    // Email 1: a test window plus a duplicate reminder for the same drive.
    // Email 2: the model fails outright.
    // Email 3: a deadline task.
    let sink = Arc::new(RecordingSink::default());
    let svc = service(
        vec![
            Some(
                r#"Here are the tasks: [
                    {"description": "TCS NQT aptitude test", "taskType": "Online Test",
                     "company": "TCS", "startDate": "2025-09-20T09:00:00",
                     "endDate": "2025-09-20T17:00:00", "isActionable": true},
                    {"description": "TCS NQT reminder", "taskType": "Online Test",
                     "company": "T.C.S", "startDate": "2025-09-20T00:00:00",
                     "isActionable": false}
                ]"#
                .to_string(),
            ),
            None,
            Some(
                r#"[{"description": "Submit Infosys application", "taskType": "Deadline",
                     "company": "Infosys", "dueDate": "2025-09-25T23:59:59",
                     "isActionable": true}]"#
                    .to_string(),
            ),
        ],
        sink.clone(),
    );

    let emails = vec![
        email("e1", "TCS NQT window", "test window details"),
        email("e2", "Mangled", "body"),
        email("e3", "Infosys deadline", "apply before the 25th"),
    ];

    let response = svc
        .extract_and_schedule(emails, true, at("2025-09-01T00:00:00Z"))
        .await;

    // Per-email results in input order, failure recorded in place.
    assert_eq!(response.results.len(), 3);
    assert_eq!(response.results[0].email_id, "e1");
    assert!(response.results[0].success);
    assert_eq!(response.results[0].model_used.as_deref(), Some("primary"));
    assert!(!response.results[1].success);
    assert!(response.results[1].error.is_some());
    assert!(response.results[2].success);

    // Three raw tasks, two after consolidation (the reminder collapses
    // into the richer window task).
    assert_eq!(response.summary.total_emails, 3);
    assert_eq!(response.summary.successfully_processed, 2);
    assert_eq!(response.summary.errors, 1);
    assert_eq!(response.summary.total_tasks_extracted, 3);
    assert_eq!(response.all_tasks.len(), 2);
    assert_eq!(response.all_tasks[0].email_id, "e1");
    assert!(response.all_tasks[0].end_date.is_some());

    // Window task makes one event; deadline makes a marker plus an
    // all-day heads-up. Both tasks count once each.
    assert_eq!(response.summary.total_tasks_created, 2);
    let events = sink.events.lock().unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].summary, "Test Window: TCS NQT aptitude test");
    assert_eq!(events[0].start.time_zone, "Asia/Kolkata");
    assert_eq!(events[1].summary, "DEADLINE: Submit Infosys application");
    assert_eq!(events[2].summary, "Reminder: Submit Infosys application");
    assert!(events[2].start.date.is_some());
}

#[tokio::test]
async fn past_tasks_survive_extraction_but_create_no_events() {
    let sink = Arc::new(RecordingSink::default());
    let svc = service(
        vec![Some(
            r#"[{"description": "Old drive", "taskType": "Application",
                 "company": "Wipro", "startDate": "2025-01-10T09:00:00",
                 "endDate": "2025-01-10T17:00:00", "isActionable": true}]"#
                .to_string(),
        )],
        sink.clone(),
    );

    let response = svc
        .extract_and_schedule(
            vec![email("e1", "Wipro drive", "body")],
            true,
            at("2025-09-01T00:00:00Z"),
        )
        .await;

    assert_eq!(response.all_tasks.len(), 1);
    assert_eq!(response.summary.total_tasks_created, 0);
    assert!(sink.events.lock().unwrap().is_empty());
}
