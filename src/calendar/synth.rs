//! Turning extracted tasks into calendar events.
//!
//! All naive datetimes coming out of extraction are interpreted in the
//! policy timezone. Past events are skipped rather than created, and the
//! reference instant is an explicit parameter so callers and tests share
//! one clock.

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;

use crate::types::{CalendarEvent, EventTime, ExtractedTask, Reminders, TaskShape, TaskType};

/// Knobs governing event synthesis.
#[derive(Debug, Clone)]
pub struct SynthesisPolicy {
    pub timezone: Tz,
    pub reminder_minutes: u32,
    pub default_duration: Duration,
}

impl Default for SynthesisPolicy {
    fn default() -> Self {
        SynthesisPolicy {
            timezone: chrono_tz::Asia::Kolkata,
            reminder_minutes: 60,
            default_duration: Duration::minutes(60),
        }
    }
}

/// Synthesize zero or more calendar events for a task.
///
/// Windowed tasks become a single span event. Deadline tasks become a
/// zero-duration marker at the due instant plus an all-day heads-up
/// event on the due date. Start-only tasks get the policy's default
/// duration. Tasks whose anchor instant is already behind `now` yield
/// nothing.
pub fn synthesize(
    task: &ExtractedTask,
    now: DateTime<Utc>,
    policy: &SynthesisPolicy,
) -> Vec<CalendarEvent> {
    let tz_name = policy.timezone.name();

    match task.shape() {
        TaskShape::Window { start, end } => {
            if is_past(end, now, policy.timezone) {
                log::debug!("skipping past window event: {}", task.description);
                return Vec::new();
            }
            let summary = match task.task_type {
                TaskType::OnlineTest => format!("Test Window: {}", task.description),
                _ => task.description.clone(),
            };
            vec![CalendarEvent {
                summary,
                description: provenance(task),
                start: EventTime::at(start, tz_name),
                end: EventTime::at(end, tz_name),
                reminders: Reminders::popup(policy.reminder_minutes),
            }]
        }
        TaskShape::Deadline { due } => {
            if is_past(due, now, policy.timezone) {
                log::debug!("skipping past deadline: {}", task.description);
                return Vec::new();
            }
            let marker = CalendarEvent {
                summary: format!("DEADLINE: {}", task.description),
                description: provenance(task),
                start: EventTime::at(due, tz_name),
                end: EventTime::at(due, tz_name),
                reminders: Reminders::popup(policy.reminder_minutes),
            };
            let heads_up = CalendarEvent {
                summary: format!("Reminder: {}", task.description),
                description: format!(
                    "{} is today at {}.\n\nFrom Email: {}",
                    task.description,
                    due.format("%I:%M %p"),
                    task.email_subject,
                ),
                start: EventTime::all_day(due.date(), tz_name),
                end: EventTime::all_day(due.date(), tz_name),
                reminders: Reminders::default_policy(),
            };
            vec![marker, heads_up]
        }
        TaskShape::StartOnly { start } => {
            if is_past(start, now, policy.timezone) {
                log::debug!("skipping past event: {}", task.description);
                return Vec::new();
            }
            let end = start + policy.default_duration;
            vec![CalendarEvent {
                summary: task.description.clone(),
                description: provenance(task),
                start: EventTime::at(start, tz_name),
                end: EventTime::at(end, tz_name),
                reminders: Reminders::popup(policy.reminder_minutes),
            }]
        }
        TaskShape::Unscheduled => Vec::new(),
    }
}

fn provenance(task: &ExtractedTask) -> String {
    let mut lines = vec![task.description.clone()];
    if let Some(company) = &task.company {
        lines.push(format!("Company: {}", company));
    }
    lines.push(format!("From Email: {}", task.email_subject));
    lines.join("\n\n")
}

/// Whether a naive local instant is behind `now` when interpreted in `tz`.
/// Instants made ambiguous or invalid by a DST transition resolve to the
/// earlier interpretation, and a nonexistent instant counts as past.
fn is_past(local: chrono::NaiveDateTime, now: DateTime<Utc>, tz: Tz) -> bool {
    match tz.from_local_datetime(&local).earliest() {
        Some(instant) => instant < now,
        None => true,
    }
}
