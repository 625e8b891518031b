//! Core data model: emails in, tasks in the middle, calendar events out.
//!
//! Everything here lives for one request only. Emails arrive flattened,
//! extracted tasks are derived and consolidated in memory, and event
//! payloads are handed to the calendar collaborator and forgotten.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ============================================================================
// Email
// ============================================================================

/// A flattened email record supplied by the email source collaborator.
///
/// `body` must already be plain text (the output contract of
/// [`crate::mail::body::extract_body`]). An empty body makes extraction for
/// this email fail fast with a per-email error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

// ============================================================================
// Task type
// ============================================================================

/// Category of an extracted action item, matching the labels the extraction
/// prompt asks the model to emit. Unknown labels map to `Other` instead of
/// failing validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    Application,
    Interview,
    OnlineTest,
    Workshop,
    Deadline,
    Registration,
    PrePlacementTalk,
    Other,
}

impl TaskType {
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskType::Application => "Application",
            TaskType::Interview => "Interview",
            TaskType::OnlineTest => "Online Test",
            TaskType::Workshop => "Workshop",
            TaskType::Deadline => "Deadline",
            TaskType::Registration => "Registration",
            TaskType::PrePlacementTalk => "Pre-placement Talk",
            TaskType::Other => "Other",
        }
    }

    pub fn from_label(label: &str) -> TaskType {
        match label.trim().to_lowercase().as_str() {
            "application" => TaskType::Application,
            "interview" => TaskType::Interview,
            "online test" | "onlinetest" | "test" => TaskType::OnlineTest,
            "workshop" => TaskType::Workshop,
            "deadline" => TaskType::Deadline,
            "registration" => TaskType::Registration,
            "pre-placement talk" | "pre placement talk" | "ppt" => TaskType::PrePlacementTalk,
            _ => TaskType::Other,
        }
    }
}

impl Serialize for TaskType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_label())
    }
}

impl<'de> Deserialize<'de> for TaskType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(TaskType::from_label(&label))
    }
}

// ============================================================================
// Extracted task
// ============================================================================

/// One action item detected in an email, after schema validation.
///
/// At most one of the three date encodings holds meaningfully: a full
/// `start_date`/`end_date` window, a lone `due_date`, or a lone
/// `start_date`. [`ExtractedTask::shape`] resolves the encoding once so the
/// consolidator and synthesizer never re-derive it from nullable fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedTask {
    pub description: String,
    #[serde(default = "default_task_type")]
    pub task_type: TaskType,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub end_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub is_actionable: bool,
    /// Provenance, stamped by the orchestrator, never trusted from the model.
    #[serde(default)]
    pub email_id: String,
    #[serde(default)]
    pub email_subject: String,
}

fn default_task_type() -> TaskType {
    TaskType::Other
}

/// The resolved date encoding of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskShape {
    /// An explicit start/end window (e.g. an online test availability slot).
    Window {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// A single point-in-time deadline with no duration.
    Deadline { due: NaiveDateTime },
    /// A single event with a start but no stated end.
    StartOnly { start: NaiveDateTime },
    /// No usable date at all, not schedulable.
    Unscheduled,
}

impl ExtractedTask {
    /// Resolve the date fields into a [`TaskShape`].
    ///
    /// Precedence when the model violates the at-most-one invariant:
    /// Window, then Deadline, then StartOnly.
    pub fn shape(&self) -> TaskShape {
        match (self.start_date, self.end_date, self.due_date) {
            (Some(start), Some(end), _) => TaskShape::Window { start, end },
            (_, _, Some(due)) => TaskShape::Deadline { due },
            (Some(start), None, None) => TaskShape::StartOnly { start },
            _ => TaskShape::Unscheduled,
        }
    }
}

// ============================================================================
// Calendar event payload (Google Calendar v3 insert body)
// ============================================================================

/// A calendar event payload, shaped for the Calendar v3 `events.insert` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
    pub reminders: Reminders,
}

/// Either a timezone-qualified datetime or an all-day date.
///
/// Naive datetimes are annotated with the fixed zone, not converted:
/// `14:00:00` means 2pm in `time_zone` regardless of where this runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub time_zone: String,
}

impl EventTime {
    pub fn at(datetime: NaiveDateTime, time_zone: &str) -> Self {
        EventTime {
            date_time: Some(datetime.format("%Y-%m-%dT%H:%M:%S").to_string()),
            date: None,
            time_zone: time_zone.to_string(),
        }
    }

    pub fn all_day(date: chrono::NaiveDate, time_zone: &str) -> Self {
        EventTime {
            date_time: None,
            date: Some(date.format("%Y-%m-%d").to_string()),
            time_zone: time_zone.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    pub use_default: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<ReminderOverride>,
}

impl Reminders {
    /// A single popup reminder the given number of minutes before start.
    pub fn popup(minutes: u32) -> Self {
        Reminders {
            use_default: false,
            overrides: vec![ReminderOverride {
                method: "popup".to_string(),
                minutes,
            }],
        }
    }

    /// Defer to the calendar's default reminder policy.
    pub fn default_policy() -> Self {
        Reminders {
            use_default: true,
            overrides: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderOverride {
    pub method: String,
    pub minutes: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn bare_task() -> ExtractedTask {
        ExtractedTask {
            description: "Register for Infosys".to_string(),
            task_type: TaskType::Registration,
            company: Some("Infosys".to_string()),
            start_date: None,
            end_date: None,
            due_date: None,
            is_actionable: true,
            email_id: "m1".to_string(),
            email_subject: "Infosys drive".to_string(),
        }
    }

    #[test]
    fn test_task_type_labels_roundtrip() {
        for tt in [
            TaskType::Application,
            TaskType::Interview,
            TaskType::OnlineTest,
            TaskType::Workshop,
            TaskType::Deadline,
            TaskType::Registration,
            TaskType::PrePlacementTalk,
            TaskType::Other,
        ] {
            assert_eq!(TaskType::from_label(tt.as_label()), tt);
        }
    }

    #[test]
    fn test_task_type_unknown_maps_to_other() {
        assert_eq!(TaskType::from_label("Hackathon"), TaskType::Other);
        assert_eq!(TaskType::from_label(""), TaskType::Other);
    }

    #[test]
    fn test_shape_window_wins_over_due() {
        let mut task = bare_task();
        task.start_date = Some(dt(2025, 9, 22, 10, 0));
        task.end_date = Some(dt(2025, 9, 22, 16, 0));
        task.due_date = Some(dt(2025, 9, 22, 23, 59));
        assert!(matches!(task.shape(), TaskShape::Window { .. }));
    }

    #[test]
    fn test_shape_deadline() {
        let mut task = bare_task();
        task.due_date = Some(dt(2025, 9, 15, 14, 0));
        assert_eq!(
            task.shape(),
            TaskShape::Deadline {
                due: dt(2025, 9, 15, 14, 0)
            }
        );
    }

    #[test]
    fn test_shape_start_only() {
        let mut task = bare_task();
        task.start_date = Some(dt(2025, 9, 18, 10, 0));
        assert!(matches!(task.shape(), TaskShape::StartOnly { .. }));
    }

    #[test]
    fn test_shape_unscheduled() {
        assert_eq!(bare_task().shape(), TaskShape::Unscheduled);
    }

    #[test]
    fn test_extracted_task_wire_format() {
        let json = r#"{
            "description": "Complete the Cognizant online test",
            "taskType": "Online Test",
            "company": "Cognizant",
            "startDate": "2025-09-22T10:00:00",
            "endDate": "2025-09-22T16:00:00",
            "dueDate": null,
            "isActionable": true
        }"#;
        let task: ExtractedTask = serde_json::from_str(json).unwrap();
        assert_eq!(task.task_type, TaskType::OnlineTest);
        assert_eq!(task.start_date, Some(dt(2025, 9, 22, 10, 0)));
        assert!(task.due_date.is_none());
        assert!(task.email_id.is_empty());

        let back = serde_json::to_value(&task).unwrap();
        assert_eq!(back["taskType"], "Online Test");
        assert_eq!(back["startDate"], "2025-09-22T10:00:00");
    }

    #[test]
    fn test_event_time_serialization() {
        let timed = EventTime::at(dt(2025, 9, 15, 14, 0), "Asia/Kolkata");
        let v = serde_json::to_value(&timed).unwrap();
        assert_eq!(v["dateTime"], "2025-09-15T14:00:00");
        assert_eq!(v["timeZone"], "Asia/Kolkata");
        assert!(v.get("date").is_none());

        let all_day = EventTime::all_day(
            NaiveDate::from_ymd_opt(2025, 9, 15).unwrap(),
            "Asia/Kolkata",
        );
        let v = serde_json::to_value(&all_day).unwrap();
        assert_eq!(v["date"], "2025-09-15");
        assert!(v.get("dateTime").is_none());
    }

    #[test]
    fn test_popup_reminder_shape() {
        let v = serde_json::to_value(Reminders::popup(60)).unwrap();
        assert_eq!(v["useDefault"], false);
        assert_eq!(v["overrides"][0]["method"], "popup");
        assert_eq!(v["overrides"][0]["minutes"], 60);

        let v = serde_json::to_value(Reminders::default_policy()).unwrap();
        assert_eq!(v["useDefault"], true);
        assert!(v.get("overrides").is_none());
    }
}
