//! Task-extraction prompt construction.
//!
//! One prompt per email: instruction template (schema, worked examples,
//! business rules) followed by the subject and flattened body. The current
//! year is injected so relative dates in emails resolve correctly.

/// System instruction for every completion request.
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant that extracts actionable \
tasks from emails and returns them in valid JSON format as requested in the user prompt.";

/// Cap on email content included in a prompt. Placement-cell emails are
/// short; anything past this is boilerplate or quoted chains.
const MAX_CONTENT_CHARS: usize = 16_000;

/// Build the full user prompt for one email.
pub fn build_extraction_prompt(current_year: i32, subject: &str, body: &str) -> String {
    let subject = if subject.is_empty() {
        "No Subject"
    } else {
        subject
    };
    format!(
        "{}\nSubject: {}\nContent: {}\n",
        instruction_template(current_year),
        subject,
        truncate_at_char_boundary(body, MAX_CONTENT_CHARS)
    )
}

/// The instruction template with schema, rules, and worked examples.
fn instruction_template(current_year: i32) -> String {
    format!(
        r#"
You are a precision-focused AI assistant for VIT students. Your task is to meticulously extract tasks from emails and structure them as JSON. You must differentiate between timed events (like tests) and single-point-in-time deadlines (like registrations). Your accuracy is critical. The current year is {year}.

**JSON Schema:**
For each task, create a JSON object with the following schema.
{{
  "description": "string (A concise, action-oriented summary. E.g., 'Apply for the Systems Engineer role')",
  "taskType": "string ('Application', 'Interview', 'Online Test', 'Workshop', 'Deadline', 'Registration', 'Pre-placement Talk')",
  "company": "string (Company name if mentioned, otherwise null)",
  "startDate": "string (The start time in 'YYYY-MM-DDTHH:mm:ss' format. USE ONLY FOR TIME WINDOWS or single events.)",
  "endDate": "string (The end time in 'YYYY-MM-DDTHH:mm:ss' format. USE ONLY FOR TIME WINDOWS.)",
  "dueDate": "string (A single deadline in 'YYYY-MM-DDTHH:mm:ss' format. USE ONLY FOR SINGLE DEADLINES.)",
  "isActionable": "boolean (true if it requires direct action)"
}}

**CRITICAL INSTRUCTIONS & RULES:**
1.  **IGNORE M.TECH**: You **MUST IGNORE** and **DO NOT** create a JSON object for any task, placement, or event specifically intended for "M.Tech", "M.Tech.", or "Master of Technology" students.
2.  **CURRENT YEAR**: The current year is {year}.
3.  **DATE IS MANDATORY**: If no specific date, deadline, or time window can be found, DO NOT create a JSON object for the task.
4.  **DIFFERENTIATE TASK TYPES (VERY IMPORTANT):**
    * **If it is a TEST WINDOW** (e.g., "test is available from 9 am to 5 pm"):
        * You **MUST** use 'startDate' and 'endDate'.
        * 'dueDate' **MUST** be 'null'.
        * 'taskType' should be 'Online Test'.
    * **If it is a REGISTRATION/APPLICATION DEADLINE** (e.g., "deadline to register is 2 PM", "last day to apply is..."):
        * You **MUST** use 'dueDate'.
        * 'startDate' and 'endDate' **MUST** be 'null'.
        * 'taskType' should be 'Registration' or 'Application'.
    * **If it is a single event like a TALK or WORKSHOP** (e.g., "pre-placement talk at 10 AM"):
        * You **MUST** use 'startDate'.
        * 'endDate' and 'dueDate' **MUST** be 'null'.
        * 'taskType' should be 'Pre-placement Talk' or 'Workshop'.
5.  **TIME FORMATTING**:
    * Always use 'YYYY-MM-DDTHH:mm:ss'.
    * "2 PM" is "14:00:00". "9 AM" is "09:00:00".
    * If a deadline has no time (e.g., "last day is Sept 18th"), assume End of Day: 'T23:59:59'.

---
**HIGH-QUALITY EXAMPLES:**

**Email 1 (Registration Deadline):** "The deadline for the Infosys registration is tomorrow, 15th Sept, at 2 PM."
**Expected JSON Output 1:**
[
  {{
    "description": "Register for Infosys",
    "taskType": "Registration",
    "company": "Infosys",
    "startDate": null,
    "endDate": null,
    "dueDate": "{year}-09-15T14:00:00",
    "isActionable": true
  }}
]

**Email 2 (Test Window):** "The online test for Cognizant will be active on the 22nd of September, from 10:00 AM to 4:00 PM. The duration of the test is 60 minutes."
**Expected JSON Output 2:**
[
  {{
    "description": "Complete the Cognizant online test",
    "taskType": "Online Test",
    "company": "Cognizant",
    "startDate": "{year}-09-22T10:00:00",
    "endDate": "{year}-09-22T16:00:00",
    "dueDate": null,
    "isActionable": true
  }}
]

**Email 3 (M.Tech - IGNORED):** "We are pleased to announce a special workshop for all M.Tech students on Advanced AI."
**Expected JSON Output 3:**
[]
---

Now, analyze the following email content and provide the JSON output:
"#,
        year = current_year
    )
}

/// Truncate at a valid UTF-8 char boundary. Slicing an arbitrary byte panics.
fn truncate_at_char_boundary(text: &str, max_chars: usize) -> &str {
    if text.len() <= max_chars {
        return text;
    }
    let mut end = max_chars;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
