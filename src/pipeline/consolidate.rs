//! Duplicate-task consolidation.
//!
//! Placement emails routinely announce the same drive several times
//! (announcement, reminder, last-call). Tasks collapsing to the same
//! identity key are one real-world obligation; we keep the richest
//! representative and drop the rest.

use std::collections::HashMap;

use crate::types::ExtractedTask;

/// Lowercased alphanumeric-only company slug. Absent company groups
/// under "general".
pub fn normalize_company(company: Option<&str>) -> String {
    let raw = company.unwrap_or("general");
    let slug: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if slug.is_empty() {
        "general".to_string()
    } else {
        slug
    }
}

/// Identity key for grouping. Anchored on the calendar date of the start
/// date, falling back to the due date. Returns None for dateless tasks,
/// which cannot be meaningfully deduplicated or scheduled.
pub fn identity_key(task: &ExtractedTask) -> Option<String> {
    let anchor = task.start_date.or(task.due_date)?;
    Some(format!(
        "{}-{}-{}",
        normalize_company(task.company.as_deref()),
        task.task_type.as_label(),
        anchor.format("%Y-%m-%d"),
    ))
}

/// Richness score. Higher is more schedulable.
pub fn score(task: &ExtractedTask) -> i32 {
    let mut score = 0;
    if task.start_date.is_some() && task.end_date.is_some() {
        score += 10;
    }
    if let Some(due) = task.due_date {
        if due.format("%H:%M:%S").to_string() != "00:00:00" {
            score += 5;
        }
    }
    if task.is_actionable {
        score += 2;
    }
    score
}

/// Collapse duplicates, keeping the highest-scoring task per identity key.
///
/// Ties break toward the earlier task, so the pick is stable across runs.
/// Dateless tasks are dropped entirely. Group order in the output follows
/// first appearance in the input.
pub fn consolidate(tasks: Vec<ExtractedTask>) -> Vec<ExtractedTask> {
    let mut best: HashMap<String, (usize, i32)> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for (idx, task) in tasks.iter().enumerate() {
        let Some(key) = identity_key(task) else {
            log::debug!("dropping dateless task: {}", task.description);
            continue;
        };
        let candidate = score(task);
        match best.get(&key).copied() {
            Some((_, incumbent)) if incumbent >= candidate => {}
            Some(_) => {
                best.insert(key, (idx, candidate));
            }
            None => {
                best.insert(key.clone(), (idx, candidate));
                order.push(key);
            }
        }
    }

    order
        .into_iter()
        .map(|key| tasks[best[&key].0].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::TaskType;

    fn task(
        company: Option<&str>,
        task_type: TaskType,
        start: Option<&str>,
        end: Option<&str>,
        due: Option<&str>,
        actionable: bool,
    ) -> ExtractedTask {
        let parse = |s: &str| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
        };
        ExtractedTask {
            description: "task".to_string(),
            task_type,
            company: company.map(|c| c.to_string()),
            start_date: start.map(parse),
            end_date: end.map(parse),
            due_date: due.map(parse),
            is_actionable: actionable,
            email_id: "e1".to_string(),
            email_subject: "subject".to_string(),
        }
    }

    #[test]
    fn test_normalize_company_strips_punctuation_and_case() {
        assert_eq!(normalize_company(Some("T.C.S. Ltd")), "tcsltd");
        assert_eq!(normalize_company(Some("Infosys")), "infosys");
        assert_eq!(normalize_company(None), "general");
        assert_eq!(normalize_company(Some("!!!")), "general");
    }

    #[test]
    fn test_identity_key_prefers_start_date() {
        let t = task(
            Some("TCS"),
            TaskType::Application,
            Some("2025-09-20T10:00:00"),
            None,
            Some("2025-09-25T23:59:59"),
            true,
        );
        assert_eq!(identity_key(&t).unwrap(), "tcs-Application-2025-09-20");
    }

    #[test]
    fn test_identity_key_none_for_dateless() {
        let t = task(Some("TCS"), TaskType::Other, None, None, None, true);
        assert!(identity_key(&t).is_none());
    }

    #[test]
    fn test_score_components() {
        let windowed = task(
            None,
            TaskType::OnlineTest,
            Some("2025-09-20T10:00:00"),
            Some("2025-09-20T12:00:00"),
            None,
            true,
        );
        assert_eq!(score(&windowed), 12);

        let timed_due = task(
            None,
            TaskType::Deadline,
            None,
            None,
            Some("2025-09-20T23:59:59"),
            false,
        );
        assert_eq!(score(&timed_due), 5);

        let midnight_due = task(
            None,
            TaskType::Deadline,
            None,
            None,
            Some("2025-09-20T00:00:00"),
            false,
        );
        assert_eq!(score(&midnight_due), 0);
    }

    #[test]
    fn test_score_monotone_in_each_condition() {
        // Turning any one scoring condition on never lowers the score.
        let base = task(
            Some("TCS"),
            TaskType::Application,
            Some("2025-09-20T09:00:00"),
            None,
            None,
            false,
        );

        let mut with_window = base.clone();
        with_window.end_date = Some(
            chrono::NaiveDateTime::parse_from_str("2025-09-20T17:00:00", "%Y-%m-%dT%H:%M:%S")
                .unwrap(),
        );
        assert!(score(&with_window) > score(&base));

        let mut with_timed_due = base.clone();
        with_timed_due.due_date = Some(
            chrono::NaiveDateTime::parse_from_str("2025-09-20T23:59:59", "%Y-%m-%dT%H:%M:%S")
                .unwrap(),
        );
        assert!(score(&with_timed_due) > score(&base));

        let mut actionable = base.clone();
        actionable.is_actionable = true;
        assert!(score(&actionable) > score(&base));

        // And flipping a condition on top of another never regresses it.
        let mut stacked = with_window.clone();
        stacked.is_actionable = true;
        assert!(score(&stacked) >= score(&with_window));
    }

    #[test]
    fn test_richest_duplicate_wins() {
        // Reminder email carries only a due date; the original announcement
        // carries the full test window. Same company, type, and date.
        let reminder = task(
            Some("TCS"),
            TaskType::Application,
            Some("2025-09-20T00:00:00"),
            None,
            Some("2025-09-20T23:59:59"),
            true,
        );
        let announcement = task(
            Some("tcs"),
            TaskType::Application,
            Some("2025-09-20T09:00:00"),
            Some("2025-09-20T17:00:00"),
            None,
            false,
        );
        assert_eq!(score(&reminder), 7);
        assert_eq!(score(&announcement), 10);

        let kept = consolidate(vec![reminder, announcement]);
        assert_eq!(kept.len(), 1);
        assert!(kept[0].end_date.is_some());
    }

    #[test]
    fn test_distinct_keys_all_survive() {
        let a = task(
            Some("TCS"),
            TaskType::Application,
            Some("2025-09-20T10:00:00"),
            None,
            None,
            true,
        );
        let b = task(
            Some("Infosys"),
            TaskType::Application,
            Some("2025-09-20T10:00:00"),
            None,
            None,
            true,
        );
        let c = task(
            Some("TCS"),
            TaskType::Interview,
            Some("2025-09-20T10:00:00"),
            None,
            None,
            true,
        );
        let kept = consolidate(vec![a, b, c]);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_tie_keeps_earlier_task() {
        let first = task(
            Some("TCS"),
            TaskType::Application,
            Some("2025-09-20T10:00:00"),
            None,
            None,
            true,
        );
        let mut second = first.clone();
        second.email_id = "e2".to_string();

        let kept = consolidate(vec![first, second]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].email_id, "e1");
    }

    #[test]
    fn test_idempotent() {
        let tasks = vec![
            task(
                Some("TCS"),
                TaskType::Application,
                Some("2025-09-20T09:00:00"),
                Some("2025-09-20T17:00:00"),
                None,
                true,
            ),
            task(
                Some("TCS"),
                TaskType::Application,
                Some("2025-09-20T00:00:00"),
                None,
                None,
                false,
            ),
            task(
                Some("Wipro"),
                TaskType::Deadline,
                None,
                None,
                Some("2025-09-21T18:00:00"),
                true,
            ),
        ];
        let once = consolidate(tasks);
        let twice = consolidate(once.clone());
        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_eq!(a.description, b.description);
            assert_eq!(a.start_date, b.start_date);
        }
    }

    #[test]
    fn test_dateless_tasks_dropped() {
        let kept = consolidate(vec![task(
            Some("TCS"),
            TaskType::Other,
            None,
            None,
            None,
            true,
        )]);
        assert!(kept.is_empty());
    }

    #[test]
    fn test_group_order_follows_first_appearance() {
        let a = task(
            Some("Wipro"),
            TaskType::Interview,
            Some("2025-09-22T10:00:00"),
            None,
            None,
            true,
        );
        let b = task(
            Some("TCS"),
            TaskType::Application,
            Some("2025-09-20T10:00:00"),
            None,
            None,
            true,
        );
        let kept = consolidate(vec![a, b]);
        assert_eq!(kept[0].company.as_deref(), Some("Wipro"));
        assert_eq!(kept[1].company.as_deref(), Some("TCS"));
    }
}
