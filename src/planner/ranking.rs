//! Priority-aware ordering of open tasks, shared by the calendar list and the
//! timeline.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use std::cmp::Ordering;

use super::collation::{self, Language};
use super::data::{Domain, Task};

/// Dated tasks come first, earliest effective date first.
fn compare_effective_dates(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn compare_tasks(a: &Task, b: &Task, language: Language) -> Ordering {
    compare_effective_dates(a.effective_date(), b.effective_date())
        .then_with(|| b.is_priority.cmp(&a.is_priority))
        .then_with(|| collation::compare(&a.content, &b.content, language))
}

/// Open tasks in display order. Done tasks are left out entirely.
pub fn rank(tasks: &[Task], language: Language) -> Vec<&Task> {
    let mut ranked: Vec<&Task> = tasks.iter().filter(|task| !task.is_done()).collect();
    ranked.sort_by(|a, b| compare_tasks(a, b, language));

    ranked
}

pub fn is_overdue(task: &Task, now: NaiveDateTime) -> bool {
    !task.is_done() && task.end_date.map_or(false, |end| end < now)
}

/// Tasks starting on `day`: all-day entries first, then by start time.
pub fn day_agenda(tasks: &[Task], day: NaiveDate) -> Vec<&Task> {
    let mut agenda: Vec<&Task> = tasks
        .iter()
        .filter(|task| task.start_date.map_or(false, |start| start.date() == day))
        .collect();
    agenda.sort_by(|a, b| {
        b.is_all_day
            .cmp(&a.is_all_day)
            .then_with(|| a.start_date.cmp(&b.start_date))
    });

    agenda
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RankedTask {
    #[serde(flatten)]
    pub task: Task,
    pub domain_title: Option<String>,
    pub overdue: bool,
}

pub fn ranked_view(
    domains: &[Domain],
    tasks: &[Task],
    language: Language,
    now: NaiveDateTime,
) -> Vec<RankedTask> {
    rank(tasks, language)
        .into_iter()
        .map(|task| RankedTask {
            domain_title: domains
                .iter()
                .find(|domain| domain.id == task.domain_id)
                .map(|domain| domain.title.clone()),
            overdue: is_overdue(task, now),
            task: task.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::data::{task_date, ColumnId};

    fn task(id: &str, end: Option<&str>, start: Option<&str>, priority: bool) -> Task {
        let mut task = Task::new(id, "d", id);
        task.end_date = end.and_then(task_date::parse);
        task.start_date = start.and_then(task_date::parse);
        task.is_priority = priority;
        task
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|task| task.id.clone()).collect()
    }

    #[test]
    fn test_date_then_priority() {
        let tasks = vec![
            task("A", Some("2024-01-10"), None, false),
            task("B", Some("2024-01-10"), None, true),
            task("C", Some("2024-01-05"), None, false),
        ];
        assert_eq!(ids(&rank(&tasks, Language::En)), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_start_date_counts_as_dated() {
        let tasks = vec![
            task("E", None, None, true),
            task("D", None, Some("2024-02-01"), false),
        ];
        assert_eq!(ids(&rank(&tasks, Language::En)), vec!["D", "E"]);
    }

    #[test]
    fn test_end_date_wins_over_start_date() {
        let tasks = vec![
            task("late", Some("2024-03-01"), Some("2024-01-01"), false),
            task("early", None, Some("2024-02-01"), false),
        ];
        assert_eq!(ids(&rank(&tasks, Language::En)), vec!["early", "late"]);
    }

    #[test]
    fn test_done_tasks_are_excluded() {
        let mut done = task("done", Some("2024-01-01"), None, true);
        done.column_id = ColumnId::Done;
        let mut doing = task("doing", None, None, false);
        doing.column_id = ColumnId::InProgress;
        let tasks = vec![done, doing, task("todo", None, None, false)];

        let ranked = rank(&tasks, Language::Fr);
        assert_eq!(ids(&ranked), vec!["doing", "todo"]);
        assert!(ranked.iter().all(|task| !task.is_done()));
    }

    #[test]
    fn test_content_uses_collation() {
        let tasks = vec![
            task("zèbre", None, None, false),
            task("Étirements", None, None, false),
            task("eau", None, None, false),
        ];
        assert_eq!(
            ids(&rank(&tasks, Language::Fr)),
            vec!["eau", "Étirements", "zèbre"]
        );
    }

    #[test]
    fn test_rank_is_idempotent() {
        let tasks = vec![
            task("b", None, None, false),
            task("a", Some("2024-01-10"), None, false),
            task("c", None, Some("2024-01-10"), true),
            task("a", None, None, false),
        ];
        let first = ids(&rank(&tasks, Language::En));
        let second = ids(&rank(&tasks, Language::En));
        assert_eq!(first, second);
        assert_eq!(first, vec!["c", "a", "a", "b"]);
    }

    #[test]
    fn test_overdue_only_for_open_past_end() {
        let now = task_date::parse("2024-01-08T12:00:00").unwrap();
        let mut past = task("past", Some("2024-01-05"), None, false);
        assert!(is_overdue(&past, now));
        past.column_id = ColumnId::Done;
        assert!(!is_overdue(&past, now));
        assert!(!is_overdue(&task("future", Some("2024-01-10"), None, false), now));
        assert!(!is_overdue(&task("start", None, Some("2024-01-01"), false), now));
    }

    #[test]
    fn test_day_agenda_puts_all_day_first() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let mut all_day = task("all-day", None, Some("2024-02-01T18:00"), false);
        all_day.is_all_day = true;
        let tasks = vec![
            task("afternoon", None, Some("2024-02-01T14:00"), false),
            task("morning", None, Some("2024-02-01T08:30"), false),
            all_day,
            task("other-day", None, Some("2024-02-02T08:00"), false),
            task("undated", None, None, false),
        ];

        assert_eq!(
            ids(&day_agenda(&tasks, day)),
            vec!["all-day", "morning", "afternoon"]
        );
    }

    #[test]
    fn test_ranked_view_attaches_domain() {
        let domains = vec![Domain {
            id: "d".to_string(),
            title: "Santé".to_string(),
            description: None,
            is_priority: false,
            icon: Default::default(),
        }];
        let mut orphan = task("orphan", None, None, false);
        orphan.domain_id = "gone".to_string();
        let tasks = vec![task("late", Some("2024-01-01"), None, false), orphan];
        let now = task_date::parse("2024-01-02").unwrap();

        let view = ranked_view(&domains, &tasks, Language::Fr, now);
        assert_eq!(view[0].domain_title.as_deref(), Some("Santé"));
        assert!(view[0].overdue);
        assert_eq!(view[1].domain_title, None);
    }
}
