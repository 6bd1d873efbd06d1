use chrono::{DateTime, Utc};
use log::{debug, info};
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use std::sync::OnceLock;

use crate::internal_error::{InternalError, InternalResult};

use super::data::*;
use super::store::PlannerStore;

const GOAL_COLUMNS: &str =
    "id, title, description, created_at, completed_at, domain_count, task_count";
const DOMAIN_COLUMNS: &str = "id, title, description, is_priority, icon";
const TASK_COLUMNS: &str = "id, domain_id, column_id, content, description, start_date, end_date, is_priority, is_all_day";

pub fn goal_from_row(row: &Row) -> rusqlite::Result<MainGoal> {
    Ok(MainGoal {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        completed_at: row.get(4)?,
        domain_count: row.get(5)?,
        task_count: row.get(6)?,
    })
}

pub fn domain_from_row(row: &Row) -> rusqlite::Result<Domain> {
    Ok(Domain {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        is_priority: row.get(3)?,
        icon: row.get(4)?,
    })
}

pub fn task_from_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        domain_id: row.get(1)?,
        column_id: row.get(2)?,
        content: row.get(3)?,
        description: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        is_priority: row.get(7)?,
        is_all_day: row.get(8)?,
    })
}

/// Lowercased title with spaces as dashes and other symbols dropped, plus a
/// UUID so two domains with the same title stay distinct.
pub fn new_domain_id(title: &str) -> DomainID {
    static SPACES: OnceLock<Regex> = OnceLock::new();
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    let spaces = SPACES.get_or_init(|| Regex::new(r"\s+").expect("valid regex"));
    let non_word = NON_WORD.get_or_init(|| Regex::new(r"[^\w-]+").expect("valid regex"));

    let lowered = title.trim().to_lowercase();
    let dashed = spaces.replace_all(&lowered, "-");
    let slug = non_word.replace_all(&dashed, "");

    format!("{}-{}", slug, Uuid::new_v4())
}

fn required_text(value: &str, what: &str) -> InternalResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(InternalError::InvalidInput(format!("{} must not be empty", what)));
    }
    Ok(trimmed.to_string())
}

fn domain_is_owned(db_connection: &Connection, user: &str, domain_id: &str) -> InternalResult<bool> {
    let count: i64 = db_connection.query_row(
        "SELECT COUNT(*) FROM domains WHERE id = ?1 AND user_id = ?2",
        params![domain_id, user],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn require_owned_domain(db_connection: &Connection, user: &str, domain_id: &str) -> InternalResult<()> {
    if domain_is_owned(db_connection, user, domain_id)? {
        Ok(())
    } else {
        Err(InternalError::NotFound(format!("domain {}", domain_id)))
    }
}

fn count_rows(db_connection: &Connection, table: &str, user: &str) -> InternalResult<u32> {
    let count: i64 = db_connection.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE user_id = ?1", table),
        params![user],
        |row| row.get(0),
    )?;
    Ok(count as u32)
}

pub fn find_domain(db_connection: &Connection, user: &str, domain_id: &str) -> InternalResult<Option<Domain>> {
    let domain = db_connection
        .query_row(
            &format!(
                "SELECT {} FROM domains WHERE id = ?1 AND user_id = ?2",
                DOMAIN_COLUMNS
            ),
            params![domain_id, user],
            domain_from_row,
        )
        .optional()?;
    Ok(domain)
}

pub fn find_task(db_connection: &Connection, user: &str, task_id: &str) -> InternalResult<Option<Task>> {
    let task = db_connection
        .query_row(
            &format!("SELECT {} FROM tasks WHERE id = ?1 AND user_id = ?2", TASK_COLUMNS),
            params![task_id, user],
            task_from_row,
        )
        .optional()?;
    Ok(task)
}

fn existing_task(db_connection: &Connection, user: &str, task_id: &str) -> InternalResult<Task> {
    find_task(db_connection, user, task_id)?
        .ok_or_else(|| InternalError::NotFound(format!("task {}", task_id)))
}

impl PlannerStore for Connection {
    fn active_goal(&self, user: &str) -> InternalResult<Option<MainGoal>> {
        let goal = self
            .query_row(
                &format!(
                    "SELECT {} FROM main_goals WHERE user_id = ?1 AND completed_at IS NULL",
                    GOAL_COLUMNS
                ),
                params![user],
                goal_from_row,
            )
            .optional()?;
        Ok(goal)
    }

    fn add_goal(&self, user: &str, goal: &GoalFields) -> InternalResult<MainGoal> {
        let title = required_text(&goal.title, "goal title")?;
        if self.active_goal(user)?.is_some() {
            return Err(InternalError::Conflict(
                "an active goal already exists".to_string(),
            ));
        }

        let main_goal = MainGoal {
            id: Uuid::new_v4().to_string(),
            title,
            description: goal.description.clone(),
            created_at: Utc::now(),
            completed_at: None,
            domain_count: None,
            task_count: None,
        };
        self.execute(
            "INSERT INTO main_goals (id, user_id, title, description, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                main_goal.id,
                user,
                main_goal.title,
                main_goal.description,
                main_goal.created_at
            ],
        )?;
        info!("User {} started goal {}", user, main_goal.id);

        Ok(main_goal)
    }

    fn set_goal(&self, user: &str, goal: &GoalFields) -> InternalResult<MainGoal> {
        let title = required_text(&goal.title, "goal title")?;
        let changed = self.execute(
            "UPDATE main_goals SET title = ?1, description = ?2
                WHERE user_id = ?3 AND completed_at IS NULL",
            params![title, goal.description, user],
        )?;
        if changed == 0 {
            return Err(InternalError::NotFound("active goal".to_string()));
        }

        self.active_goal(user)?
            .ok_or_else(|| InternalError::NotFound("active goal".to_string()))
    }

    fn complete_goal(&self, user: &str, now: DateTime<Utc>) -> InternalResult<MainGoal> {
        let transaction = self.unchecked_transaction()?;

        let mut goal = self
            .active_goal(user)?
            .ok_or_else(|| InternalError::NotFound("active goal".to_string()))?;
        let domain_count = count_rows(self, "domains", user)?;
        let task_count = count_rows(self, "tasks", user)?;

        self.execute(
            "UPDATE main_goals SET completed_at = ?1, domain_count = ?2, task_count = ?3
                WHERE id = ?4",
            params![now, domain_count, task_count, goal.id],
        )?;
        self.execute("DELETE FROM tasks WHERE user_id = ?1", params![user])?;
        self.execute("DELETE FROM domains WHERE user_id = ?1", params![user])?;

        transaction.commit()?;

        goal.completed_at = Some(now);
        goal.domain_count = Some(domain_count);
        goal.task_count = Some(task_count);
        info!(
            "User {} completed goal {} ({} domains, {} tasks)",
            user, goal.id, domain_count, task_count
        );

        Ok(goal)
    }

    fn accomplishments(&self, user: &str) -> InternalResult<Vec<MainGoal>> {
        let mut statement = self.prepare(&format!(
            "SELECT {} FROM main_goals WHERE user_id = ?1 AND completed_at IS NOT NULL
                ORDER BY completed_at DESC",
            GOAL_COLUMNS
        ))?;
        let goals = statement
            .query_map(params![user], goal_from_row)?
            .collect::<rusqlite::Result<Vec<MainGoal>>>()?;
        Ok(goals)
    }

    fn domains(&self, user: &str) -> InternalResult<Vec<Domain>> {
        let mut statement = self.prepare(&format!(
            "SELECT {} FROM domains WHERE user_id = ?1 ORDER BY position, rowid",
            DOMAIN_COLUMNS
        ))?;
        let domains = statement
            .query_map(params![user], domain_from_row)?
            .collect::<rusqlite::Result<Vec<Domain>>>()?;
        Ok(domains)
    }

    fn add_domain(&self, user: &str, domain: &DomainFields) -> InternalResult<Domain> {
        let title = required_text(&domain.title, "domain title")?;
        if self.active_goal(user)?.is_none() {
            return Err(InternalError::Conflict(
                "create a main goal before adding domains".to_string(),
            ));
        }
        if count_rows(self, "domains", user)? as usize >= MAX_DOMAINS {
            return Err(InternalError::Conflict(format!(
                "a goal has at most {} domains",
                MAX_DOMAINS
            )));
        }

        let new_domain = Domain {
            id: new_domain_id(&title),
            title,
            description: domain.description.clone(),
            is_priority: domain.is_priority,
            icon: domain.icon,
        };
        self.execute(
            "INSERT INTO domains (id, user_id, title, description, is_priority, icon, position)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6,
                    (SELECT COALESCE(MAX(position) + 1, 0) FROM domains WHERE user_id = ?2))",
            params![
                new_domain.id,
                user,
                new_domain.title,
                new_domain.description,
                new_domain.is_priority,
                new_domain.icon
            ],
        )?;
        debug!("User {} added domain {}", user, new_domain.id);

        Ok(new_domain)
    }

    fn set_domain(&self, user: &str, domain_id: &str, domain: &DomainFields) -> InternalResult<Domain> {
        let title = required_text(&domain.title, "domain title")?;
        let changed = self.execute(
            "UPDATE domains SET title = ?1, description = ?2, is_priority = ?3, icon = ?4
                WHERE id = ?5 AND user_id = ?6",
            params![
                title,
                domain.description,
                domain.is_priority,
                domain.icon,
                domain_id,
                user
            ],
        )?;
        if changed == 0 {
            return Err(InternalError::NotFound(format!("domain {}", domain_id)));
        }

        find_domain(self, user, domain_id)?
            .ok_or_else(|| InternalError::NotFound(format!("domain {}", domain_id)))
    }

    fn delete_domain(&self, user: &str, domain_id: &str) -> InternalResult<()> {
        let changed = self.execute(
            "DELETE FROM domains WHERE id = ?1 AND user_id = ?2",
            params![domain_id, user],
        )?;
        if changed == 0 {
            return Err(InternalError::NotFound(format!("domain {}", domain_id)));
        }
        debug!("User {} deleted domain {}", user, domain_id);

        Ok(())
    }

    fn tasks(&self, user: &str) -> InternalResult<Vec<Task>> {
        let mut statement = self.prepare(&format!(
            "SELECT {} FROM tasks WHERE user_id = ?1 ORDER BY rowid",
            TASK_COLUMNS
        ))?;
        let tasks = statement
            .query_map(params![user], task_from_row)?
            .collect::<rusqlite::Result<Vec<Task>>>()?;
        Ok(tasks)
    }

    fn add_task(&self, user: &str, task: &TaskFields) -> InternalResult<Task> {
        let content = required_text(&task.content, "task content")?;
        require_owned_domain(self, user, &task.domain_id)?;

        let new_task = Task {
            id: Uuid::new_v4().to_string(),
            domain_id: task.domain_id.clone(),
            column_id: ColumnId::Todo,
            content,
            description: task.description.clone(),
            start_date: task.start_date,
            end_date: task.end_date,
            is_priority: task.is_priority,
            is_all_day: task.is_all_day,
        };
        self.execute(
            &format!(
                "INSERT INTO tasks (user_id, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                TASK_COLUMNS
            ),
            params![
                user,
                new_task.id,
                new_task.domain_id,
                new_task.column_id,
                new_task.content,
                new_task.description,
                new_task.start_date,
                new_task.end_date,
                new_task.is_priority,
                new_task.is_all_day
            ],
        )?;
        debug!("User {} added task {}", user, new_task.id);

        Ok(new_task)
    }

    fn set_task(
        &self,
        user: &str,
        task_id: &str,
        task: &TaskFields,
        column: Option<ColumnId>,
    ) -> InternalResult<Task> {
        let content = required_text(&task.content, "task content")?;
        existing_task(self, user, task_id)?;
        require_owned_domain(self, user, &task.domain_id)?;

        self.execute(
            "UPDATE tasks SET domain_id = ?1, column_id = COALESCE(?2, column_id), content = ?3,
                description = ?4, start_date = ?5, end_date = ?6, is_priority = ?7, is_all_day = ?8
                WHERE id = ?9 AND user_id = ?10",
            params![
                task.domain_id,
                column,
                content,
                task.description,
                task.start_date,
                task.end_date,
                task.is_priority,
                task.is_all_day,
                task_id,
                user
            ],
        )?;

        existing_task(self, user, task_id)
    }

    fn move_task(&self, user: &str, task_id: &str, column: ColumnId) -> InternalResult<Task> {
        let changed = self.execute(
            "UPDATE tasks SET column_id = ?1 WHERE id = ?2 AND user_id = ?3",
            params![column, task_id, user],
        )?;
        if changed == 0 {
            return Err(InternalError::NotFound(format!("task {}", task_id)));
        }
        debug!("User {} moved task {} to {}", user, task_id, column);

        existing_task(self, user, task_id)
    }

    fn delete_task(&self, user: &str, task_id: &str) -> InternalResult<()> {
        let changed = self.execute(
            "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
            params![task_id, user],
        )?;
        if changed == 0 {
            return Err(InternalError::NotFound(format!("task {}", task_id)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::open_database;

    const USER: &str = "alice";

    fn store_with_goal() -> Connection {
        let connection = open_database(":memory:").unwrap();
        connection
            .add_goal(
                USER,
                &GoalFields {
                    title: "Courir un marathon".to_string(),
                    description: String::new(),
                },
            )
            .unwrap();
        connection
    }

    fn domain_fields(title: &str) -> DomainFields {
        DomainFields {
            title: title.to_string(),
            description: None,
            is_priority: false,
            icon: DomainIcon::HeartPulse,
        }
    }

    fn task_fields(domain_id: &str, content: &str) -> TaskFields {
        TaskFields {
            domain_id: domain_id.to_string(),
            content: content.to_string(),
            description: None,
            start_date: task_date::parse("2024-02-01"),
            end_date: None,
            is_priority: true,
            is_all_day: false,
        }
    }

    #[test]
    fn test_domain_id_is_slugged() {
        let id = new_domain_id("  Santé & Bien-être ");
        assert!(id.starts_with("santé--bien-être-"), "{}", id);
        assert_ne!(new_domain_id("Health"), new_domain_id("Health"));
    }

    #[test]
    fn test_only_one_active_goal() {
        let store = store_with_goal();
        let second = store.add_goal(
            USER,
            &GoalFields {
                title: "Another".to_string(),
                description: String::new(),
            },
        );
        assert!(matches!(second, Err(InternalError::Conflict(_))));

        // Other users are unaffected.
        assert!(store
            .add_goal(
                "bob",
                &GoalFields {
                    title: "Lancer ma startup".to_string(),
                    description: String::new(),
                },
            )
            .is_ok());
    }

    #[test]
    fn test_set_goal_requires_active_goal() {
        let store = open_database(":memory:").unwrap();
        let fields = GoalFields {
            title: "x".to_string(),
            description: String::new(),
        };
        assert!(matches!(
            store.set_goal(USER, &fields),
            Err(InternalError::NotFound(_))
        ));
    }

    #[test]
    fn test_task_round_trip() {
        let store = store_with_goal();
        let domain = store.add_domain(USER, &domain_fields("Endurance")).unwrap();
        let task = store
            .add_task(USER, &task_fields(&domain.id, "Sortie longue"))
            .unwrap();

        assert_eq!(task.column_id, ColumnId::Todo);
        assert_eq!(store.tasks(USER).unwrap(), vec![task.clone()]);
        assert_eq!(store.domains(USER).unwrap()[0].icon, DomainIcon::HeartPulse);

        let moved = store.move_task(USER, &task.id, ColumnId::Done).unwrap();
        assert!(moved.is_done());
        assert_eq!(moved.start_date, task.start_date);
    }

    #[test]
    fn test_domain_limit() {
        let store = store_with_goal();
        for i in 0..MAX_DOMAINS {
            store
                .add_domain(USER, &domain_fields(&format!("Domain {}", i)))
                .unwrap();
        }
        let ninth = store.add_domain(USER, &domain_fields("One too many"));
        assert!(matches!(ninth, Err(InternalError::Conflict(_))));

        let titles: Vec<String> = store
            .domains(USER)
            .unwrap()
            .into_iter()
            .map(|domain| domain.title)
            .collect();
        assert_eq!(titles[0], "Domain 0");
        assert_eq!(titles[7], "Domain 7");
    }

    #[test]
    fn test_task_needs_owned_domain() {
        let store = store_with_goal();
        let domain = store.add_domain(USER, &domain_fields("Nutrition")).unwrap();

        let foreign = store.add_task("bob", &task_fields(&domain.id, "Steal"));
        assert!(matches!(foreign, Err(InternalError::NotFound(_))));
        let missing = store.add_task(USER, &task_fields("nope", "Lost"));
        assert!(matches!(missing, Err(InternalError::NotFound(_))));
        let blank = store.add_task(USER, &task_fields(&domain.id, "   "));
        assert!(matches!(blank, Err(InternalError::InvalidInput(_))));
    }

    #[test]
    fn test_delete_domain_cascades() {
        let store = store_with_goal();
        let kept = store.add_domain(USER, &domain_fields("Mental")).unwrap();
        let dropped = store.add_domain(USER, &domain_fields("Équipement")).unwrap();
        store.add_task(USER, &task_fields(&kept.id, "Méditer")).unwrap();
        store.add_task(USER, &task_fields(&dropped.id, "Chaussures")).unwrap();
        store.add_task(USER, &task_fields(&dropped.id, "Montre")).unwrap();

        store.delete_domain(USER, &dropped.id).unwrap();

        let tasks = store.tasks(USER).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].domain_id, kept.id);
        assert!(matches!(
            store.delete_domain(USER, &dropped.id),
            Err(InternalError::NotFound(_))
        ));
    }

    #[test]
    fn test_set_domain_updates_owned_domain() {
        let store = store_with_goal();
        let domain = store.add_domain(USER, &domain_fields("Mental")).unwrap();

        let mut fields = domain_fields("Mental fort");
        fields.description = Some("Visualiser la course".to_string());
        fields.is_priority = true;
        fields.icon = DomainIcon::ShieldCheck;
        let updated = store.set_domain(USER, &domain.id, &fields).unwrap();
        assert_eq!(updated.id, domain.id);
        assert_eq!(updated.title, "Mental fort");
        assert_eq!(updated.description.as_deref(), Some("Visualiser la course"));
        assert!(updated.is_priority);
        assert_eq!(updated.icon, DomainIcon::ShieldCheck);
        assert_eq!(store.domains(USER).unwrap(), vec![updated]);

        assert!(matches!(
            store.set_domain("bob", &domain.id, &fields),
            Err(InternalError::NotFound(_))
        ));
        assert!(matches!(
            store.set_domain(USER, "nope", &fields),
            Err(InternalError::NotFound(_))
        ));
        assert!(matches!(
            store.set_domain(USER, &domain.id, &domain_fields(" ")),
            Err(InternalError::InvalidInput(_))
        ));
        assert_eq!(store.domains(USER).unwrap()[0].title, "Mental fort");
    }

    #[test]
    fn test_delete_task_only_own() {
        let store = store_with_goal();
        let domain = store.add_domain(USER, &domain_fields("Endurance")).unwrap();
        let kept = store.add_task(USER, &task_fields(&domain.id, "10k")).unwrap();
        let dropped = store.add_task(USER, &task_fields(&domain.id, "20k")).unwrap();

        assert!(matches!(
            store.delete_task("bob", &dropped.id),
            Err(InternalError::NotFound(_))
        ));
        store.delete_task(USER, &dropped.id).unwrap();
        assert_eq!(store.tasks(USER).unwrap(), vec![kept]);
        assert!(matches!(
            store.delete_task(USER, &dropped.id),
            Err(InternalError::NotFound(_))
        ));
    }

    #[test]
    fn test_set_task_keeps_column_when_absent() {
        let store = store_with_goal();
        let domain = store.add_domain(USER, &domain_fields("Technique")).unwrap();
        let task = store.add_task(USER, &task_fields(&domain.id, "Drills")).unwrap();
        store.move_task(USER, &task.id, ColumnId::InProgress).unwrap();

        let mut fields = task_fields(&domain.id, "Drills x2");
        fields.end_date = task_date::parse("2024-02-10");
        let updated = store.set_task(USER, &task.id, &fields, None).unwrap();
        assert_eq!(updated.column_id, ColumnId::InProgress);
        assert_eq!(updated.content, "Drills x2");
        assert_eq!(updated.end_date, fields.end_date);

        let reopened = store
            .set_task(USER, &task.id, &fields, Some(ColumnId::Todo))
            .unwrap();
        assert_eq!(reopened.column_id, ColumnId::Todo);
    }

    #[test]
    fn test_complete_goal_archives_snapshot() {
        let store = store_with_goal();
        let domain = store.add_domain(USER, &domain_fields("Endurance")).unwrap();
        store.add_task(USER, &task_fields(&domain.id, "10k")).unwrap();
        store.add_task(USER, &task_fields(&domain.id, "20k")).unwrap();

        let completed = store.complete_goal(USER, Utc::now()).unwrap();
        assert!(completed.completed_at.is_some());
        assert_eq!(completed.domain_count, Some(1));
        assert_eq!(completed.task_count, Some(2));

        assert!(store.active_goal(USER).unwrap().is_none());
        assert!(store.domains(USER).unwrap().is_empty());
        assert!(store.tasks(USER).unwrap().is_empty());

        let history = store.accomplishments(USER).unwrap();
        assert_eq!(history, vec![completed]);
    }

    #[test]
    fn test_accomplishments_newest_first() {
        let store = store_with_goal();
        let first = store.complete_goal(USER, Utc::now()).unwrap();
        store
            .add_goal(
                USER,
                &GoalFields {
                    title: "Second".to_string(),
                    description: String::new(),
                },
            )
            .unwrap();
        let second = store
            .complete_goal(USER, Utc::now() + chrono::Duration::days(3))
            .unwrap();

        let ids: Vec<String> = store
            .accomplishments(USER)
            .unwrap()
            .into_iter()
            .map(|goal| goal.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }
}
