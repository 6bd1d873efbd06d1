use chrono::{DateTime, Utc};

use crate::internal_error::InternalResult;

use super::data::*;

/// Goal, domain and task persistence, scoped by the owning user.
///
/// The progress and ranking code never sees this trait: it works on the
/// snapshots these methods return.
pub trait PlannerStore {
    fn active_goal(&self, user: &str) -> InternalResult<Option<MainGoal>>;
    /// Fails with a conflict while another goal is still active.
    fn add_goal(&self, user: &str, goal: &GoalFields) -> InternalResult<MainGoal>;
    fn set_goal(&self, user: &str, goal: &GoalFields) -> InternalResult<MainGoal>;
    /// Archives the active goal with its domain and task counts, then clears
    /// the user's domains and tasks.
    fn complete_goal(&self, user: &str, now: DateTime<Utc>) -> InternalResult<MainGoal>;
    /// Completed goals, most recent first.
    fn accomplishments(&self, user: &str) -> InternalResult<Vec<MainGoal>>;

    fn domains(&self, user: &str) -> InternalResult<Vec<Domain>>;
    fn add_domain(&self, user: &str, domain: &DomainFields) -> InternalResult<Domain>;
    fn set_domain(&self, user: &str, domain_id: &str, domain: &DomainFields)
        -> InternalResult<Domain>;
    /// Also deletes the domain's tasks.
    fn delete_domain(&self, user: &str, domain_id: &str) -> InternalResult<()>;

    fn tasks(&self, user: &str) -> InternalResult<Vec<Task>>;
    /// New tasks start in `todo`.
    fn add_task(&self, user: &str, task: &TaskFields) -> InternalResult<Task>;
    fn set_task(
        &self,
        user: &str,
        task_id: &str,
        task: &TaskFields,
        column: Option<ColumnId>,
    ) -> InternalResult<Task>;
    fn move_task(&self, user: &str, task_id: &str, column: ColumnId) -> InternalResult<Task>;
    fn delete_task(&self, user: &str, task_id: &str) -> InternalResult<()>;

    fn snapshot(&self, user: &str) -> InternalResult<(Vec<Domain>, Vec<Task>)> {
        Ok((self.domains(user)?, self.tasks(user)?))
    }
}
