//! Completion percentages for domains and for the whole goal.
//!
//! Everything here is pure: callers hand in already-loaded snapshots and get
//! integers back. Percentages are rounded half up.

use serde::Serialize;

use super::data::{Domain, DomainID, Task};

fn rounded_percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    // round(100 * part / whole), half up
    ((200 * part + whole) / (2 * whole)).min(100) as u8
}

/// Share of a domain's tasks sitting in the `done` column.
pub fn domain_progress(domain_id: &str, tasks: &[Task]) -> u8 {
    let (done, total) = tasks
        .iter()
        .filter(|task| task.domain_id == domain_id)
        .fold((0, 0), |(done, total), task| {
            (done + task.is_done() as usize, total + 1)
        });

    rounded_percent(done, total)
}

/// Unweighted mean of every domain's progress.
pub fn overall_progress(domains: &[Domain], tasks: &[Task]) -> u8 {
    if domains.is_empty() {
        return 0;
    }

    let sum: usize = domains
        .iter()
        .map(|domain| domain_progress(&domain.id, tasks) as usize)
        .sum();
    let count = domains.len();

    ((2 * sum + count) / (2 * count)).min(100) as u8
}

/// Fires once when the goal reaches 100%, then stays quiet until progress
/// drops below 100 again or a new goal starts.
#[derive(Debug, Clone, Default)]
pub struct CompletionNotice {
    shown: bool,
}

impl CompletionNotice {
    pub fn observe(&mut self, overall: u8) -> bool {
        if overall < 100 {
            self.shown = false;
            return false;
        }

        if self.shown {
            false
        } else {
            self.shown = true;
            true
        }
    }

    pub fn reset(&mut self) {
        self.shown = false;
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DomainProgress {
    pub domain_id: DomainID,
    pub progress: u8,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub domains: Vec<DomainProgress>,
    pub overall: u8,
    /// Set on the one observation where the goal first hits 100%.
    pub goal_completed: bool,
}

impl ProgressReport {
    pub fn compute(domains: &[Domain], tasks: &[Task]) -> Self {
        ProgressReport {
            domains: domains
                .iter()
                .map(|domain| DomainProgress {
                    domain_id: domain.id.clone(),
                    progress: domain_progress(&domain.id, tasks),
                })
                .collect(),
            overall: overall_progress(domains, tasks),
            goal_completed: false,
        }
    }
}
