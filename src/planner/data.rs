use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use super::progress::ProgressReport;

pub type UserID = String;
pub type GoalID = String;
pub type DomainID = String;
pub type TaskID = String;

/// A user may split the active goal into at most this many domains.
pub const MAX_DOMAINS: usize = 8;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColumnId {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl ColumnId {
    pub const ALL: [ColumnId; 3] = [ColumnId::Todo, ColumnId::InProgress, ColumnId::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnId::Todo => "todo",
            ColumnId::InProgress => "inprogress",
            ColumnId::Done => "done",
        }
    }

    /// `done` is the only column that counts toward progress.
    pub fn is_done(&self) -> bool {
        *self == ColumnId::Done
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown column: {0}")]
pub struct UnknownColumn(String);

impl FromStr for ColumnId {
    type Err = UnknownColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColumnId::ALL
            .iter()
            .copied()
            .find(|column| column.as_str() == s)
            .ok_or_else(|| UnknownColumn(s.to_string()))
    }
}

impl ToSql for ColumnId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ColumnId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse::<ColumnId>()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Symbolic icon shown on a domain card.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(from = "String")]
pub enum DomainIcon {
    Users,
    #[default]
    Lightbulb,
    Network,
    HeartPulse,
    LineChart,
    Scale,
    Briefcase,
    ShieldCheck,
}

impl DomainIcon {
    /// Icons handed out, in order, to domains created by the setup wizard.
    pub const POOL: [DomainIcon; 8] = [
        DomainIcon::Users,
        DomainIcon::Lightbulb,
        DomainIcon::Network,
        DomainIcon::HeartPulse,
        DomainIcon::LineChart,
        DomainIcon::Scale,
        DomainIcon::Briefcase,
        DomainIcon::ShieldCheck,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DomainIcon::Users => "Users",
            DomainIcon::Lightbulb => "Lightbulb",
            DomainIcon::Network => "Network",
            DomainIcon::HeartPulse => "HeartPulse",
            DomainIcon::LineChart => "LineChart",
            DomainIcon::Scale => "Scale",
            DomainIcon::Briefcase => "Briefcase",
            DomainIcon::ShieldCheck => "ShieldCheck",
        }
    }

    /// Unknown names fall back to the lightbulb.
    pub fn from_name(name: &str) -> Self {
        DomainIcon::POOL
            .iter()
            .copied()
            .find(|icon| icon.name() == name)
            .unwrap_or_default()
    }

    pub fn for_index(index: usize) -> Self {
        DomainIcon::POOL[index % DomainIcon::POOL.len()]
    }
}

impl From<String> for DomainIcon {
    fn from(name: String) -> Self {
        DomainIcon::from_name(&name)
    }
}

impl ToSql for DomainIcon {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.name()))
    }
}

impl FromSql for DomainIcon {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(DomainIcon::from_name(value.as_str()?))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MainGoal {
    pub id: GoalID,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub domain_count: Option<u32>,
    pub task_count: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: DomainID,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_priority: bool,
    #[serde(default)]
    pub icon: DomainIcon,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskID,
    pub domain_id: DomainID,
    #[serde(default)]
    pub column_id: ColumnId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, with = "task_date", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default, with = "task_date", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub is_priority: bool,
    #[serde(default)]
    pub is_all_day: bool,
}

impl Task {
    pub fn new(id: &str, domain_id: &str, content: &str) -> Self {
        Task {
            id: id.to_string(),
            domain_id: domain_id.to_string(),
            column_id: ColumnId::Todo,
            content: content.to_string(),
            description: None,
            start_date: None,
            end_date: None,
            is_priority: false,
            is_all_day: false,
        }
    }

    /// End date if present, otherwise start date.
    pub fn effective_date(&self) -> Option<NaiveDateTime> {
        self.end_date.or(self.start_date)
    }

    pub fn is_done(&self) -> bool {
        self.column_id.is_done()
    }
}

/// A completed goal as shown in the accomplishments list.
#[derive(Serialize, Debug, Clone)]
pub struct Accomplishment {
    #[serde(flatten)]
    pub goal: MainGoal,
    pub duration_days: i64,
}

impl Accomplishment {
    pub fn from_goal(goal: MainGoal) -> Self {
        let end = goal.completed_at.unwrap_or_else(Utc::now);
        let diff = (end - goal.created_at).num_days();
        let duration_days = if diff >= 0 { diff + 1 } else { 1 };

        Accomplishment {
            goal,
            duration_days,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct GoalFields {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DomainFields {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_priority: bool,
    #[serde(default)]
    pub icon: DomainIcon,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TaskFields {
    pub domain_id: DomainID,
    pub content: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "task_date")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default, with = "task_date")]
    pub end_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub is_priority: bool,
    #[serde(default)]
    pub is_all_day: bool,
}

/// A task mutation together with the progress it leaves behind.
#[derive(Serialize, Debug)]
pub struct TaskChange {
    pub task: Task,
    pub progress: ProgressReport,
}

#[derive(Serialize, Debug)]
pub struct DomainChange {
    pub domain: Domain,
    pub progress: ProgressReport,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SetDomainRequest {
    pub domain_id: DomainID,
    pub domain: DomainFields,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDomainRequest {
    pub domain_id: DomainID,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SetTaskRequest {
    pub task_id: TaskID,
    pub task: TaskFields,
    /// Leaves the column untouched when absent.
    #[serde(default)]
    pub column_id: Option<ColumnId>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MoveTaskRequest {
    pub task_id: TaskID,
    pub column_id: ColumnId,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTaskRequest {
    pub task_id: TaskID,
}

/// Task dates travel as ISO strings. Date-only input means midnight.
pub mod task_date {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        if let Ok(date) = DateTime::parse_from_rfc3339(s) {
            return Some(date.naive_utc());
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(date) = NaiveDateTime::parse_from_str(s, format) {
                return Some(date);
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    }

    pub fn serialize<S>(date: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_some(&date.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", s))),
        }
    }
}
