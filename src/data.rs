use log::info;
use rusqlite::{params, Connection};
use serde::Deserialize;
use std::sync::{Arc, Mutex};

use crate::internal_error::InternalResult;
use crate::planner::collation::Language;

pub type DBConnection = Arc<Mutex<Connection>>;

/// Application keys read from `Rocket.toml` / `ROCKET_*` environment variables.
#[derive(Deserialize, Debug, Clone)]
pub struct PlannerConfig {
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_language")]
    pub default_language: String,
}

fn default_database() -> String {
    "harada.db".to_string()
}

fn default_language() -> String {
    "fr".to_string()
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            database: default_database(),
            default_language: default_language(),
        }
    }
}

impl PlannerConfig {
    /// The requested language if recognised, else the configured default.
    pub fn language(&self, requested: Option<&str>) -> Language {
        requested
            .and_then(Language::from_code)
            .or_else(|| Language::from_code(&self.default_language))
            .unwrap_or(Language::Fr)
    }
}

pub fn open_database(path: &str) -> InternalResult<Connection> {
    let connection = if path == ":memory:" {
        Connection::open_in_memory()?
    } else {
        Connection::open(path)?
    };

    create_tables(&connection)?;
    info!("Opened planner database at {}", path);

    Ok(connection)
}

pub fn create_tables(connection: &Connection) -> InternalResult<()> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS main_goals (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            completed_at TEXT,
            domain_count INTEGER,
            task_count INTEGER
        )",
        params![],
    )?;
    // One active goal per user.
    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_main_goals_active
            ON main_goals(user_id) WHERE completed_at IS NULL",
        params![],
    )?;
    connection.execute(
        "CREATE TABLE IF NOT EXISTS domains (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            is_priority INTEGER NOT NULL DEFAULT 0,
            icon TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0
        )",
        params![],
    )?;
    connection.execute(
        "CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            domain_id TEXT NOT NULL REFERENCES domains(id) ON DELETE CASCADE,
            column_id TEXT NOT NULL DEFAULT 'todo',
            content TEXT NOT NULL,
            description TEXT,
            start_date TEXT,
            end_date TEXT,
            is_priority INTEGER NOT NULL DEFAULT 0,
            is_all_day INTEGER NOT NULL DEFAULT 0
        )",
        params![],
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_tasks_domain ON tasks(domain_id)",
        params![],
    )?;

    Ok(())
}
