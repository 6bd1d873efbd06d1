use serde::{Deserialize, Serialize};

use crate::planner::data::{Domain, MainGoal};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GoalCategory {
    Career,
    Sport,
    Business,
    General,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DiscoveryAnswer {
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Serialize, Debug)]
pub struct SetupSuggestion {
    pub category: GoalCategory,
    pub questions: Vec<&'static str>,
    pub domains: Vec<&'static str>,
}

#[derive(Deserialize, Debug)]
pub struct SetupRequest {
    pub title: String,
    #[serde(default)]
    pub answers: Vec<DiscoveryAnswer>,
    pub domains: Vec<String>,
}

#[derive(Serialize, Debug)]
pub struct SetupResult {
    pub goal: MainGoal,
    pub domains: Vec<Domain>,
}
