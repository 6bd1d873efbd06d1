use rocket::serde::json::Json;
use rocket::{get, post, State};

use super::data::*;
use super::util;
use crate::data::{DBConnection, PlannerConfig};
use crate::internal_error::InternalResult;
use crate::session::{reset_notice, Sessions, SignedIn};

#[get("/suggest_setup?<goal>&<lang>")]
pub fn suggest_setup(
    goal: &str,
    lang: Option<&str>,
    _user: SignedIn,
    config: &State<PlannerConfig>,
) -> Json<SetupSuggestion> {
    Json(util::suggest_setup(goal, config.language(lang)))
}

#[post("/setup_goal?<lang>", format = "json", data = "<setup_request>")]
pub fn setup_goal(
    setup_request: Json<SetupRequest>,
    lang: Option<&str>,
    user: SignedIn,
    db_connection: &State<DBConnection>,
    sessions: &State<Sessions>,
    config: &State<PlannerConfig>,
) -> InternalResult<Json<SetupResult>> {
    let db_connection = db_connection.lock()?;

    let result = util::setup_goal(
        &db_connection,
        &user.0,
        &setup_request,
        config.language(lang),
    )?;
    reset_notice(sessions, &user.0)?;

    Ok(Json(result))
}
