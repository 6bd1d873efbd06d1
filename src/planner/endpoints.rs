use chrono::{NaiveDate, Utc};
use rocket::serde::json::Json;
use rocket::{get, post, State};

use crate::data::{DBConnection, PlannerConfig};
use crate::internal_error::{InternalError, InternalResult};
use crate::session::{observe_progress, reset_notice, Sessions, SignedIn};

use super::data::*;
use super::progress::{overall_progress, ProgressReport};
use super::ranking::{day_agenda, ranked_view, RankedTask};
use super::store::PlannerStore;

#[get("/get_goal")]
pub fn get_goal(
    user: SignedIn,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<Option<MainGoal>>> {
    let db_connection = db_connection.lock()?;

    Ok(Json(db_connection.active_goal(&user.0)?))
}

#[post("/add_goal", format = "json", data = "<goal>")]
pub fn add_goal(
    goal: Json<GoalFields>,
    user: SignedIn,
    db_connection: &State<DBConnection>,
    sessions: &State<Sessions>,
) -> InternalResult<Json<MainGoal>> {
    let db_connection = db_connection.lock()?;

    let main_goal = db_connection.add_goal(&user.0, &goal)?;
    reset_notice(sessions, &user.0)?;

    Ok(Json(main_goal))
}

#[post("/set_goal", format = "json", data = "<goal>")]
pub fn set_goal(
    goal: Json<GoalFields>,
    user: SignedIn,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<MainGoal>> {
    let db_connection = db_connection.lock()?;

    Ok(Json(db_connection.set_goal(&user.0, &goal)?))
}

/// Archives a fully completed goal so the user can start a new one.
#[post("/complete_goal")]
pub fn complete_goal(
    user: SignedIn,
    db_connection: &State<DBConnection>,
    sessions: &State<Sessions>,
) -> InternalResult<Json<Accomplishment>> {
    let db_connection = db_connection.lock()?;

    if db_connection.active_goal(&user.0)?.is_none() {
        return Err(InternalError::NotFound("no active goal".to_string()));
    }
    let (domains, tasks) = db_connection.snapshot(&user.0)?;
    let overall = overall_progress(&domains, &tasks);
    if overall < 100 {
        return Err(InternalError::Conflict(format!(
            "goal is only {}% complete",
            overall
        )));
    }

    let goal = db_connection.complete_goal(&user.0, Utc::now())?;
    reset_notice(sessions, &user.0)?;

    Ok(Json(Accomplishment::from_goal(goal)))
}

#[get("/get_accomplishments")]
pub fn get_accomplishments(
    user: SignedIn,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<Vec<Accomplishment>>> {
    let db_connection = db_connection.lock()?;

    let accomplishments = db_connection
        .accomplishments(&user.0)?
        .into_iter()
        .map(Accomplishment::from_goal)
        .collect();

    Ok(Json(accomplishments))
}

#[get("/get_domains")]
pub fn get_domains(
    user: SignedIn,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<Vec<Domain>>> {
    let db_connection = db_connection.lock()?;

    Ok(Json(db_connection.domains(&user.0)?))
}

#[post("/add_domain", format = "json", data = "<domain>")]
pub fn add_domain(
    domain: Json<DomainFields>,
    user: SignedIn,
    db_connection: &State<DBConnection>,
    sessions: &State<Sessions>,
) -> InternalResult<Json<DomainChange>> {
    let db_connection = db_connection.lock()?;

    let domain = db_connection.add_domain(&user.0, &domain)?;
    let progress = observe_progress(&*db_connection, sessions, &user.0)?;

    Ok(Json(DomainChange { domain, progress }))
}

#[post("/set_domain", format = "json", data = "<set_domain_request>")]
pub fn set_domain(
    set_domain_request: Json<SetDomainRequest>,
    user: SignedIn,
    db_connection: &State<DBConnection>,
    sessions: &State<Sessions>,
) -> InternalResult<Json<DomainChange>> {
    let db_connection = db_connection.lock()?;

    let domain = db_connection.set_domain(
        &user.0,
        &set_domain_request.domain_id,
        &set_domain_request.domain,
    )?;
    let progress = observe_progress(&*db_connection, sessions, &user.0)?;

    Ok(Json(DomainChange { domain, progress }))
}

#[post("/delete_domain", format = "json", data = "<delete_domain_request>")]
pub fn delete_domain(
    delete_domain_request: Json<DeleteDomainRequest>,
    user: SignedIn,
    db_connection: &State<DBConnection>,
    sessions: &State<Sessions>,
) -> InternalResult<Json<ProgressReport>> {
    let db_connection = db_connection.lock()?;

    db_connection.delete_domain(&user.0, &delete_domain_request.domain_id)?;

    observe_progress(&*db_connection, sessions, &user.0).map(Json)
}

#[get("/get_tasks")]
pub fn get_tasks(
    user: SignedIn,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<Vec<Task>>> {
    let db_connection = db_connection.lock()?;

    Ok(Json(db_connection.tasks(&user.0)?))
}

#[post("/add_task", format = "json", data = "<task>")]
pub fn add_task(
    task: Json<TaskFields>,
    user: SignedIn,
    db_connection: &State<DBConnection>,
    sessions: &State<Sessions>,
) -> InternalResult<Json<TaskChange>> {
    let db_connection = db_connection.lock()?;

    let task = db_connection.add_task(&user.0, &task)?;
    let progress = observe_progress(&*db_connection, sessions, &user.0)?;

    Ok(Json(TaskChange { task, progress }))
}

#[post("/set_task", format = "json", data = "<set_task_request>")]
pub fn set_task(
    set_task_request: Json<SetTaskRequest>,
    user: SignedIn,
    db_connection: &State<DBConnection>,
    sessions: &State<Sessions>,
) -> InternalResult<Json<TaskChange>> {
    let db_connection = db_connection.lock()?;

    let task = db_connection.set_task(
        &user.0,
        &set_task_request.task_id,
        &set_task_request.task,
        set_task_request.column_id,
    )?;
    let progress = observe_progress(&*db_connection, sessions, &user.0)?;

    Ok(Json(TaskChange { task, progress }))
}

#[post("/move_task", format = "json", data = "<move_task_request>")]
pub fn move_task(
    move_task_request: Json<MoveTaskRequest>,
    user: SignedIn,
    db_connection: &State<DBConnection>,
    sessions: &State<Sessions>,
) -> InternalResult<Json<TaskChange>> {
    let db_connection = db_connection.lock()?;

    let task = db_connection.move_task(
        &user.0,
        &move_task_request.task_id,
        move_task_request.column_id,
    )?;
    let progress = observe_progress(&*db_connection, sessions, &user.0)?;

    Ok(Json(TaskChange { task, progress }))
}

#[post("/delete_task", format = "json", data = "<delete_task_request>")]
pub fn delete_task(
    delete_task_request: Json<DeleteTaskRequest>,
    user: SignedIn,
    db_connection: &State<DBConnection>,
    sessions: &State<Sessions>,
) -> InternalResult<Json<ProgressReport>> {
    let db_connection = db_connection.lock()?;

    db_connection.delete_task(&user.0, &delete_task_request.task_id)?;

    observe_progress(&*db_connection, sessions, &user.0).map(Json)
}

#[get("/get_progress")]
pub fn get_progress(
    user: SignedIn,
    db_connection: &State<DBConnection>,
    sessions: &State<Sessions>,
) -> InternalResult<Json<ProgressReport>> {
    let db_connection = db_connection.lock()?;

    observe_progress(&*db_connection, sessions, &user.0).map(Json)
}

#[get("/get_ranked_tasks?<lang>")]
pub fn get_ranked_tasks(
    lang: Option<&str>,
    user: SignedIn,
    db_connection: &State<DBConnection>,
    config: &State<PlannerConfig>,
) -> InternalResult<Json<Vec<RankedTask>>> {
    let db_connection = db_connection.lock()?;

    let (domains, tasks) = db_connection.snapshot(&user.0)?;
    let language = config.language(lang);

    Ok(Json(ranked_view(
        &domains,
        &tasks,
        language,
        Utc::now().naive_utc(),
    )))
}

#[get("/get_day_agenda/<date>")]
pub fn get_day_agenda(
    date: &str,
    user: SignedIn,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<Vec<Task>>> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| InternalError::InvalidInput(format!("invalid date {}", date)))?;

    let db_connection = db_connection.lock()?;
    let tasks = db_connection.tasks(&user.0)?;

    Ok(Json(day_agenda(&tasks, day).into_iter().cloned().collect()))
}
