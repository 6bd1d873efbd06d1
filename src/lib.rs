#[macro_use]
extern crate rocket;

use log::error;
use rocket::fairing::{self, AdHoc};
use rocket::figment::Figment;
use rocket::{Build, Rocket};

use std::sync::{Arc, Mutex};

pub mod data;
pub mod internal_error;
pub mod planner;
pub mod session;
pub mod wizard;

use data::{open_database, DBConnection, PlannerConfig};
use planner::endpoints;
use session::Sessions;

/// Server configured from `Rocket.toml` and `ROCKET_*` variables.
pub fn rocket() -> Rocket<Build> {
    build(rocket::Config::figment())
}

pub fn build(figment: Figment) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(AdHoc::try_on_ignite(
            "Planner database",
            open_planner_database,
        ))
        .manage(Sessions::default())
        .mount(
            "/api",
            routes![
                session::sign_in,
                session::sign_out,
                endpoints::get_goal,
                endpoints::add_goal,
                endpoints::set_goal,
                endpoints::complete_goal,
                endpoints::get_accomplishments,
                endpoints::get_domains,
                endpoints::add_domain,
                endpoints::set_domain,
                endpoints::delete_domain,
                endpoints::get_tasks,
                endpoints::add_task,
                endpoints::set_task,
                endpoints::move_task,
                endpoints::delete_task,
                endpoints::get_progress,
                endpoints::get_ranked_tasks,
                endpoints::get_day_agenda,
                wizard::endpoints::suggest_setup,
                wizard::endpoints::setup_goal,
            ],
        )
}

async fn open_planner_database(rocket: Rocket<Build>) -> fairing::Result {
    let config: PlannerConfig = match rocket.figment().extract() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid planner configuration: {}", e);
            return Err(rocket);
        }
    };

    match open_database(&config.database) {
        Ok(connection) => {
            let connection: DBConnection = Arc::new(Mutex::new(connection));
            Ok(rocket.manage(connection).manage(config))
        }
        Err(e) => {
            error!("Could not open database {}: {}", config.database, e);
            Err(rocket)
        }
    }
}
