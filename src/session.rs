//! Per-user application state, created at sign-in and dropped at sign-out.
//!
//! Identity itself is not verified here: whoever signs in with a user id is
//! that user until they sign out.

use chrono::{DateTime, Utc};
use log::{info, warn};
use rocket::http::Status;
use rocket::request::{self, FromRequest, Request};
use rocket::serde::json::Json;
use rocket::{post, State};
use serde::{Deserialize, Serialize};

use std::collections::HashMap;
use std::sync::Mutex;

use crate::internal_error::{InternalError, InternalResult};
use crate::planner::data::UserID;
use crate::planner::progress::{CompletionNotice, ProgressReport};
use crate::planner::store::PlannerStore;

pub const USER_HEADER: &str = "X-User-Id";

#[derive(Debug, Clone)]
pub struct Session {
    pub signed_in_at: DateTime<Utc>,
    pub notice: CompletionNotice,
}

#[derive(Default)]
pub struct Sessions {
    sessions: Mutex<HashMap<UserID, Session>>,
}

impl Sessions {
    /// Returns false when the user already had a session, which is kept.
    pub fn sign_in(&self, user: &str) -> InternalResult<bool> {
        let mut sessions = self.sessions.lock()?;
        if sessions.contains_key(user) {
            return Ok(false);
        }

        sessions.insert(
            user.to_string(),
            Session {
                signed_in_at: Utc::now(),
                notice: CompletionNotice::default(),
            },
        );
        Ok(true)
    }

    pub fn sign_out(&self, user: &str) -> InternalResult<bool> {
        Ok(self.sessions.lock()?.remove(user).is_some())
    }

    pub fn is_signed_in(&self, user: &str) -> InternalResult<bool> {
        Ok(self.sessions.lock()?.contains_key(user))
    }

    pub fn with_session<T>(&self, user: &str, f: impl FnOnce(&mut Session) -> T) -> InternalResult<T> {
        let mut sessions = self.sessions.lock()?;
        let session = sessions
            .get_mut(user)
            .ok_or_else(|| InternalError::Unauthorized(format!("user {}", user)))?;
        Ok(f(session))
    }
}

/// Request guard for routes that need a signed-in user.
pub struct SignedIn(pub UserID);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SignedIn {
    type Error = InternalError;

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let user = match request.headers().get_one(USER_HEADER).map(str::trim) {
            Some(user) if !user.is_empty() => user.to_string(),
            _ => {
                return request::Outcome::Error((
                    Status::Unauthorized,
                    InternalError::Unauthorized(format!("missing {} header", USER_HEADER)),
                ))
            }
        };

        let sessions = match request.rocket().state::<Sessions>() {
            Some(sessions) => sessions,
            None => {
                return request::Outcome::Error((
                    Status::InternalServerError,
                    InternalError::from("session registry is not managed"),
                ))
            }
        };

        match sessions.is_signed_in(&user) {
            Ok(true) => request::Outcome::Success(SignedIn(user)),
            Ok(false) => request::Outcome::Error((
                Status::Unauthorized,
                InternalError::Unauthorized(format!("user {}", user)),
            )),
            Err(e) => request::Outcome::Error((e.status(), e)),
        }
    }
}

/// Computes the user's progress and runs it through their completion notice.
pub fn observe_progress(
    store: &impl PlannerStore,
    sessions: &Sessions,
    user: &str,
) -> InternalResult<ProgressReport> {
    let (domains, tasks) = store.snapshot(user)?;
    let mut report = ProgressReport::compute(&domains, &tasks);

    // Signed out mid-request: the write stands, only the notice is lost.
    report.goal_completed = match sessions.with_session(user, |session| session.notice.observe(report.overall)) {
        Ok(fired) => fired,
        Err(InternalError::Unauthorized(_)) => {
            warn!("User {} signed out before progress could be observed", user);
            false
        }
        Err(e) => return Err(e),
    };
    if report.goal_completed {
        info!("User {} reached 100% on their goal", user);
    }

    Ok(report)
}

/// New goal, fresh notice.
pub fn reset_notice(sessions: &Sessions, user: &str) -> InternalResult<()> {
    sessions.with_session(user, |session| session.notice.reset())
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub user_id: UserID,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user_id: UserID,
    pub signed_in_at: DateTime<Utc>,
}

#[post("/sign_in", format = "json", data = "<sign_in_request>")]
pub fn sign_in(
    sign_in_request: Json<SignInRequest>,
    sessions: &State<Sessions>,
) -> InternalResult<Json<SessionInfo>> {
    let user = sign_in_request.user_id.trim();
    if user.is_empty() {
        return Err(InternalError::InvalidInput("user id must not be empty".to_string()));
    }

    if sessions.sign_in(user)? {
        info!("User {} signed in", user);
    }
    let signed_in_at = sessions.with_session(user, |session| session.signed_in_at)?;

    Ok(Json(SessionInfo {
        user_id: user.to_string(),
        signed_in_at,
    }))
}

#[post("/sign_out")]
pub fn sign_out(user: SignedIn, sessions: &State<Sessions>) -> InternalResult<()> {
    sessions.sign_out(&user.0)?;
    info!("User {} signed out", user.0);

    Ok(())
}
