use std::sync::Arc;

use rocket::{State, get, post, http::Status, serde::json::Json, response::status};
use time::OffsetDateTime;
use tracing::{debug, instrument};
use uuid::Uuid;

use shared::models::{
    CreatePollRequest, CredentialsRequest, PollSummary, SessionResponse, User, UserResponse,
    VoteRequest,
};
use shared::poll::Poll;
use crate::auth::{self, AuthenticatedUser, SessionStore};
use crate::error::ApiError;
use crate::store::PollStore;
use crate::utils::parse_poll_id;

const MAX_USERNAME_LENGTH: usize = 50;
const MIN_PASSWORD_LENGTH: usize = 8;

pub struct AppState {
    pub store: Arc<dyn PollStore>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(store: Arc<dyn PollStore>) -> Self {
        Self {
            store,
            sessions: SessionStore::new(),
        }
    }
}

#[rocket::options("/<_..>")]
pub async fn all_options() -> Status {
    Status::Ok
}

#[instrument(skip_all)]
#[post("/auth/register", format = "json", data = "<request>")]
pub async fn register(
    state: &State<AppState>,
    request: Json<CredentialsRequest>,
) -> Result<status::Created<Json<UserResponse>>, ApiError> {
    let request = request.into_inner();
    let username = request.username.trim().to_string();

    if username.is_empty() {
        return Err(ApiError::InvalidInput("Username must not be empty".into()));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::InvalidInput(format!(
            "Username exceeds maximum length of {MAX_USERNAME_LENGTH}"
        )));
    }
    if request.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let user = User {
        id: Uuid::new_v4(),
        username,
        password_hash: auth::hash_password(state.sessions.rng(), &request.password)?,
        created_at: OffsetDateTime::now_utc(),
    };
    state.store.insert_user(&user).await?;

    debug!("Registered user {}", user.username);
    Ok(status::Created::new(format!("/api/users/{}", user.id)).body(Json(UserResponse {
        id: user.id,
        username: user.username,
    })))
}

#[instrument(skip_all)]
#[post("/auth/login", format = "json", data = "<request>")]
pub async fn login(
    state: &State<AppState>,
    request: Json<CredentialsRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let request = request.into_inner();

    let user = state.store.find_user(request.username.trim()).await?
        .ok_or(ApiError::InvalidCredentials)?;
    if !auth::verify_password(&user.password_hash, &request.password) {
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.sessions.issue(user.id)?;
    debug!("User {} logged in", user.username);
    Ok(Json(SessionResponse { token }))
}

#[instrument(skip_all, fields(user_id = %user.id))]
#[post("/polls", format = "json", data = "<request>")]
pub async fn create_poll(
    state: &State<AppState>,
    user: AuthenticatedUser,
    request: Json<CreatePollRequest>,
) -> Result<status::Created<Json<Poll>>, ApiError> {
    let request = request.into_inner();

    let poll = Poll::new(request.title, request.options, user.id)?;
    state.store.insert_poll(&poll).await?;

    debug!("Created poll {}", poll.id);
    let location = format!("/api/polls/{}", poll.id);
    Ok(status::Created::new(location).body(Json(poll)))
}

#[get("/polls")]
pub async fn list_polls(state: &State<AppState>) -> Result<Json<Vec<PollSummary>>, ApiError> {
    Ok(Json(state.store.list_summaries().await?))
}

#[get("/polls/<id>")]
pub async fn get_poll(state: &State<AppState>, id: &str) -> Result<Json<Poll>, ApiError> {
    let id = parse_poll_id(id)?;
    let poll = state.store.fetch_poll(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(poll))
}

#[instrument(skip_all, fields(poll_id = %id, voter_id = %user.id))]
#[post("/polls/<id>/vote", format = "json", data = "<request>")]
pub async fn cast_vote(
    state: &State<AppState>,
    id: &str,
    user: AuthenticatedUser,
    request: Json<VoteRequest>,
) -> Result<Json<Poll>, ApiError> {
    let poll_id = parse_poll_id(id)?;

    let updated = state.store.record_vote(poll_id, request.option_index, user.id).await?;

    debug!("Recorded vote on option {}", request.option_index);
    Ok(Json(updated))
}
