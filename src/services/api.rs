//! REST API routes.
//!
//! Thin JSON plumbing over [`ReviewService`]: handlers validate the request
//! shape, call the service, and render either the result or the classified
//! error.

use crate::error::{AppError, StatusClass};
use crate::models::{NewPullRequest, PullRequest, Team, TeamMember, User, UserReviews};
use crate::services::review_service::ReviewService;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

/// Header a caller may set to tighten the deadline of a single request.
pub const DEADLINE_HEADER: &str = "x-request-timeout-ms";

// ── Error handling ───────────────────────────────────────────────────────────

/// Error response for API handlers.
#[derive(Debug)]
pub enum ApiErr {
    /// Failure classified by the service.
    App(AppError),
    /// Malformed request rejected before reaching the service.
    InvalidInput(String),
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        match self {
            ApiErr::App(err) => {
                let status = match err.status_class() {
                    StatusClass::BadRequest => StatusCode::BAD_REQUEST,
                    StatusClass::Conflict => StatusCode::CONFLICT,
                    StatusClass::NotFound => StatusCode::NOT_FOUND,
                    StatusClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, Json(err)).into_response()
            }
            ApiErr::InvalidInput(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": { "code": "INVALID_INPUT", "message": message }
                })),
            )
                .into_response(),
        }
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<JsonRejection> for ApiErr {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiErr {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

fn require(value: &str, field: &str) -> Result<(), ApiErr> {
    if value.trim().is_empty() {
        return Err(ApiErr::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Apply a caller-supplied deadline, which may only shorten the default.
fn scoped(service: &ReviewService, headers: &HeaderMap) -> Result<ReviewService, ApiErr> {
    let Some(raw) = headers.get(DEADLINE_HEADER) else {
        return Ok(service.clone());
    };

    let millis = raw
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .ok_or_else(|| {
            ApiErr::InvalidInput(format!("{} must be a positive integer", DEADLINE_HEADER))
        })?;

    let deadline = Duration::from_millis(millis).min(service.deadline());
    Ok(service.with_deadline(deadline))
}

// ── Request and response bodies ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

#[derive(Debug, Deserialize)]
pub struct TeamQuery {
    pub team_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub user_id: String,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub pull_request_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub pull_request_id: String,
    pub old_user_id: String,
}

#[derive(Serialize)]
struct TeamEnvelope {
    team: Team,
}

#[derive(Serialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Serialize)]
struct PrEnvelope {
    pr: PullRequest,
}

#[derive(Serialize)]
struct ReassignEnvelope {
    pr: PullRequest,
    replaced_by: String,
}

// ── Route builder ────────────────────────────────────────────────────────────

/// Build the API routes.
pub fn api_routes() -> Router<ReviewService> {
    Router::new()
        .route("/health", get(health))
        .route("/team/add", post(create_team))
        .route("/team/get", get(get_team))
        .route("/users/setIsActive", post(set_user_active))
        .route("/users/getReview", get(get_user_reviews))
        .route("/pullRequest/create", post(create_pull_request))
        .route("/pullRequest/merge", post(merge_pull_request))
        .route("/pullRequest/reassign", post(reassign_reviewer))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /health: liveness check.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

/// POST /team/add: create a team with its members.
async fn create_team(
    State(service): State<ReviewService>,
    headers: HeaderMap,
    payload: Result<Json<CreateTeamRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TeamEnvelope>), ApiErr> {
    let Json(req) = payload?;
    require(&req.team_name, "team_name")?;
    for member in &req.members {
        require(&member.user_id, "members[].user_id")?;
    }

    let team = scoped(&service, &headers)?
        .create_team(Team {
            team_name: req.team_name,
            members: req.members,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TeamEnvelope { team })))
}

/// GET /team/get?team_name=X: team with members.
async fn get_team(
    State(service): State<ReviewService>,
    headers: HeaderMap,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> Result<Json<Team>, ApiErr> {
    let Query(params) = query?;
    require(&params.team_name, "team_name")?;

    let team = scoped(&service, &headers)?
        .get_team(&params.team_name)
        .await?;
    Ok(Json(team))
}

/// POST /users/setIsActive: toggle a user's activity flag.
async fn set_user_active(
    State(service): State<ReviewService>,
    headers: HeaderMap,
    payload: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<UserEnvelope>, ApiErr> {
    let Json(req) = payload?;
    require(&req.user_id, "user_id")?;

    let user = scoped(&service, &headers)?
        .set_user_active(&req.user_id, req.is_active)
        .await?;
    Ok(Json(UserEnvelope { user }))
}

/// GET /users/getReview?user_id=X: pull requests the user reviews.
async fn get_user_reviews(
    State(service): State<ReviewService>,
    headers: HeaderMap,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<UserReviews>, ApiErr> {
    let Query(params) = query?;
    require(&params.user_id, "user_id")?;

    let reviews = scoped(&service, &headers)?
        .get_user_reviews(&params.user_id)
        .await?;
    Ok(Json(reviews))
}

/// POST /pullRequest/create: create a pull request and assign reviewers.
async fn create_pull_request(
    State(service): State<ReviewService>,
    headers: HeaderMap,
    payload: Result<Json<NewPullRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PrEnvelope>), ApiErr> {
    let Json(req) = payload?;
    require(&req.pull_request_id, "pull_request_id")?;
    require(&req.author_id, "author_id")?;

    let pr = scoped(&service, &headers)?
        .create_pull_request(&req)
        .await?;
    Ok((StatusCode::CREATED, Json(PrEnvelope { pr })))
}

/// POST /pullRequest/merge: mark a pull request as merged.
async fn merge_pull_request(
    State(service): State<ReviewService>,
    headers: HeaderMap,
    payload: Result<Json<MergeRequest>, JsonRejection>,
) -> Result<Json<PrEnvelope>, ApiErr> {
    let Json(req) = payload?;
    require(&req.pull_request_id, "pull_request_id")?;

    let pr = scoped(&service, &headers)?
        .merge_pull_request(&req.pull_request_id)
        .await?;
    Ok(Json(PrEnvelope { pr }))
}

/// POST /pullRequest/reassign: replace one reviewer.
async fn reassign_reviewer(
    State(service): State<ReviewService>,
    headers: HeaderMap,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> Result<Json<ReassignEnvelope>, ApiErr> {
    let Json(req) = payload?;
    require(&req.pull_request_id, "pull_request_id")?;
    require(&req.old_user_id, "old_user_id")?;

    let outcome = scoped(&service, &headers)?
        .reassign_reviewer(&req.pull_request_id, &req.old_user_id)
        .await?;
    Ok(Json(ReassignEnvelope {
        pr: outcome.pr,
        replaced_by: outcome.replaced_by,
    }))
}
