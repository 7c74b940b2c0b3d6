//! Contains all endpoint-associated functions, grouped by the role required to access them.
//!
//! Login and the endpoints open to every authenticated user are here; the `teacher` and
//! `student` submodules hold the rest.

use axum::{
    Extension, Json,
    body::Body,
    extract::{Path, Query, State},
    http::{Response, StatusCode, header::CONTENT_TYPE},
};

use crate::{
    AppState, OK_JSON, database,
    error::ApiError,
    model::{
        assignment_item::{AssignmentDetail, AssignmentId, AssignmentItem, AssignmentStatus},
        login_object::{LoginObject, Session},
        request::AssignmentFilter,
        user_info::UserInfo,
    },
    security::SessionToken,
};

pub mod student;
pub mod teacher;

pub(crate) fn ok_json() -> Response<Body> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .body(OK_JSON.into())
        .unwrap_or_default()
}

/// Logs a user in with their email and password.
///
/// Returns a session token to be used for subsequent operations. It expires after the
/// configured session lifetime (an hour by default).
pub async fn login(
    State(state): State<AppState>,
    Json(login_req): Json<LoginObject>,
) -> Result<Json<Session>, ApiError> {
    match database::user::login_user(state.store.as_ref(), &login_req, state.session_ttl).await? {
        Some(session) => Ok(Json(session)),
        None => {
            tracing::warn!("Rejected login for {}", login_req.email);
            Err(ApiError::InvalidCredentials)
        }
    }
}

pub async fn current_session(Extension(user): Extension<UserInfo>) -> Json<UserInfo> {
    Json(user)
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Result<StatusCode, ApiError> {
    database::user::logout_user(state.store.as_ref(), &token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Lists every student. Teachers pick group members from this list.
pub async fn list_students(State(state): State<AppState>) -> Result<Json<Vec<UserInfo>>, ApiError> {
    Ok(Json(state.store.list_students().await?))
}

/// Assignments created by the calling teacher, or given to the calling student.
pub async fn list_assignments(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Query(filter): Query<AssignmentFilter>,
) -> Result<Json<Vec<AssignmentItem>>, ApiError> {
    Ok(Json(state.store.list_assignments(&user, filter.status).await?))
}

pub async fn list_open_assignments(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
) -> Result<Json<Vec<AssignmentItem>>, ApiError> {
    let open = state
        .store
        .list_assignments(&user, Some(AssignmentStatus::Open))
        .await?;
    Ok(Json(open))
}

/// An assignment with its group. Answers 404 to users who may not see it, so its
/// existence is not revealed.
pub async fn get_assignment(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Path(assignment_id): Path<AssignmentId>,
) -> Result<Json<AssignmentDetail>, ApiError> {
    match state.store.get_assignment(assignment_id).await? {
        Some(detail) if detail.visible_to(&user) => Ok(Json(detail)),
        _ => Err(ApiError::NotFound("Assignment not found.".into())),
    }
}
