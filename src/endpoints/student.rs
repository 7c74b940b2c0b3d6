use axum::{
    Extension, Json,
    body::Body,
    extract::{Path, State},
    http::Response,
};

use crate::{
    AppState,
    database::AnswerOutcome,
    endpoints::ok_json,
    error::ApiError,
    model::{
        assignment_grade::AssignmentGrades, assignment_item::AssignmentId,
        assignment_item::AssignmentStatus, request::AnswerRequest, user_info::UserInfo,
    },
    scoring,
};

/// Sets or replaces the group's answer. Any member may do so while the assignment is open.
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Path(assignment_id): Path<AssignmentId>,
    Json(client_req): Json<AnswerRequest>,
) -> Result<Response<Body>, ApiError> {
    if client_req.answer.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "The answer cannot be empty or contain only spaces.".into(),
        ));
    }

    match state
        .store
        .submit_answer(assignment_id, user.id, &client_req.answer)
        .await?
    {
        AnswerOutcome::Saved => Ok(ok_json()),
        AnswerOutcome::NotFound => Err(ApiError::NotFound("Assignment not found.".into())),
        AnswerOutcome::NotMember => Err(ApiError::Forbidden(
            "You are not part of this assignment's group.".into(),
        )),
        AnswerOutcome::Closed => Err(ApiError::BadRequest(
            "The assignment is closed, the answer can no longer be changed.".into(),
        )),
    }
}

/// The caller's evaluated assignments and their group-size-weighted average.
pub async fn closed_with_average(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
) -> Result<Json<AssignmentGrades>, ApiError> {
    let assignments = state
        .store
        .list_assignments(&user, Some(AssignmentStatus::Closed))
        .await?;
    let history = state
        .store
        .closed_assignments_with_group_size(user.id)
        .await?;

    Ok(Json(AssignmentGrades {
        assignments,
        weighted_average: scoring::weighted_average(&history),
    }))
}
