use std::collections::{HashMap, HashSet};

use axum::{
    Extension, Json,
    body::Body,
    extract::{Path, Query, State},
    http::{Response, StatusCode},
    response::IntoResponse,
};

use crate::{
    AppState,
    database::{Creation, EvaluationOutcome, Store},
    endpoints::ok_json,
    error::{ApiError, StoreError},
    grouping,
    model::{
        assignment_item::AssignmentId,
        request::{CreatedObject, EvaluationRequest, GroupCheckRequest, NewAssignmentRequest, StatsQuery},
        student_stats::StudentStats,
        user_info::{UserId, UserInfo},
        validation_object::GroupCheckResponse,
    },
    scoring,
};

pub const MIN_GROUP_SIZE: usize = 2;
pub const MAX_GROUP_SIZE: usize = 6;

fn names_of(students: &[UserInfo]) -> HashMap<UserId, String> {
    students.iter().map(|s| (s.id, s.name.clone())).collect()
}

async fn student_names(store: &dyn Store) -> Result<HashMap<UserId, String>, StoreError> {
    Ok(names_of(&store.list_students().await?))
}

fn ensure_distinct(student_ids: &[UserId]) -> Result<(), ApiError> {
    let mut seen = HashSet::new();
    if student_ids.iter().all(|id| seen.insert(*id)) {
        Ok(())
    } else {
        Err(ApiError::BadRequest("Each student can be selected only once.".into()))
    }
}

/// Advisory check run while the teacher is still choosing students. Fewer than two
/// students are accepted and always valid.
pub async fn check_group(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Json(client_req): Json<GroupCheckRequest>,
) -> Result<Json<GroupCheckResponse>, ApiError> {
    ensure_distinct(&client_req.student_ids)?;
    if client_req.student_ids.len() > MAX_GROUP_SIZE {
        return Err(ApiError::BadRequest(format!(
            "Select {MIN_GROUP_SIZE}-{MAX_GROUP_SIZE} students."
        )));
    }

    let validation =
        grouping::validate_group(state.store.as_ref(), &client_req.student_ids, user.id).await?;

    let names = if validation.is_valid {
        HashMap::new()
    } else {
        student_names(state.store.as_ref()).await?
    };

    Ok(Json(GroupCheckResponse::new(&validation, &names)))
}

/// Creates an open assignment for a group of students.
///
/// The collaboration limit is checked again inside the creation transaction. A refused
/// group answers 400 with the same body as [`check_group`].
pub async fn create_assignment(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Json(client_req): Json<NewAssignmentRequest>,
) -> Result<Response<Body>, ApiError> {
    let question = client_req.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("Question is required.".into()));
    }

    let student_ids = client_req.student_ids;
    ensure_distinct(&student_ids)?;
    if !(MIN_GROUP_SIZE..=MAX_GROUP_SIZE).contains(&student_ids.len()) {
        return Err(ApiError::BadRequest(format!(
            "Select {MIN_GROUP_SIZE}-{MAX_GROUP_SIZE} students."
        )));
    }

    let students = state.store.list_students().await?;
    if let Some(unknown) = student_ids
        .iter()
        .find(|id| !students.iter().any(|s| s.id == **id))
    {
        return Err(ApiError::BadRequest(format!("Unknown student {unknown}.")));
    }

    match state
        .store
        .create_assignment(question, user.id, &student_ids)
        .await?
    {
        Creation::Created(id) => {
            tracing::info!("Teacher {} created assignment {id}", user.id);
            Ok((StatusCode::CREATED, Json(CreatedObject { id })).into_response())
        }
        Creation::Rejected(validation) => {
            tracing::warn!(
                "Teacher {} tried to group {:?} past the collaboration limit",
                user.id,
                student_ids
            );
            let body = GroupCheckResponse::new(&validation, &names_of(&students));
            Ok((StatusCode::BAD_REQUEST, Json(body)).into_response())
        }
    }
}

/// Scores an answered assignment, which closes it.
pub async fn evaluate_assignment(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Path(assignment_id): Path<AssignmentId>,
    Json(client_req): Json<EvaluationRequest>,
) -> Result<Response<Body>, ApiError> {
    if !scoring::is_valid_score(client_req.score) {
        return Err(ApiError::BadRequest(format!(
            "Score must be between {} and {}.",
            scoring::MIN_SCORE,
            scoring::MAX_SCORE
        )));
    }
    let score = client_req.score as i32;

    match state
        .store
        .evaluate_assignment(assignment_id, user.id, score)
        .await?
    {
        EvaluationOutcome::Evaluated => {
            tracing::info!("Assignment {assignment_id} closed with score {score}");
            Ok(ok_json())
        }
        EvaluationOutcome::NotFound => Err(ApiError::NotFound("Assignment not found.".into())),
        EvaluationOutcome::NotOwner => Err(ApiError::Forbidden(
            "Not authorized to evaluate this assignment.".into(),
        )),
        EvaluationOutcome::NoAnswer => Err(ApiError::BadRequest(
            "Cannot evaluate an assignment without an answer.".into(),
        )),
        EvaluationOutcome::AlreadyClosed => Err(ApiError::BadRequest(
            "The assignment has already been evaluated.".into(),
        )),
    }
}

/// Per-student statistics over the calling teacher's assignments.
pub async fn statistics(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<StudentStats>>, ApiError> {
    let mut stats = state
        .store
        .student_activity(user.id)
        .await?
        .into_iter()
        .map(scoring::student_stats)
        .collect::<Vec<StudentStats>>();

    scoring::sort_stats(&mut stats, query.sort);
    Ok(Json(stats))
}
