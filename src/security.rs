//! Contains the middleware security functions. Each layer checks for a different level of
//! security, as denoted by the function.
//!
//! A layer that lets the request through attaches the caller's [`UserInfo`] and their
//! [`SessionToken`] as request extensions for the handlers.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    database,
    error::ApiError,
    model::user_info::{Role, UserInfo},
};

/// The raw token the caller authenticated with.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Resolves the caller from the raw Authorization header value.
async fn authenticate(state: &AppState, token: Option<&str>) -> Result<UserInfo, ApiError> {
    let Some(token) = token else {
        return Err(ApiError::Unauthorized);
    };

    database::user::get_user_from_session(state.store.as_ref(), token)
        .await?
        .ok_or(ApiError::Unauthorized)
}

async fn handle_auth(
    state: AppState,
    mut request: Request,
    next: Next,
    required: Option<Role>,
) -> Response {
    // Owned before any await; the request body is not Sync.
    let token = request
        .headers()
        .get(&AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned);

    let user = match authenticate(&state, token.as_deref()).await {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };

    if let Some(role) = required {
        if user.role != role {
            return ApiError::Forbidden(format!("Access denied. {role} role required.")).into_response();
        }
    }

    request
        .extensions_mut()
        .insert(SessionToken(token.unwrap_or_default()));
    request.extensions_mut().insert(user);
    next.run(request).await
}

/// Checks to see if the user is authenticated.
pub async fn handle_basic_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    handle_auth(state, request, next, None).await
}

/// Checks that the user is authenticated as a teacher.
pub async fn handle_teacher_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    handle_auth(state, request, next, Some(Role::Teacher)).await
}

/// Checks that the user is authenticated as a student.
pub async fn handle_student_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    handle_auth(state, request, next, Some(Role::Student)).await
}
