//! Handlers for the public `/users/signup` and `/users/login` endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::auth::flow::{self, LoginRequest, LoginResponse, SignupRequest, SignupResponse};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/v1/users/signup
///
/// Create a user and its first token pair. Returns 201 with the new id.
pub async fn signup(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let Json(input) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let created = flow::signup(state.store.as_ref(), &state.config.jwt, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/v1/users/login
///
/// Authenticate with email + password. Returns the user with a fresh token pair.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let Json(input) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let response = flow::login(state.store.as_ref(), &state.config.jwt, input).await?;
    Ok(Json(response))
}
