use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::attempt_dto::SaveAnswerRequest;
use crate::middleware::auth::Claims;
use crate::AppState;

#[axum::debug_handler]
pub async fn create_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let student_id = claims.user_id()?;
    let attempt = state
        .attempt_service
        .create_attempt(test_id, student_id)
        .await?;
    Ok((StatusCode::CREATED, Json(attempt)).into_response())
}

#[axum::debug_handler]
pub async fn get_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((test_id, attempt_id)): Path<(Uuid, Uuid)>,
) -> crate::error::Result<Response> {
    let caller = claims.user_id()?;
    let attempt = state
        .attempt_service
        .get_attempt(test_id, attempt_id, caller)
        .await?;
    Ok(Json(attempt).into_response())
}

#[axum::debug_handler]
pub async fn save_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((test_id, attempt_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<SaveAnswerRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let caller = claims.user_id()?;
    let answer = state
        .attempt_service
        .save_answer(test_id, attempt_id, caller, req)
        .await?;
    Ok((StatusCode::CREATED, Json(answer)).into_response())
}

#[axum::debug_handler]
pub async fn submit_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((test_id, attempt_id)): Path<(Uuid, Uuid)>,
) -> crate::error::Result<Response> {
    let caller = claims.user_id()?;
    tracing::info!("Submitting attempt {} for test {}", attempt_id, test_id);
    let summary = state
        .attempt_service
        .submit(test_id, attempt_id, caller)
        .await?;
    Ok(Json(summary).into_response())
}

#[axum::debug_handler]
pub async fn get_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((test_id, attempt_id)): Path<(Uuid, Uuid)>,
) -> crate::error::Result<Response> {
    let caller = claims.user_id()?;
    let summary = state
        .attempt_service
        .get_results(test_id, attempt_id, caller)
        .await?;
    Ok(Json(summary).into_response())
}

#[axum::debug_handler]
pub async fn get_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((test_id, attempt_id)): Path<(Uuid, Uuid)>,
) -> crate::error::Result<Response> {
    let caller = claims.user_id()?;
    let status = state
        .attempt_service
        .get_status(test_id, attempt_id, caller)
        .await?;
    Ok(Json(status).into_response())
}
