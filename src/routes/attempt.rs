use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware, Extension, Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::auth_middleware,
    models::{
        attempt::{AttemptView, SelectAnswerRequest},
        user::Identity,
    },
    services::{attempt_service::AttemptService, session_service::SessionService},
};

fn attempt_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::BadRequest("Invalid attempt ID".to_string()))
}

#[utoipa::path(
    get,
    path = "/attempts/{id}",
    params(
        ("id" = String, Path, description = "Attempt ID")
    ),
    responses(
        (status = 200, description = "Current question, or the final score once complete", body = AttemptView),
        (status = 404, description = "Attempt not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_attempt(
    State(attempts): State<AttemptService>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<AttemptView>, AppError> {
    let view = attempts.view(attempt_id(&id)?, &identity)?;
    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/attempts/{id}/answer",
    params(
        ("id" = String, Path, description = "Attempt ID")
    ),
    request_body = SelectAnswerRequest,
    responses(
        (status = 200, description = "Answer recorded for the current question", body = AttemptView),
        (status = 400, description = "No such option"),
        (status = 404, description = "Attempt not found"),
        (status = 409, description = "Attempt already complete")
    ),
    security(("bearer_auth" = []))
)]
pub async fn select_answer(
    State(attempts): State<AttemptService>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(req): Json<SelectAnswerRequest>,
) -> Result<Json<AttemptView>, AppError> {
    let view = attempts.select_answer(attempt_id(&id)?, &identity, req.option_index)?;
    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/attempts/{id}/advance",
    params(
        ("id" = String, Path, description = "Attempt ID")
    ),
    responses(
        (status = 200, description = "Next question, or the final score after the last one", body = AttemptView),
        (status = 404, description = "Attempt not found"),
        (status = 409, description = "Current question has no answer yet")
    ),
    security(("bearer_auth" = []))
)]
pub async fn advance(
    State(attempts): State<AttemptService>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<AttemptView>, AppError> {
    let view = attempts.advance(attempt_id(&id)?, &identity).await?;
    Ok(Json(view))
}

#[utoipa::path(
    delete,
    path = "/attempts/{id}",
    params(
        ("id" = String, Path, description = "Attempt ID")
    ),
    responses(
        (status = 204, description = "Attempt discarded, nothing recorded"),
        (status = 404, description = "Attempt not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn abandon(
    State(attempts): State<AttemptService>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    attempts.abandon(attempt_id(&id)?, &identity)?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn attempt_routes(attempts: AttemptService, sessions: Arc<SessionService>) -> Router {
    Router::new()
        .route(
            "/attempts/{id}",
            axum::routing::get(get_attempt).delete(abandon),
        )
        .route("/attempts/{id}/answer", axum::routing::post(select_answer))
        .route("/attempts/{id}/advance", axum::routing::post(advance))
        .route_layer(middleware::from_fn_with_state(sessions, auth_middleware))
        .with_state(attempts)
}
