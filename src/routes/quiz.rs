use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware, Extension, Json, Router,
};
use bson::oid::ObjectId;
use std::sync::Arc;

use crate::{
    error::AppError,
    middleware::auth::{identity_middleware, CurrentUser},
    models::{
        attempt::AttemptView,
        quiz::{CreateQuizResponse, NewQuiz, QuizSummary},
    },
    services::{
        attempt_service::AttemptService, authoring::QuizDraft, quiz_repository::QuizRepository,
        session_service::SessionService,
    },
};

#[utoipa::path(
    get,
    path = "/quizzes",
    responses(
        (status = 200, description = "Quizzes, newest first", body = [QuizSummary]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_quizzes(
    State((repository, _attempts)): State<(QuizRepository, AttemptService)>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<QuizSummary>>, AppError> {
    current.require()?;
    let quizzes = repository.list_quizzes().await;
    Ok(Json(quizzes.into_iter().map(QuizSummary::from).collect()))
}

#[utoipa::path(
    post,
    path = "/quizzes",
    request_body = QuizDraft,
    responses(
        (status = 201, description = "Quiz accepted", body = CreateQuizResponse),
        (status = 400, description = "Title missing or no usable questions"),
        (status = 401, description = "Authorization header sent but not valid")
    )
)]
pub async fn create_quiz(
    State((repository, _attempts)): State<(QuizRepository, AttemptService)>,
    Extension(current): Extension<CurrentUser>,
    Json(draft): Json<QuizDraft>,
) -> Result<(StatusCode, Json<CreateQuizResponse>), AppError> {
    let identity = current.optional()?;
    let new_quiz = draft.submit(identity.as_ref())?;
    Ok((StatusCode::CREATED, Json(save_quiz(&repository, new_quiz).await)))
}

/// Writes a validated quiz. A failed write still reads as success to the author.
pub(crate) async fn save_quiz(repository: &QuizRepository, new_quiz: NewQuiz) -> CreateQuizResponse {
    let questions = new_quiz.questions.clone();
    let (saved, quiz) = match repository.create_quiz(new_quiz.clone()).await {
        Some(created) => (true, QuizSummary::from(created)),
        None => (false, QuizSummary::from(new_quiz.into_definition(None, bson::DateTime::now()))),
    };

    CreateQuizResponse {
        message: "Quiz created successfully".to_string(),
        saved,
        quiz,
        questions,
    }
}

#[utoipa::path(
    post,
    path = "/quizzes/{id}/attempts",
    params(
        ("id" = String, Path, description = "Quiz ID")
    ),
    responses(
        (status = 201, description = "Attempt started", body = AttemptView),
        (status = 400, description = "Invalid quiz ID"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Quiz not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn start_attempt(
    State((repository, attempts)): State<(QuizRepository, AttemptService)>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<AttemptView>), AppError> {
    let identity = current.require()?;
    let quiz_id = ObjectId::parse_str(&id)
        .map_err(|_| AppError::BadRequest("Invalid quiz ID".to_string()))?;
    let quiz = repository.get_quiz(quiz_id).await.ok_or(AppError::QuizNotFound)?;
    let view = attempts.start(quiz, identity)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub fn quiz_routes(
    repository: QuizRepository,
    attempts: AttemptService,
    sessions: Arc<SessionService>,
) -> Router {
    // authoring works signed out too, so identity is resolved per handler
    Router::new()
        .route(
            "/quizzes",
            axum::routing::get(list_quizzes).post(create_quiz),
        )
        .route("/quizzes/{id}/attempts", axum::routing::post(start_attempt))
        .route_layer(middleware::from_fn_with_state(sessions, identity_middleware))
        .with_state((repository, attempts))
}
