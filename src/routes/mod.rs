use axum::{routing::get, Router};
use std::sync::Arc;

use crate::services::{
    attempt_service::AttemptService, draft_service::DraftService, quiz_repository::QuizRepository,
    results_service::ResultsService, session_service::SessionService,
};

pub mod attempt;
pub mod draft;
pub mod quiz;
pub mod results;
pub mod session;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check OK")
    )
)]
pub async fn health_check() -> &'static str {
    "OK"
}

pub fn init_routes(
    repository: QuizRepository,
    attempts: AttemptService,
    drafts: DraftService,
    sessions: Arc<SessionService>,
) -> Router {
    let results = Arc::new(ResultsService::new(repository.clone()));

    Router::new()
        .route("/health", get(health_check))
        .merge(session::session_routes(sessions.clone()))
        .merge(draft::draft_routes(repository.clone(), drafts, sessions.clone()))
        .merge(quiz::quiz_routes(repository, attempts.clone(), sessions.clone()))
        .merge(attempt::attempt_routes(attempts, sessions.clone()))
        .merge(results::results_routes(results, sessions))
}
