use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::{
    attempt_service::AttemptError, authoring::DraftError, draft_service::DraftServiceError,
    player::PlayerError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("sign in required")]
    Unauthorized,
    #[error("quiz not found")]
    QuizNotFound,
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Drafts(#[from] DraftServiceError),
    #[error(transparent)]
    Attempt(#[from] AttemptError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Draft(_) => StatusCode::BAD_REQUEST,
            AppError::Drafts(DraftServiceError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Drafts(DraftServiceError::Draft(_)) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::QuizNotFound | AppError::Attempt(AttemptError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Attempt(AttemptError::Player(PlayerError::InvalidOption { .. })) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Attempt(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
