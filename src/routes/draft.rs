use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware, Extension, Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::{identity_middleware, CurrentUser},
    models::quiz::CreateQuizResponse,
    routes::quiz::save_quiz,
    services::{
        draft_service::{DraftDetails, DraftService, DraftView, QuestionEdit},
        quiz_repository::QuizRepository,
        session_service::SessionService,
    },
};

type DraftState = (QuizRepository, DraftService);

fn draft_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::BadRequest("Invalid draft ID".to_string()))
}

#[utoipa::path(
    post,
    path = "/drafts",
    responses(
        (status = 201, description = "Blank draft with one empty question", body = DraftView),
        (status = 401, description = "Authorization header sent but not valid")
    )
)]
pub async fn create_draft(
    State((_repository, drafts)): State<DraftState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<(StatusCode, Json<DraftView>), AppError> {
    let identity = current.optional()?;
    Ok((StatusCode::CREATED, Json(drafts.create(identity.as_ref()))))
}

#[utoipa::path(
    get,
    path = "/drafts/{id}",
    params(("id" = String, Path, description = "Draft ID")),
    responses(
        (status = 200, description = "The draft as edited so far", body = DraftView),
        (status = 404, description = "Draft not found")
    )
)]
pub async fn get_draft(
    State((_repository, drafts)): State<DraftState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<DraftView>, AppError> {
    let identity = current.optional()?;
    Ok(Json(drafts.view(draft_id(&id)?, identity.as_ref())?))
}

#[utoipa::path(
    patch,
    path = "/drafts/{id}",
    params(("id" = String, Path, description = "Draft ID")),
    request_body = DraftDetails,
    responses(
        (status = 200, description = "Title and description updated", body = DraftView),
        (status = 404, description = "Draft not found")
    )
)]
pub async fn update_details(
    State((_repository, drafts)): State<DraftState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(details): Json<DraftDetails>,
) -> Result<Json<DraftView>, AppError> {
    let identity = current.optional()?;
    Ok(Json(drafts.set_details(draft_id(&id)?, identity.as_ref(), details)?))
}

#[utoipa::path(
    delete,
    path = "/drafts/{id}",
    params(("id" = String, Path, description = "Draft ID")),
    responses(
        (status = 204, description = "Draft discarded"),
        (status = 404, description = "Draft not found")
    )
)]
pub async fn discard_draft(
    State((_repository, drafts)): State<DraftState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let identity = current.optional()?;
    drafts.discard(draft_id(&id)?, identity.as_ref())?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/drafts/{id}/questions",
    params(("id" = String, Path, description = "Draft ID")),
    responses(
        (status = 200, description = "Blank question appended", body = DraftView),
        (status = 404, description = "Draft not found")
    )
)]
pub async fn add_question(
    State((_repository, drafts)): State<DraftState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<DraftView>, AppError> {
    let identity = current.optional()?;
    Ok(Json(drafts.add_question(draft_id(&id)?, identity.as_ref())?))
}

#[utoipa::path(
    patch,
    path = "/drafts/{id}/questions/{index}",
    params(
        ("id" = String, Path, description = "Draft ID"),
        ("index" = usize, Path, description = "0-based question index")
    ),
    request_body = QuestionEdit,
    responses(
        (status = 200, description = "Question updated", body = DraftView),
        (status = 400, description = "No such question or option"),
        (status = 404, description = "Draft not found")
    )
)]
pub async fn edit_question(
    State((_repository, drafts)): State<DraftState>,
    Extension(current): Extension<CurrentUser>,
    Path((id, index)): Path<(String, usize)>,
    Json(edit): Json<QuestionEdit>,
) -> Result<Json<DraftView>, AppError> {
    let identity = current.optional()?;
    Ok(Json(drafts.edit_question(draft_id(&id)?, identity.as_ref(), index, edit)?))
}

#[utoipa::path(
    delete,
    path = "/drafts/{id}/questions/{index}",
    params(
        ("id" = String, Path, description = "Draft ID"),
        ("index" = usize, Path, description = "0-based question index")
    ),
    responses(
        (status = 200, description = "Question removed", body = DraftView),
        (status = 400, description = "No such question, or it is the last one"),
        (status = 404, description = "Draft not found")
    )
)]
pub async fn remove_question(
    State((_repository, drafts)): State<DraftState>,
    Extension(current): Extension<CurrentUser>,
    Path((id, index)): Path<(String, usize)>,
) -> Result<Json<DraftView>, AppError> {
    let identity = current.optional()?;
    Ok(Json(drafts.remove_question(draft_id(&id)?, identity.as_ref(), index)?))
}

#[utoipa::path(
    post,
    path = "/drafts/{id}/submit",
    params(("id" = String, Path, description = "Draft ID")),
    responses(
        (status = 201, description = "Quiz accepted, draft consumed", body = CreateQuizResponse),
        (status = 400, description = "Title missing or no usable questions; the draft is kept"),
        (status = 404, description = "Draft not found")
    )
)]
pub async fn submit_draft(
    State((repository, drafts)): State<DraftState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<CreateQuizResponse>), AppError> {
    let identity = current.optional()?;
    let new_quiz = drafts.submit(draft_id(&id)?, identity.as_ref())?;
    Ok((StatusCode::CREATED, Json(save_quiz(&repository, new_quiz).await)))
}

pub fn draft_routes(
    repository: QuizRepository,
    drafts: DraftService,
    sessions: Arc<SessionService>,
) -> Router {
    Router::new()
        .route("/drafts", axum::routing::post(create_draft))
        .route(
            "/drafts/{id}",
            axum::routing::get(get_draft).patch(update_details).delete(discard_draft),
        )
        .route("/drafts/{id}/questions", axum::routing::post(add_question))
        .route(
            "/drafts/{id}/questions/{index}",
            axum::routing::patch(edit_question).delete(remove_question),
        )
        .route("/drafts/{id}/submit", axum::routing::post(submit_draft))
        .route_layer(middleware::from_fn_with_state(sessions, identity_middleware))
        .with_state((repository, drafts))
}
