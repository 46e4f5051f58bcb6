use axum::{extract::State, middleware, Extension, Json, Router};
use std::sync::Arc;

use crate::{
    middleware::auth::auth_middleware,
    models::{result::ResultsResponse, user::Identity},
    services::{results_service::ResultsService, session_service::SessionService},
};

#[utoipa::path(
    get,
    path = "/results",
    responses(
        (status = 200, description = "The caller's past attempts, newest first, with totals", body = ResultsResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_results(
    State(results): State<Arc<ResultsService>>,
    Extension(identity): Extension<Identity>,
) -> Json<ResultsResponse> {
    Json(results.results_for_user(&identity.user_id).await)
}

pub fn results_routes(results: Arc<ResultsService>, sessions: Arc<SessionService>) -> Router {
    Router::new()
        .route("/results", axum::routing::get(get_results))
        .route_layer(middleware::from_fn_with_state(sessions, auth_middleware))
        .with_state(results)
}
