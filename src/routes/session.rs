use axum::{extract::State, http::StatusCode, middleware, Extension, Json, Router};
use std::sync::Arc;

use crate::{
    middleware::auth::{auth_middleware, identity_middleware, CurrentUser},
    models::user::SessionResponse,
    services::session_service::SessionService,
    utils::Claims,
};

#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Which view to show: dashboard when signed in, sign-in otherwise", body = SessionResponse)
    )
)]
pub async fn get_session(Extension(current): Extension<CurrentUser>) -> Json<SessionResponse> {
    Json(SessionService::gate(current.identity()))
}

#[utoipa::path(
    post,
    path = "/session/sign_out",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn sign_out(
    State(sessions): State<Arc<SessionService>>,
    Extension(claims): Extension<Arc<Claims>>,
) -> StatusCode {
    sessions.sign_out(&claims);
    StatusCode::NO_CONTENT
}

pub fn session_routes(sessions: Arc<SessionService>) -> Router {
    let gate = Router::new()
        .route("/session", axum::routing::get(get_session))
        .route_layer(middleware::from_fn_with_state(sessions.clone(), identity_middleware));

    let signed_in = Router::new()
        .route("/session/sign_out", axum::routing::post(sign_out))
        .route_layer(middleware::from_fn_with_state(sessions.clone(), auth_middleware))
        .with_state(sessions);

    gate.merge(signed_in)
}
