use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::{error::AppError, models::user::Identity, services::session_service::SessionService, utils::Claims};

/// Who is calling, as resolved by [`identity_middleware`].
#[derive(Clone, Debug)]
pub enum CurrentUser {
    SignedIn(Identity),
    SignedOut,
    /// An `Authorization` header was sent but is malformed, expired or revoked.
    InvalidToken,
}

impl CurrentUser {
    pub fn require(self) -> Result<Identity, AppError> {
        match self {
            CurrentUser::SignedIn(identity) => Ok(identity),
            CurrentUser::SignedOut | CurrentUser::InvalidToken => Err(AppError::Unauthorized),
        }
    }

    /// For routes that work signed out. A bad token is still rejected so the
    /// caller is never silently downgraded to anonymous.
    pub fn optional(self) -> Result<Option<Identity>, AppError> {
        match self {
            CurrentUser::SignedIn(identity) => Ok(Some(identity)),
            CurrentUser::SignedOut => Ok(None),
            CurrentUser::InvalidToken => Err(AppError::Unauthorized),
        }
    }

    /// The identity if there is a valid one, ignoring bad tokens.
    pub fn identity(self) -> Option<Identity> {
        match self {
            CurrentUser::SignedIn(identity) => Some(identity),
            CurrentUser::SignedOut | CurrentUser::InvalidToken => None,
        }
    }
}

fn bearer_claims(req: &Request, sessions: &SessionService) -> Option<Claims> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;
    sessions.resolve(token)
}

/// Rejects the request unless it carries a valid, unrevoked bearer token.
/// On success inserts `Arc<Claims>` and `Identity` into request extensions.
pub async fn auth_middleware(
    State(sessions): State<Arc<SessionService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let claims = bearer_claims(&req, &sessions).ok_or(StatusCode::UNAUTHORIZED)?;
    req.extensions_mut().insert(claims.identity());
    req.extensions_mut().insert(Arc::new(claims));
    Ok(next.run(req).await)
}

/// Never rejects; inserts [`CurrentUser`] for routes that work signed in or out.
pub async fn identity_middleware(
    State(sessions): State<Arc<SessionService>>,
    mut req: Request,
    next: Next,
) -> Response {
    let current = if req.headers().contains_key(AUTHORIZATION) {
        match bearer_claims(&req, &sessions) {
            Some(claims) => CurrentUser::SignedIn(claims.identity()),
            None => CurrentUser::InvalidToken,
        }
    } else {
        CurrentUser::SignedOut
    };
    req.extensions_mut().insert(current);
    next.run(req).await
}
