use std::{collections::HashMap, sync::RwLock};

use tracing::info;

use crate::{
    models::user::{GateView, Identity, SessionResponse},
    utils::{validate_jwt, Claims, JWT_LEEWAY_SECS},
};

/// Resolves bearer tokens to identities and remembers tokens that were signed out.
pub struct SessionService {
    jwt_secret: String,
    /// `jti` -> `exp` of signed-out tokens that would otherwise still validate.
    revoked: RwLock<HashMap<String, u64>>,
}

impl SessionService {
    pub fn new(jwt_secret: String) -> Self {
        Self {
            jwt_secret,
            revoked: RwLock::new(HashMap::new()),
        }
    }

    /// Verified, unrevoked claims for `token`, if any.
    pub fn resolve(&self, token: &str) -> Option<Claims> {
        let claims = validate_jwt(token, &self.jwt_secret)?;
        let revoked = self.revoked.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        if revoked.contains_key(&claims.jti) {
            return None;
        }
        Some(claims)
    }

    pub fn sign_out(&self, claims: &Claims) {
        self.revoke(claims, chrono::Utc::now().timestamp().max(0) as u64);
        info!(user_id = %claims.sub, "signed out");
    }

    /// Records the revocation and forgets entries whose tokens no longer
    /// validate anyway.
    pub(crate) fn revoke(&self, claims: &Claims, now: u64) {
        let mut revoked = self.revoked.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        revoked.retain(|_, exp| !expired(*exp, now));
        let exp = claims.exp as u64;
        if !expired(exp, now) {
            revoked.insert(claims.jti.clone(), exp);
        }
    }

    #[cfg(test)]
    pub(crate) fn revoked_count(&self) -> usize {
        self.revoked.read().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    /// Dashboard for a signed-in user, sign-in view otherwise.
    pub fn gate(identity: Option<Identity>) -> SessionResponse {
        match identity {
            Some(user) => SessionResponse {
                view: GateView::Dashboard,
                user: Some(user),
            },
            None => SessionResponse {
                view: GateView::SignIn,
                user: None,
            },
        }
    }
}

fn expired(exp: u64, now: u64) -> bool {
    exp + JWT_LEEWAY_SECS < now
}
