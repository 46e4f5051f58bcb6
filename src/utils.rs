use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::models::user::Identity;

/// Seconds past `exp` a token is still accepted.
pub const JWT_LEEWAY_SECS: u64 = 60;

/// Claims carried by the identity provider's bearer token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // User ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: usize,
    pub jti: String, // token ID, used for sign-out
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.sub.clone(),
            email: self.email.clone(),
        }
    }
}

/// Mints a token the way the identity provider does.
#[cfg(test)]
pub fn generate_jwt(
    user_id: &str,
    email: Option<&str>,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    let expiration = chrono::Utc::now() + chrono::Duration::hours(24);
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.map(str::to_string),
        exp: expiration.timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))
}

pub fn validate_jwt(token: &str, secret: &str) -> Option<Claims> {
    let mut validation = Validation::default();
    validation.leeway = JWT_LEEWAY_SECS;
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_ref()), &validation)
        .map(|data| data.claims)
        .ok()
}
