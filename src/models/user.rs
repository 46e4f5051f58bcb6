use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::quiz::ANONYMOUS_AUTHOR;

/// The signed-in user, as vouched for by the identity provider's token.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, ToSchema)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
}

impl Identity {
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or(ANONYMOUS_AUTHOR)
    }
}

/// Which top-level view the client should render.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GateView {
    Dashboard,
    SignIn,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct SessionResponse {
    pub view: GateView,
    pub user: Option<Identity>,
}
