use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::{Role, UserProfile};
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The registered user named by the `x-user-id` header.
pub struct Caller(pub UserProfile);

impl Caller {
    pub fn require(self, role: Role) -> Result<UserProfile, AppError> {
        if self.0.role == role {
            Ok(self.0)
        } else {
            Err(AppError::Forbidden(format!(
                "only {role:?} users may do this"
            )))
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::BadRequest(format!("missing {USER_ID_HEADER} header")))?
            .to_str()
            .map_err(|_| AppError::BadRequest(format!("{USER_ID_HEADER} is not valid text")))?;

        let id = Uuid::parse_str(raw.trim())
            .map_err(|err| AppError::BadRequest(format!("invalid {USER_ID_HEADER}: {err}")))?;

        state
            .store
            .user(&id)
            .map(Caller)
            .ok_or_else(|| AppError::Forbidden(format!("unknown user {id}")))
    }
}
