use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::collaborators::{ActorRole, Caller};
use crate::error::AppError;
use crate::state::AppState;

pub struct Authenticated(pub Caller);

impl Authenticated {
    pub fn require(&self, role: ActorRole) -> Result<Uuid, AppError> {
        if self.0.role == role {
            Ok(self.0.actor_id)
        } else {
            Err(AppError::Forbidden(format!(
                "{:?} callers cannot perform this action",
                self.0.role
            )))
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthenticated)?;

        let caller = state.sessions.resolve(token).await?;
        Ok(Self(caller))
    }
}
