//! The user a request acts as.
//!
//! There is no authentication: callers name themselves with the
//! `X-User-Id` header. Role checks and ticket scoping work from this.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use helpdesk_core::accounts::{Profile, User, UserType};

use super::error::{ApiError, AppError};
use crate::state::AppState;

pub const ACTOR_HEADER: &str = "x-user-id";

/// Extractor for the acting user. Rejects with 401 when the header is
/// missing, malformed, or names no active user.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user: User,
    pub profile: Option<Profile>,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }

    pub fn user_type(&self) -> UserType {
        self.user.user_type
    }
}

fn unauthorized(message: &str) -> AppError {
    ApiError::Unauthorized(message.to_string()).into()
}

impl FromRequestParts<AppState> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(ACTOR_HEADER)
            .ok_or_else(|| unauthorized("Missing X-User-Id header"))?;

        let user_id: Uuid = header
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .ok_or_else(|| unauthorized("Invalid X-User-Id header"))?;

        let user = state
            .users
            .get_user(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| unauthorized("Unknown user"))?;

        let profile = state.users.get_profile_for_user(user.id).await?;

        tracing::trace!(user_id = %user.id, user_type = %user.user_type.as_str(), "Resolved actor");
        Ok(Actor { user, profile })
    }
}
