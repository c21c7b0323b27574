//! User account handlers.
//!
//! Creating a user also creates the profile matching its role. Client
//! and technician specific flows live in `profiles`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use helpdesk_core::accounts::{default_profile_for, validate_user};

use super::error::{json_body, not_found, ApiError};
use super::{Actor, AppError};
use crate::models::{CreateUser, MeView, UpdateUser, UserView};
use crate::state::AppState;

/// List users (GET /api/users).
///
/// Admins see every account; anyone else only sees themself.
pub async fn list_users(
    actor: Actor,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserView>>, AppError> {
    let users = if actor.is_admin() {
        state.users.list_users().await?
    } else {
        vec![actor.user]
    };

    Ok(Json(
        users
            .into_iter()
            .map(|user| UserView::new(user, &state.media))
            .collect(),
    ))
}

/// Create a user (POST /api/users).
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    let user = json_body(payload)?.into_user();
    validate_user(&user)?;

    let profile = default_profile_for(&user);
    state.users.create_user(&user, profile.as_ref()).await?;

    tracing::info!(user_id = %user.id, user_type = %user.user_type, "Created user");

    Ok((StatusCode::CREATED, Json(UserView::new(user, &state.media))))
}

/// The acting user with its profile (GET /api/users/me).
pub async fn me(actor: Actor, State(state): State<AppState>) -> Json<MeView> {
    Json(MeView {
        user: UserView::new(actor.user, &state.media),
        profile: actor.profile.map(Into::into),
    })
}

/// Get a user (GET /api/users/{id}).
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserView>, AppError> {
    let user = state
        .users
        .get_user(id)
        .await?
        .ok_or_else(|| not_found("User"))?;

    Ok(Json(UserView::new(user, &state.media)))
}

/// Partially update a user (PUT/PATCH /api/users/{id}).
///
/// Only admins may change roles, superuser or active flags.
pub async fn update_user(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateUser>, JsonRejection>,
) -> Result<Json<UserView>, AppError> {
    let payload = json_body(payload)?;

    if !actor.is_admin() {
        if actor.user.id != id {
            return Err(not_found("User"));
        }
        if payload.user_type.is_some()
            || payload.is_superuser.is_some()
            || payload.is_active.is_some()
        {
            return Err(ApiError::Forbidden(
                "Only admins can change roles or account status".to_string(),
            )
            .into());
        }
    }

    let mut user = state
        .users
        .get_user(id)
        .await?
        .ok_or_else(|| not_found("User"))?;

    payload.apply_to(&mut user);
    validate_user(&user)?;
    state.users.update_user(&user).await?;

    tracing::info!(user_id = %id, "Updated user");

    Ok(Json(UserView::new(user, &state.media)))
}

/// Delete a user and everything it owns (DELETE /api/users/{id}).
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.users.delete_user(id).await?;

    tracing::info!(user_id = %id, "Deleted user");

    Ok(StatusCode::NO_CONTENT)
}
