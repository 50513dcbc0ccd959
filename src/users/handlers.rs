use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use tracing::{info, instrument};

use crate::auth::{AdminUser, CurrentUser};
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::{UserOut, UserUpdate};
use crate::users::repo::User;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(read_me))
        .route("/users/", get(list_users))
        .route("/users/:id", put(update_user))
        .route("/users/:id", delete(delete_user))
}

#[instrument(skip(user))]
pub async fn read_me(CurrentUser(user): CurrentUser) -> Json<UserOut> {
    Json(UserOut::from(user))
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<UserOut>>, ApiError> {
    let users = User::list(&state.db).await?;
    Ok(Json(users.into_iter().map(UserOut::from).collect()))
}

#[instrument(skip(state, admin, update))]
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<UserOut>, ApiError> {
    let target = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let is_admin = update.is_admin.unwrap_or(target.is_admin);
    let is_active = update.is_active.unwrap_or(target.is_active);

    // Admins cannot lock themselves out.
    if admin.id == id && (!is_admin || !is_active) {
        return Err(ApiError::bad_request(
            "Admins cannot demote or deactivate their own account",
        ));
    }

    let user = User::update_flags(&state.db, id, is_admin, is_active)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    info!(user_id = id, is_admin, is_active, "user updated");
    Ok(Json(UserOut::from(user)))
}

#[instrument(skip(state, admin))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if admin.id == id {
        return Err(ApiError::bad_request(
            "Admins cannot delete their own account",
        ));
    }
    if !User::delete(&state.db, id).await? {
        return Err(ApiError::not_found("User not found"));
    }
    info!(user_id = id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
