use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::User;

/// Extracts the bearer token, verifies it and re-fetches the user from the
/// database. Claims alone are never trusted for user state.
pub struct CurrentUser(pub User);

/// Same as [`CurrentUser`] but additionally requires the admin flag.
pub struct AdminUser(pub User);

async fn authenticate(parts: &mut Parts, state: &AppState) -> Result<User, ApiError> {
    let auth_header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Could not validate credentials"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .ok_or_else(|| ApiError::unauthorized("Could not validate credentials"))?;

    let keys = JwtKeys::from_ref(state);
    let claims = keys.verify(token).map_err(|_| {
        warn!("invalid or expired token");
        ApiError::unauthorized("Could not validate credentials")
    })?;

    let user = User::find_by_id(&state.db, claims.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Could not validate credentials"))?;

    if !user.is_active {
        return Err(ApiError::bad_request("Inactive user"));
    }
    Ok(user)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).await.map(CurrentUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        if !user.is_admin {
            return Err(ApiError::forbidden("Not enough permissions"));
        }
        Ok(AdminUser(user))
    }
}
