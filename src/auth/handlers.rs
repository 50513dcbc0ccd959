use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Form, Json, Router,
};
use tracing::{info, instrument, warn};

use crate::auth::dto::{RegisterRequest, TokenForm, TokenResponse};
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::validate::{is_valid_email, MIN_PASSWORD_LEN};
use crate::email::notify_new_user;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::UserOut;
use crate::users::repo::User;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/token", post(login_for_access_token))
        .route("/register", post(register))
}

#[instrument(skip(state, form))]
pub async fn login_for_access_token(
    State(state): State<AppState>,
    Form(form): Form<TokenForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = User::find_by_username(&state.db, &form.username)
        .await?
        .ok_or_else(|| {
            warn!(username = %form.username, "login unknown username");
            ApiError::unauthorized("Incorrect username or password")
        })?;

    if !verify_password(&form.password, &user.hashed_password)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::unauthorized("Incorrect username or password"));
    }

    if !user.is_active {
        return Err(ApiError::bad_request("Inactive user"));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(user.id, &user.username, user.is_admin)?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".into(),
        user_id: user.id,
        username: user.username,
        is_admin: user.is_admin,
    }))
}

/// Creates an account but does not establish a session; the caller logs in
/// separately.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserOut>), ApiError> {
    payload.username = payload.username.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();

    if payload.username.is_empty() {
        return Err(ApiError::bad_request("Username is required."));
    }
    if !is_valid_email(&payload.email) {
        return Err(ApiError::bad_request("Please enter a valid email address."));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(
            "Password must be at least 3 characters long.",
        ));
    }

    if User::find_by_username(&state.db, &payload.username)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("Username already registered"));
    }
    if User::find_by_email(&state.db, &payload.email)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("Email already registered"));
    }

    let hashed = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.username, &payload.email, &hashed).await?;
    info!(user_id = user.id, username = %user.username, "user registered");

    // Best effort; never fails the request.
    let mailer = state.mailer.clone();
    let admin_to = state.config.email.to_admin.clone();
    let (username, email) = (user.username.clone(), user.email.clone());
    tokio::spawn(async move {
        notify_new_user(mailer.as_ref(), &admin_to, &username, &email).await;
    });

    Ok((StatusCode::CREATED, Json(UserOut::from(user))))
}
