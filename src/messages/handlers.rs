use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::auth::{AdminUser, CurrentUser};
use crate::email::notify_new_message;
use crate::error::ApiError;
use crate::messages::repo::Message;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages/", get(list_messages).post(create_message))
        .route("/messages/:id/read", put(mark_read))
        .route("/messages/:id", delete(delete_message))
}

#[derive(Debug, Deserialize)]
pub struct MessageCreate {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    100
}

impl Pagination {
    /// Postgres rejects negative LIMIT/OFFSET values outright.
    fn clamped(&self) -> (i64, i64) {
        (self.limit.max(0), self.offset.max(0))
    }
}

#[instrument(skip(state, user, payload))]
pub async fn create_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<MessageCreate>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::bad_request("Message content is required"));
    }

    let message = Message::create(&state.db, user.id, payload.content.trim()).await?;
    info!(message_id = message.id, sender_id = user.id, "message received");

    let mailer = state.mailer.clone();
    let admin_to = state.config.email.to_admin.clone();
    let sender = user.username.clone();
    let content = message.content.clone();
    tokio::spawn(async move {
        notify_new_message(mailer.as_ref(), &admin_to, &sender, &content).await;
    });

    Ok((StatusCode::CREATED, Json(message)))
}

#[instrument(skip(state, _admin))]
pub async fn list_messages(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let (limit, offset) = p.clamped();
    Ok(Json(Message::list(&state.db, limit, offset).await?))
}

#[instrument(skip(state, _admin))]
pub async fn mark_read(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Message>, ApiError> {
    let message = Message::mark_read(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Message not found"))?;
    Ok(Json(message))
}

#[instrument(skip(state, _admin))]
pub async fn delete_message(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !Message::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Message not found"));
    }
    info!(message_id = id, "message deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_pagination_is_clamped_to_zero() {
        let p = Pagination {
            limit: -5,
            offset: -1,
        };
        assert_eq!(p.clamped(), (0, 0));
    }

    #[test]
    fn valid_pagination_passes_through() {
        let p = Pagination {
            limit: 25,
            offset: 50,
        };
        assert_eq!(p.clamped(), (25, 50));
    }
}
