use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// Inbox message; `sender_username` is joined in for the admin list.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub is_read: bool,
    pub sender_username: Option<String>,
}

const COLUMNS: &str = "m.id, m.sender_id, m.content, m.timestamp, m.is_read, \
                       u.username AS sender_username";

impl Message {
    pub async fn create(db: &PgPool, sender_id: i64, content: &str) -> anyhow::Result<Message> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO messages (sender_id, content) VALUES ($1, $2) RETURNING id",
        )
        .bind(sender_id)
        .bind(content)
        .fetch_one(db)
        .await?;
        let message = Self::get(db, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("message {id} vanished after insert"))?;
        Ok(message)
    }

    pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<Message>> {
        let row = sqlx::query_as::<_, Message>(&format!(
            "SELECT {COLUMNS} FROM messages m
             LEFT JOIN users u ON u.id = m.sender_id
             WHERE m.id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, Message>(&format!(
            "SELECT {COLUMNS} FROM messages m
             LEFT JOIN users u ON u.id = m.sender_id
             ORDER BY m.timestamp DESC
             LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn mark_read(db: &PgPool, id: i64) -> anyhow::Result<Option<Message>> {
        let updated = sqlx::query("UPDATE messages SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        Self::get(db, id).await
    }

    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
