use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// Display hint refreshed by the async checker; never authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "project_status", rename_all = "lowercase")]
pub enum ProjectStatus {
    Up,
    Down,
    Unknown,
    Checking,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub link: String,
    pub image_url: Option<String>,
    pub status: ProjectStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub last_checked: OffsetDateTime,
    pub position: i32,
    pub owner_id: Option<i64>,
}

const COLUMNS: &str =
    "id, title, description, link, image_url, status, last_checked, position, owner_id";

impl Project {
    /// Admin ordering: `position`, ties broken by id.
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Project>> {
        let rows = sqlx::query_as::<_, Project>(&format!(
            "SELECT {COLUMNS} FROM projects ORDER BY position, id"
        ))
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<Project>> {
        let row = sqlx::query_as::<_, Project>(&format!(
            "SELECT {COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn create(
        db: &PgPool,
        title: &str,
        description: Option<&str>,
        link: &str,
        position: Option<i32>,
        owner_id: i64,
    ) -> anyhow::Result<Project> {
        let position = match position {
            Some(p) => p,
            // Append after the current maximum.
            None => {
                sqlx::query_scalar::<_, Option<i32>>("SELECT MAX(position) FROM projects")
                    .fetch_one(db)
                    .await?
                    .map_or(0, |max| max + 1)
            }
        };
        let row = sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects (title, description, link, position, owner_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        ))
        .bind(title)
        .bind(description)
        .bind(link)
        .bind(position)
        .bind(owner_id)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        title: &str,
        description: Option<&str>,
        link: &str,
        image_url: Option<&str>,
        position: i32,
    ) -> anyhow::Result<Option<Project>> {
        let row = sqlx::query_as::<_, Project>(&format!(
            "UPDATE projects
             SET title = $2, description = $3, link = $4, image_url = $5, position = $6
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(link)
        .bind(image_url)
        .bind(position)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_status(
        db: &PgPool,
        id: i64,
        status: ProjectStatus,
        touch_checked: bool,
    ) -> anyhow::Result<Option<Project>> {
        let sql = if touch_checked {
            format!(
                "UPDATE projects SET status = $2, last_checked = now()
                 WHERE id = $1 RETURNING {COLUMNS}"
            )
        } else {
            format!("UPDATE projects SET status = $2 WHERE id = $1 RETURNING {COLUMNS}")
        };
        let row = sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    pub async fn set_image_url(db: &PgPool, id: i64, url: &str) -> anyhow::Result<Option<Project>> {
        let row = sqlx::query_as::<_, Project>(&format!(
            "UPDATE projects SET image_url = $2 WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(url)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Rewrites all positions to `0..n-1` following `ordered_ids`, in one
    /// transaction so a partial swap can never be observed.
    pub async fn reorder(db: &PgPool, ordered_ids: &[i64]) -> anyhow::Result<Vec<Project>> {
        let mut tx = db.begin().await?;
        for (index, id) in ordered_ids.iter().enumerate() {
            sqlx::query("UPDATE projects SET position = $2 WHERE id = $1")
                .bind(id)
                .bind(index as i32)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Self::list(db).await
    }

    pub async fn ids_in_order(db: &PgPool) -> anyhow::Result<Vec<i64>> {
        let ids =
            sqlx::query_scalar::<_, i64>("SELECT id FROM projects ORDER BY position, id")
                .fetch_all(db)
                .await?;
        Ok(ids)
    }
}
