use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::cv::norm::default_document;
use crate::users::repo::User;

#[derive(Debug, Clone, FromRow)]
pub struct CvRow {
    pub id: i64,
    pub data: Value,
    pub owner_id: Option<i64>,
}

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct SiteConfigRow {
    pub id: i64,
    pub header_text: String,
    pub profile_name: String,
    pub profile_title: String,
    pub profile_image: Option<String>,
    pub show_register_callout: bool,
    pub social_links: Option<Value>,
    pub owner_id: Option<i64>,
}

impl CvRow {
    /// There is a single CV per site; the first row wins.
    pub async fn get(db: &PgPool) -> anyhow::Result<Option<CvRow>> {
        let row = sqlx::query_as::<_, CvRow>(
            "SELECT id, data, owner_id FROM cv_data ORDER BY id LIMIT 1",
        )
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn upsert(db: &PgPool, data: &Value, owner_id: i64) -> anyhow::Result<CvRow> {
        if let Some(existing) = Self::get(db).await? {
            let row = sqlx::query_as::<_, CvRow>(
                "UPDATE cv_data SET data = $2, owner_id = $3 WHERE id = $1
                 RETURNING id, data, owner_id",
            )
            .bind(existing.id)
            .bind(data)
            .bind(owner_id)
            .fetch_one(db)
            .await?;
            Ok(row)
        } else {
            let row = sqlx::query_as::<_, CvRow>(
                "INSERT INTO cv_data (data, owner_id) VALUES ($1, $2)
                 RETURNING id, data, owner_id",
            )
            .bind(data)
            .bind(owner_id)
            .fetch_one(db)
            .await?;
            Ok(row)
        }
    }

    /// Startup seeding: insert the default document once a user exists.
    pub async fn ensure_default(db: &PgPool) -> anyhow::Result<()> {
        if Self::get(db).await?.is_some() {
            return Ok(());
        }
        let Some(owner) = User::find_default_owner(db).await? else {
            info!("no users yet, skipping CV seed");
            return Ok(());
        };
        sqlx::query("INSERT INTO cv_data (data, owner_id) VALUES ($1, $2)")
            .bind(default_document())
            .bind(owner.id)
            .execute(db)
            .await?;
        info!(owner_id = owner.id, "seeded default CV document");
        Ok(())
    }
}

impl SiteConfigRow {
    const COLUMNS: &'static str = "id, header_text, profile_name, profile_title, profile_image, \
                                   show_register_callout, social_links, owner_id";

    pub async fn get(db: &PgPool) -> anyhow::Result<Option<SiteConfigRow>> {
        let row = sqlx::query_as::<_, SiteConfigRow>(&format!(
            "SELECT {} FROM site_config ORDER BY id LIMIT 1",
            Self::COLUMNS
        ))
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn upsert(
        db: &PgPool,
        header_text: &str,
        profile_name: &str,
        profile_title: &str,
        profile_image: Option<&str>,
        show_register_callout: bool,
        social_links: Option<&Value>,
        owner_id: i64,
    ) -> anyhow::Result<SiteConfigRow> {
        if let Some(existing) = Self::get(db).await? {
            let row = sqlx::query_as::<_, SiteConfigRow>(&format!(
                "UPDATE site_config
                 SET header_text = $2, profile_name = $3, profile_title = $4,
                     profile_image = $5, show_register_callout = $6,
                     social_links = $7, owner_id = $8
                 WHERE id = $1
                 RETURNING {}",
                Self::COLUMNS
            ))
            .bind(existing.id)
            .bind(header_text)
            .bind(profile_name)
            .bind(profile_title)
            .bind(profile_image)
            .bind(show_register_callout)
            .bind(social_links)
            .bind(owner_id)
            .fetch_one(db)
            .await?;
            Ok(row)
        } else {
            let row = sqlx::query_as::<_, SiteConfigRow>(&format!(
                "INSERT INTO site_config
                     (header_text, profile_name, profile_title, profile_image,
                      show_register_callout, social_links, owner_id)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 RETURNING {}",
                Self::COLUMNS
            ))
            .bind(header_text)
            .bind(profile_name)
            .bind(profile_title)
            .bind(profile_image)
            .bind(show_register_callout)
            .bind(social_links)
            .bind(owner_id)
            .fetch_one(db)
            .await?;
            Ok(row)
        }
    }
}
