use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::cv::dto::{ImageUpload, ImageUploadResponse, SiteConfigUpdate};
use crate::cv::norm::{default_document, normalize, NormalizeError};
use crate::cv::repo::{CvRow, SiteConfigRow};
use crate::error::ApiError;
use crate::projects::repo::Project;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cv/", get(read_cv).put(update_cv))
        .route("/cv/site-config", get(read_site_config).put(update_site_config))
        .route("/cv/upload-image", post(upload_image))
}

/// Public. Whatever is stored is normalized on the way out, so the frontend
/// always sees the complete shape.
#[instrument(skip(state))]
pub async fn read_cv(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let doc = match CvRow::get(&state.db).await? {
        Some(row) => normalize(row.data).unwrap_or_else(|_| default_document()),
        None => default_document(),
    };
    Ok(Json(doc))
}

#[instrument(skip(state, admin, body))]
pub async fn update_cv(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let doc = normalize(body).map_err(|e: NormalizeError| ApiError::bad_request(e.to_string()))?;
    let row = CvRow::upsert(&state.db, &doc, admin.id).await?;
    info!(cv_id = row.id, "cv document saved");
    Ok(Json(row.data))
}

#[instrument(skip(state))]
pub async fn read_site_config(
    State(state): State<AppState>,
) -> Result<Json<SiteConfigRow>, ApiError> {
    let config = SiteConfigRow::get(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Site configuration not found"))?;
    Ok(Json(config))
}

#[instrument(skip(state, admin, update))]
pub async fn update_site_config(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(update): Json<SiteConfigUpdate>,
) -> Result<Json<SiteConfigRow>, ApiError> {
    let current = SiteConfigRow::get(&state.db).await?;

    let header_text = update
        .header_text
        .or_else(|| current.as_ref().map(|c| c.header_text.clone()))
        .unwrap_or_default();
    let profile_name = update
        .profile_name
        .or_else(|| current.as_ref().map(|c| c.profile_name.clone()))
        .unwrap_or_default();
    let profile_title = update
        .profile_title
        .or_else(|| current.as_ref().map(|c| c.profile_title.clone()))
        .unwrap_or_default();
    let profile_image = update
        .profile_image
        .or_else(|| current.as_ref().and_then(|c| c.profile_image.clone()));
    let show_register_callout = update
        .show_register_callout
        .or_else(|| current.as_ref().map(|c| c.show_register_callout))
        .unwrap_or(true);
    let social_links = update
        .social_links
        .or_else(|| current.as_ref().and_then(|c| c.social_links.clone()));

    let row = SiteConfigRow::upsert(
        &state.db,
        &header_text,
        &profile_name,
        &profile_title,
        profile_image.as_deref(),
        show_register_callout,
        social_links.as_ref(),
        admin.id,
    )
    .await?;
    info!(config_id = row.id, "site config saved");
    Ok(Json(row))
}

#[instrument(skip(state, _admin, upload))]
pub async fn upload_image(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(upload): Json<ImageUpload>,
) -> Result<Json<ImageUploadResponse>, ApiError> {
    let (bytes, content_type) = decode_image_data(&upload.image_data)
        .ok_or_else(|| ApiError::bad_request("Invalid image data"))?;

    let key = format!(
        "{}-{}.{}",
        upload.image_type,
        Uuid::new_v4(),
        extension_for(&content_type)
    );
    let url = state.images.put(&key, bytes, &content_type).await?;

    if upload.image_type == "project" {
        if let Some(project_id) = upload.project_id {
            if Project::set_image_url(&state.db, project_id, &url)
                .await?
                .is_none()
            {
                return Err(ApiError::not_found("Project not found"));
            }
        }
    }

    info!(key, "image uploaded");
    Ok(Json(ImageUploadResponse { url }))
}

/// Accepts raw base64 or a `data:<mime>;base64,<payload>` URL.
fn decode_image_data(data: &str) -> Option<(Bytes, String)> {
    let (content_type, payload) = match data.strip_prefix("data:") {
        Some(rest) => {
            let (mime, rest) = rest.split_once(';')?;
            let payload = rest.strip_prefix("base64,")?;
            (mime.to_string(), payload)
        }
        None => ("application/octet-stream".to_string(), data),
    };
    let bytes = BASE64.decode(payload.trim()).ok()?;
    Some((Bytes::from(bytes), content_type))
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_data_url() {
        let (bytes, ct) = decode_image_data("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(&bytes[..], b"hello");
        assert_eq!(ct, "image/png");
        assert_eq!(extension_for(&ct), "png");
    }

    #[test]
    fn decodes_raw_base64() {
        let (bytes, ct) = decode_image_data("aGVsbG8=").unwrap();
        assert_eq!(&bytes[..], b"hello");
        assert_eq!(ct, "application/octet-stream");
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_image_data("!!not-base64!!").is_none());
        assert!(decode_image_data("data:image/png;aGVsbG8=").is_none());
    }
}
