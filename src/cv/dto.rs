use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Admin-side partial update of the site configuration.
#[derive(Debug, Deserialize)]
pub struct SiteConfigUpdate {
    pub header_text: Option<String>,
    pub profile_name: Option<String>,
    pub profile_title: Option<String>,
    pub profile_image: Option<String>,
    pub show_register_callout: Option<bool>,
    pub social_links: Option<Value>,
}

/// Body of `POST /cv/upload-image`. `image_data` is base64, with or without
/// a `data:image/...;base64,` prefix.
#[derive(Debug, Deserialize)]
pub struct ImageUpload {
    pub image_data: String,
    #[serde(default = "default_image_type")]
    pub image_type: String,
    pub project_id: Option<i64>,
}

fn default_image_type() -> String {
    "profile".into()
}

#[derive(Debug, Serialize)]
pub struct ImageUploadResponse {
    pub url: String,
}
