use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ProjectCreate {
    pub title: String,
    pub description: Option<String>,
    pub link: String,
    /// Omitted: append after the current last position.
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub image_url: Option<String>,
    pub position: Option<i32>,
}

/// Full ordered id list; the server rewrites positions transactionally.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ordered_ids: Vec<i64>,
}
