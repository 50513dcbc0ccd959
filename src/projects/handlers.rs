use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::projects::dto::{ProjectCreate, ProjectUpdate, ReorderRequest};
use crate::projects::repo::{Project, ProjectStatus};
use crate::projects::status::update_project_status;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects/", get(list_projects).post(create_project))
        .route("/projects/reorder", put(reorder_projects))
        .route(
            "/projects/:id",
            get(read_project).put(update_project).delete(delete_project),
        )
        .route("/projects/:id/check-status", post(check_status))
}

/// An update re-checks the link when it changed, and also when the record
/// was never successfully probed.
fn needs_recheck(link_changed: bool, status: ProjectStatus) -> bool {
    link_changed || status == ProjectStatus::Unknown
}

fn validate_link(link: &str) -> Result<(), ApiError> {
    if link.starts_with("http://") || link.starts_with("https://") {
        Ok(())
    } else {
        Err(ApiError::bad_request("Project link must be an http(s) URL"))
    }
}

#[instrument(skip(state))]
pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(Project::list(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn read_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Project>, ApiError> {
    let project = Project::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;
    Ok(Json(project))
}

#[instrument(skip(state, admin, payload))]
pub async fn create_project(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<ProjectCreate>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::bad_request("Title is required"));
    }
    validate_link(&payload.link)?;

    let project = Project::create(
        &state.db,
        payload.title.trim(),
        payload.description.as_deref(),
        &payload.link,
        payload.position,
        admin.id,
    )
    .await?;
    info!(project_id = project.id, "project created");

    let task_state = state.clone();
    let project_id = project.id;
    tokio::spawn(async move {
        update_project_status(&task_state, project_id).await;
    });

    Ok((StatusCode::CREATED, Json(project)))
}

#[instrument(skip(state, _admin, payload))]
pub async fn update_project(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<ProjectUpdate>,
) -> Result<Json<Project>, ApiError> {
    let current = Project::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    let title = payload.title.unwrap_or(current.title);
    let description = payload.description.or(current.description);
    let link = payload.link.unwrap_or_else(|| current.link.clone());
    let image_url = payload.image_url.or(current.image_url);
    let position = payload.position.unwrap_or(current.position);

    validate_link(&link)?;
    let link_changed = link != current.link;
    let recheck = needs_recheck(link_changed, current.status);

    let project = Project::update(
        &state.db,
        id,
        &title,
        description.as_deref(),
        &link,
        image_url.as_deref(),
        position,
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Project not found"))?;
    info!(project_id = id, link_changed, "project updated");

    if recheck {
        let task_state = state.clone();
        tokio::spawn(async move {
            update_project_status(&task_state, id).await;
        });
    }

    Ok(Json(project))
}

#[instrument(skip(state, _admin))]
pub async fn delete_project(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !Project::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Project not found"));
    }
    info!(project_id = id, "project deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Marks the record `checking` and refreshes it in the background; the
/// response carries the current (possibly `checking`) record.
#[instrument(skip(state, _admin))]
pub async fn check_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Project>, ApiError> {
    let project = Project::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    let task_state = state.clone();
    tokio::spawn(async move {
        update_project_status(&task_state, id).await;
    });

    Ok(Json(project))
}

/// Replaces the fragile two-call client-side swap: the whole order is
/// rewritten in one transaction, so both halves of a swap land or neither
/// does.
#[instrument(skip(state, _admin, payload))]
pub async fn reorder_projects(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<ReorderRequest>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let mut current = Project::ids_in_order(&state.db).await?;
    let mut requested = payload.ordered_ids.clone();
    current.sort_unstable();
    requested.sort_unstable();
    if current != requested {
        return Err(ApiError::bad_request(
            "ordered_ids must be a permutation of the existing project ids",
        ));
    }

    let projects = Project::reorder(&state.db, &payload.ordered_ids).await?;
    info!(count = projects.len(), "projects reordered");
    Ok(Json(projects))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_changed_link_triggers_a_recheck() {
        assert!(needs_recheck(true, ProjectStatus::Up));
        assert!(needs_recheck(true, ProjectStatus::Down));
    }

    #[test]
    fn an_unprobed_record_is_rechecked_even_without_a_link_change() {
        assert!(needs_recheck(false, ProjectStatus::Unknown));
    }

    #[test]
    fn a_settled_record_with_an_unchanged_link_is_left_alone() {
        assert!(!needs_recheck(false, ProjectStatus::Up));
        assert!(!needs_recheck(false, ProjectStatus::Down));
        assert!(!needs_recheck(false, ProjectStatus::Checking));
    }
}
