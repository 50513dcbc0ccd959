use std::time::Duration;

use tracing::{error, info, warn};

use crate::projects::repo::{Project, ProjectStatus};
use crate::state::AppState;

/// 2xx and 3xx count as up; anything the server answered with otherwise is
/// down.
pub fn classify(status: reqwest::StatusCode) -> ProjectStatus {
    if status.is_success() || status.is_redirection() {
        ProjectStatus::Up
    } else {
        ProjectStatus::Down
    }
}

pub async fn check_website_status(client: &reqwest::Client, url: &str) -> ProjectStatus {
    match client.get(url).send().await {
        Ok(resp) => {
            let status = classify(resp.status());
            if status == ProjectStatus::Down {
                warn!(url, code = %resp.status(), "status check got an error response");
            }
            status
        }
        Err(e) => {
            warn!(url, error = %e, "status check request failed");
            ProjectStatus::Down
        }
    }
}

/// Marks the project `checking`, probes the link, stores the outcome.
/// Spawned from handlers and from the periodic sweep.
pub async fn update_project_status(state: &AppState, project_id: i64) {
    let marked = match Project::set_status(&state.db, project_id, ProjectStatus::Checking, false)
        .await
    {
        Ok(Some(p)) => p,
        Ok(None) => {
            warn!(project_id, "status check for missing project");
            return;
        }
        Err(e) => {
            error!(project_id, error = %e, "failed to mark project checking");
            return;
        }
    };

    let status = check_website_status(&state.http, &marked.link).await;

    match Project::set_status(&state.db, project_id, status, true).await {
        Ok(Some(_)) => info!(project_id, ?status, "project status updated"),
        Ok(None) => warn!(project_id, "project vanished during status check"),
        Err(e) => error!(project_id, error = %e, "failed to store project status"),
    }
}

/// One pass over every project.
pub async fn sweep_all(state: &AppState) {
    let projects = match Project::list(&state.db).await {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "status sweep could not list projects");
            return;
        }
    };
    info!(count = projects.len(), "starting status sweep");
    for project in projects {
        update_project_status(state, project.id).await;
    }
    info!("status sweep finished");
}

/// Background task re-checking all projects on a fixed interval.
pub fn spawn_sweeper(state: AppState) -> tokio::task::JoinHandle<()> {
    let minutes = state.config.status_check_interval_minutes.max(1);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(minutes * 60));
        // The first tick fires immediately; that doubles as the boot check.
        loop {
            interval.tick().await;
            sweep_all(&state).await;
        }
    })
}
