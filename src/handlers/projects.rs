//! /api/projects - projects, progress derivation and stats.

use axum::{extract::Path, Extension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::project::{auto_progress, clamp_progress};
use crate::database::models::{ProjectView, Role};
use crate::database::repositories::projects::{NewProject, ProjectChanges, ProjectStats};
use crate::database::repositories::{projects, tasks};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, ValidJson};
use crate::policy;

const MANAGE_PROJECTS: &[Role] = &[Role::Admin, Role::Manager];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    #[serde(default)]
    pub use_auto_calculate: Option<bool>,
    #[serde(default)]
    pub progress: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub deleted_tasks: u64,
}

/// GET /api/projects
pub async fn list(Extension(_current): Extension<CurrentUser>) -> ApiResult<Vec<ProjectView>> {
    let rows = projects::list_all().await?;
    let views = projects::into_views(rows).await?;
    let count = views.len();
    Ok(ApiResponse::list(views, count))
}

/// GET /api/projects/:id
pub async fn get(
    Extension(_current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<ProjectView> {
    let project = projects::find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;
    Ok(ApiResponse::success(projects::into_view(project).await?))
}

/// POST /api/projects
pub async fn create(
    Extension(current): Extension<CurrentUser>,
    ValidJson(req): ValidJson<NewProject>,
) -> ApiResult<ProjectView> {
    policy::require_role(current.role, MANAGE_PROJECTS)?;

    let project = projects::insert(req).await?;
    Ok(ApiResponse::created(projects::into_view(project).await?))
}

/// PUT /api/projects/:id
pub async fn update(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidJson(changes): ValidJson<ProjectChanges>,
) -> ApiResult<ProjectView> {
    policy::require_role(current.role, MANAGE_PROJECTS)?;

    projects::find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    let updated = projects::update(id, changes).await?;
    Ok(ApiResponse::success(projects::into_view(updated).await?))
}

/// PUT /api/projects/:id/progress - Recompute progress from the
/// project's tasks, or set it manually (clamped to 0-100).
///
/// The derivation is on demand only; task updates do not keep it in
/// sync continuously.
pub async fn set_progress(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<ProgressRequest>,
) -> ApiResult<ProjectView> {
    policy::require_role(current.role, MANAGE_PROJECTS)?;

    let project = projects::find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    let new_progress = if req.use_auto_calculate.unwrap_or(false) {
        let (total, completed, review) = tasks::status_counts_for_project(id).await?;
        Some(auto_progress(total, completed, review))
    } else {
        req.progress.map(clamp_progress)
    };

    let project = match new_progress {
        Some(progress) => projects::set_progress(id, progress).await?,
        None => project,
    };

    Ok(ApiResponse::success(projects::into_view(project).await?))
}

/// DELETE /api/projects/:id - Cascades to the project's tasks and
/// reports how many were removed.
pub async fn delete(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<DeleteOutcome> {
    policy::require_role(current.role, MANAGE_PROJECTS)?;

    projects::find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    let deleted_tasks = projects::delete_cascade(id).await?;
    Ok(ApiResponse::success(DeleteOutcome { deleted_tasks }).with_message("Project removed"))
}

/// GET /api/projects/stats/overview
pub async fn stats(Extension(_current): Extension<CurrentUser>) -> ApiResult<ProjectStats> {
    Ok(ApiResponse::success(projects::stats().await?))
}
