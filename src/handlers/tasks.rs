//! /api/tasks - tasks, comments and stats.

use axum::{
    extract::{Path, Query},
    Extension,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::{Comment, Role, TaskView};
use crate::database::repositories::tasks::{NewTask, TaskChanges, TaskFilters, TaskStats};
use crate::database::repositories::{employees, tasks};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, ValidJson};
use crate::policy::{self, Resource};

const MANAGE_TASKS: &[Role] = &[Role::Admin, Role::Manager];

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

/// GET /api/tasks - filterable by project, status and assignedTo.
pub async fn list(
    Extension(_current): Extension<CurrentUser>,
    Query(filters): Query<TaskFilters>,
) -> ApiResult<Vec<TaskView>> {
    let rows = tasks::list(filters).await?;
    let views = tasks::into_views(rows).await?;
    let count = views.len();
    Ok(ApiResponse::list(views, count))
}

/// GET /api/tasks/:id
pub async fn get(
    Extension(_current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<TaskView> {
    let task = tasks::find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    Ok(ApiResponse::success(tasks::into_view(task).await?))
}

/// POST /api/tasks
pub async fn create(
    Extension(current): Extension<CurrentUser>,
    ValidJson(req): ValidJson<NewTask>,
) -> ApiResult<TaskView> {
    policy::require_role(current.role, MANAGE_TASKS)?;

    let task = tasks::insert(req).await?;
    Ok(ApiResponse::created(tasks::into_view(task).await?))
}

/// PUT /api/tasks/:id - Admin/manager may change anything; an employee
/// only status/actualHours on a task assigned to them, and any other
/// submitted field is rejected outright with the offending names.
pub async fn update(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<Value>,
) -> ApiResult<TaskView> {
    let task = tasks::find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    let Value::Object(fields) = payload else {
        return Err(ApiError::validation_error("Expected a JSON object"));
    };

    if current.role == Role::Employee {
        let record = employees::find_by_user(current.id)
            .await?
            .ok_or_else(policy::no_employee_record)?;
        if task.assigned_to != record.id {
            return Err(policy::not_owner(Resource::Task));
        }
    }
    policy::screen_update(Resource::Task, current.role, &fields)?;

    let changes: TaskChanges = serde_json::from_value(Value::Object(fields))
        .map_err(|e| ApiError::validation_error(e.to_string()))?;

    let updated = tasks::update(id, changes).await?;
    Ok(ApiResponse::success(tasks::into_view(updated).await?))
}

/// DELETE /api/tasks/:id
pub async fn delete(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    policy::require_role(current.role, MANAGE_TASKS)?;

    let deleted = tasks::delete(id).await?;
    if deleted == 0 {
        return Err(ApiError::not_found("Task not found"));
    }
    Ok(ApiResponse::message("Task removed"))
}

/// POST /api/tasks/:id/comments - Any authenticated user may comment.
pub async fn add_comment(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<CommentRequest>,
) -> ApiResult<TaskView> {
    if req.text.trim().is_empty() {
        return Err(ApiError::validation_error("Comment text is required"));
    }

    tasks::find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    let task = tasks::add_comment(
        id,
        Comment {
            user: current.id,
            text: req.text,
            created_at: Utc::now(),
        },
    )
    .await?;

    Ok(ApiResponse::success(tasks::into_view(task).await?))
}

/// GET /api/tasks/stats/overview
pub async fn stats(Extension(_current): Extension<CurrentUser>) -> ApiResult<TaskStats> {
    Ok(ApiResponse::success(tasks::stats().await?))
}
