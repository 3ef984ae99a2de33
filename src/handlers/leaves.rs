//! /api/leaves - leave requests, approval workflow and stats.

use axum::{
    extract::{Path, Query},
    Extension,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::{Employee, Leave, LeaveStatus, LeaveView, Role};
use crate::database::repositories::leaves::{LeaveChanges, LeaveFilters, LeaveStats, NewLeave};
use crate::database::repositories::{employees, leaves};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, ValidJson};
use crate::policy::{self, Resource};

const PROCESS_LEAVES: &[Role] = &[Role::Admin, Role::Manager];

#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// GET /api/leaves - filterable by status and employee.
pub async fn list(
    Extension(_current): Extension<CurrentUser>,
    Query(filters): Query<LeaveFilters>,
) -> ApiResult<Vec<LeaveView>> {
    let rows = leaves::list(filters).await?;
    let views = leaves::into_views(rows).await?;
    let count = views.len();
    Ok(ApiResponse::list(views, count))
}

/// GET /api/leaves/:id
pub async fn get(
    Extension(_current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<LeaveView> {
    let leave = leaves::find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Leave request not found"))?;
    Ok(ApiResponse::success(leaves::into_view(leave).await?))
}

/// POST /api/leaves - Any authenticated user may file a request.
pub async fn create(
    Extension(_current): Extension<CurrentUser>,
    ValidJson(req): ValidJson<NewLeave>,
) -> ApiResult<LeaveView> {
    employees::find_by_id(req.employee)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    if req.reason.trim().is_empty() {
        return Err(ApiError::validation_error("Please provide reason for leave"));
    }

    let leave = leaves::insert(req).await?;
    Ok(ApiResponse::created(leaves::into_view(leave).await?))
}

/// Ownership + pending gates for employee-role mutations of a leave.
async fn check_employee_access(
    current: &CurrentUser,
    leave: &Leave,
    processed_message: &str,
) -> Result<(), ApiError> {
    let record = employees::find_by_user(current.id)
        .await?
        .ok_or_else(policy::no_employee_record)?;

    if leave.employee_id != record.id {
        return Err(policy::not_owner(Resource::Leave));
    }
    if leave.status != LeaveStatus::Pending {
        return Err(ApiError::forbidden(processed_message));
    }
    Ok(())
}

/// PUT /api/leaves/:id - An employee may amend only their own pending
/// request, and only its type, dates and reason.
pub async fn update(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<Value>,
) -> ApiResult<LeaveView> {
    let leave = leaves::find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Leave request not found"))?;

    let Value::Object(fields) = payload else {
        return Err(ApiError::validation_error("Expected a JSON object"));
    };

    if current.role == Role::Employee {
        check_employee_access(
            &current,
            &leave,
            "You cannot update a leave request that has already been processed",
        )
        .await?;
    }
    policy::screen_update(Resource::Leave, current.role, &fields)?;

    let changes: LeaveChanges = serde_json::from_value(Value::Object(fields))
        .map_err(|e| ApiError::validation_error(e.to_string()))?;

    let updated = leaves::update(&leave, changes).await?;
    Ok(ApiResponse::success(leaves::into_view(updated).await?))
}

/// Resolve the approver's employee record for approve/reject.
async fn approver_record(current: &CurrentUser) -> Result<Employee, ApiError> {
    employees::find_by_user(current.id)
        .await?
        .ok_or_else(policy::no_employee_record)
}

/// PUT /api/leaves/:id/approve - Atomic pending -> approved transition.
pub async fn approve(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<LeaveView> {
    policy::require_role(current.role, PROCESS_LEAVES)?;

    let leave = leaves::find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Leave request not found"))?;
    if leave.status != LeaveStatus::Pending {
        return Err(ApiError::conflict("Leave request already processed"));
    }

    let approver = approver_record(&current).await?;

    // The write re-checks the pending precondition; a concurrent
    // approval landing first turns this into a conflict.
    let approved = leaves::approve(id, approver.id)
        .await?
        .ok_or_else(|| ApiError::conflict("Leave request already processed"))?;

    Ok(ApiResponse::success(leaves::into_view(approved).await?))
}

/// PUT /api/leaves/:id/reject - Atomic pending -> rejected transition.
pub async fn reject(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<RejectRequest>,
) -> ApiResult<LeaveView> {
    policy::require_role(current.role, PROCESS_LEAVES)?;

    let leave = leaves::find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Leave request not found"))?;
    if leave.status != LeaveStatus::Pending {
        return Err(ApiError::conflict("Leave request already processed"));
    }

    let approver = approver_record(&current).await?;
    let reason = req.reason.unwrap_or_else(|| "Not specified".to_string());

    let rejected = leaves::reject(id, approver.id, reason)
        .await?
        .ok_or_else(|| ApiError::conflict("Leave request already processed"))?;

    Ok(ApiResponse::success(leaves::into_view(rejected).await?))
}

/// DELETE /api/leaves/:id - Employees may withdraw only their own
/// pending requests; admin/manager may delete any.
pub async fn delete(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let leave = leaves::find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Leave request not found"))?;

    if current.role == Role::Employee {
        check_employee_access(
            &current,
            &leave,
            "You cannot delete a leave request that has already been processed",
        )
        .await?;
    }

    leaves::delete(id).await?;
    Ok(ApiResponse::message("Leave request removed"))
}

/// GET /api/leaves/stats/overview
pub async fn stats(Extension(_current): Extension<CurrentUser>) -> ApiResult<LeaveStats> {
    Ok(ApiResponse::success(leaves::stats().await?))
}
