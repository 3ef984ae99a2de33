//! /api/employees - employee records and department stats.

use axum::{extract::Path, Extension};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::database::models::employee::Department;
use crate::database::models::{Address, EmergencyContact, EmployeeView, Role};
use crate::database::repositories::employees::{EmployeeChanges, EmployeeStats, NewEmployee};
use crate::database::repositories::users::NewUser;
use crate::database::repositories::{employees, users};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, ValidJson};
use crate::policy::{self, Resource};

const MANAGE_EMPLOYEES: &[Role] = &[Role::Admin, Role::Manager];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    /// Inline account to create alongside the record...
    #[serde(default)]
    pub user: Option<InlineUser>,
    /// ...or an existing account to link.
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub employee_id: String,
    pub department: Department,
    pub designation: String,
    pub date_of_joining: DateTime<Utc>,
    pub salary: f64,
    pub phone_number: String,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub emergency_contact: Option<EmergencyContact>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub manager: Option<Uuid>,
}

/// GET /api/employees - All records, user and manager expanded.
pub async fn list(Extension(_current): Extension<CurrentUser>) -> ApiResult<Vec<EmployeeView>> {
    let rows = employees::list_all().await?;
    let views = employees::into_views(rows).await?;
    let count = views.len();
    Ok(ApiResponse::list(views, count))
}

/// GET /api/employees/:id
pub async fn get(
    Extension(_current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<EmployeeView> {
    let employee = employees::find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;
    Ok(ApiResponse::success(employees::into_view(employee).await?))
}

/// POST /api/employees - Create a record, with an inline user account or
/// a link to an existing one.
pub async fn create(
    Extension(current): Extension<CurrentUser>,
    ValidJson(req): ValidJson<CreateEmployeeRequest>,
) -> ApiResult<EmployeeView> {
    policy::require_role(current.role, MANAGE_EMPLOYEES)?;

    if employees::find_by_employee_code(&req.employee_id)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("Employee ID already exists"));
    }

    let new_employee = NewEmployee {
        user_id: Uuid::nil(), // set below
        employee_id: req.employee_id,
        department: req.department,
        designation: req.designation,
        date_of_joining: req.date_of_joining,
        salary: req.salary,
        phone_number: req.phone_number,
        address: req.address,
        emergency_contact: req.emergency_contact,
        skills: req.skills.unwrap_or_default(),
        manager_id: req.manager,
    };

    let employee = match (req.user, req.user_id) {
        (Some(inline), _) => {
            let email = inline.email.trim().to_lowercase();
            if email.is_empty() {
                return Err(ApiError::validation_error("Email is required"));
            }
            if users::find_by_email(&email).await?.is_some() {
                return Err(ApiError::bad_request("Email already registered"));
            }
            let new_user = NewUser {
                name: inline.name.trim().to_string(),
                email,
                password: hash_password(&inline.password)?,
                role: inline.role.unwrap_or(Role::Employee),
            };
            let (_user, employee) = employees::insert_with_user(new_user, new_employee).await?;
            employee
        }
        (None, Some(user_id)) => {
            users::find_by_id(user_id)
                .await?
                .ok_or_else(|| ApiError::not_found("User not found"))?;
            employees::insert(NewEmployee {
                user_id,
                ..new_employee
            })
            .await?
        }
        (None, None) => {
            return Err(ApiError::bad_request(
                "Either user data or userId is required",
            ));
        }
    };

    Ok(ApiResponse::created(employees::into_view(employee).await?))
}

/// PUT /api/employees/:id - Role-gated field filtering: admin/manager
/// may change anything, an employee only phoneNumber/address on their
/// own record.
pub async fn update(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<Value>,
) -> ApiResult<EmployeeView> {
    let employee = employees::find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    let Value::Object(fields) = payload else {
        return Err(ApiError::validation_error("Expected a JSON object"));
    };

    if current.role == Role::Employee && employee.user_id != current.id {
        return Err(policy::not_owner(Resource::Employee));
    }
    policy::screen_update(Resource::Employee, current.role, &fields)?;

    let changes: EmployeeChanges = serde_json::from_value(Value::Object(fields))
        .map_err(|e| ApiError::validation_error(e.to_string()))?;

    if let Some(code) = &changes.employee_id {
        if let Some(existing) = employees::find_by_employee_code(code).await? {
            if existing.id != id {
                return Err(ApiError::bad_request("Employee ID already exists"));
            }
        }
    }

    let updated = employees::update(id, changes).await?;
    Ok(ApiResponse::success(employees::into_view(updated).await?))
}

/// DELETE /api/employees/:id - Admin only; removes the linked user too.
pub async fn delete(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    policy::require_role(current.role, &[Role::Admin])?;

    let employee = employees::find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    employees::delete_with_user(&employee).await?;
    Ok(ApiResponse::message("Employee and associated user removed"))
}

/// GET /api/employees/stats/overview
pub async fn stats(Extension(_current): Extension<CurrentUser>) -> ApiResult<EmployeeStats> {
    Ok(ApiResponse::success(employees::stats().await?))
}
