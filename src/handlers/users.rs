//! /api/users - role and active-status administration (admin/manager).

use axum::{extract::Path, Extension};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{Role, UserView};
use crate::database::repositories::users;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, ValidJson};
use crate::policy;

const MANAGE_USERS: &[Role] = &[Role::Admin, Role::Manager];

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

/// GET /api/users - All accounts, newest first, passwords omitted.
pub async fn list(Extension(current): Extension<CurrentUser>) -> ApiResult<Vec<UserView>> {
    policy::require_role(current.role, MANAGE_USERS)?;

    let users = users::list_all().await?;
    let views: Vec<UserView> = users.iter().map(UserView::from).collect();
    let count = views.len();
    Ok(ApiResponse::list(views, count))
}

/// PUT /api/users/:id/role - Change an account's role.
///
/// Managers may neither hand out the admin role nor touch admin
/// accounts. Demoting yourself is refused when no other active admin
/// would remain.
pub async fn update_role(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<RoleRequest>,
) -> ApiResult<UserView> {
    policy::require_role(current.role, MANAGE_USERS)?;

    let target = users::find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if current.role == Role::Manager {
        if req.role == Role::Admin {
            return Err(ApiError::forbidden("Managers cannot assign admin role"));
        }
        if target.role == Role::Admin {
            return Err(ApiError::forbidden("Managers cannot modify admins"));
        }
    }

    if current.id == target.id && target.role == Role::Admin && req.role != Role::Admin {
        let remaining = users::count_active_admins_excluding(target.id).await?;
        if remaining == 0 {
            return Err(ApiError::bad_request("Cannot demote the last active admin"));
        }
    }

    let updated = users::set_role(id, req.role).await?;
    Ok(ApiResponse::success(UserView::from(&updated)))
}

/// PUT /api/users/:id/toggle-status - Flip an account active/inactive.
pub async fn toggle_status(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<UserView> {
    policy::require_role(current.role, MANAGE_USERS)?;

    let target = users::find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if current.role == Role::Manager && target.role == Role::Admin {
        return Err(ApiError::forbidden(
            "Managers cannot change admin active status",
        ));
    }

    if current.id == target.id && target.is_active && target.role == Role::Admin {
        let remaining = users::count_active_admins_excluding(target.id).await?;
        if remaining == 0 {
            return Err(ApiError::bad_request(
                "Cannot deactivate the last active admin",
            ));
        }
    }

    let updated = users::toggle_active(id).await?;
    Ok(ApiResponse::success(UserView::from(&updated)))
}
