//! /api/auth - registration, login, current-user and profile updates.

use axum::Extension;
use serde::{Deserialize, Serialize};

use crate::auth::{generate_jwt, hash_password, verify_password, Claims};
use crate::database::models::{EmployeeView, UserView};
use crate::database::repositories::users::ProfileChanges;
use crate::database::repositories::{employees, users};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, ValidJson};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// User summary plus a fresh bearer token.
#[derive(Debug, Serialize)]
pub struct AuthData {
    #[serde(flatten)]
    pub user: UserView,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MeData {
    pub user: UserView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<EmployeeView>,
}

fn normalize_email(email: &str) -> Result<String, ApiError> {
    let normalized = email.trim().to_lowercase();
    if normalized.is_empty() || !normalized.contains('@') {
        return Err(ApiError::validation_error("Valid email is required"));
    }
    Ok(normalized)
}

/// POST /api/auth/register - Self-registration.
///
/// Always creates an employee-role account; privileged roles are only
/// assigned through the user administration endpoints.
pub async fn register(ValidJson(req): ValidJson<RegisterRequest>) -> ApiResult<AuthData> {
    if req.name.trim().is_empty() {
        return Err(ApiError::validation_error("Name is required"));
    }
    if req.password.is_empty() {
        return Err(ApiError::validation_error("Password is required"));
    }
    let email = normalize_email(&req.email)?;

    if users::find_by_email(&email).await?.is_some() {
        return Err(ApiError::bad_request("User already exists"));
    }

    let user = users::insert(users::NewUser {
        name: req.name.trim().to_string(),
        email,
        password: hash_password(&req.password)?,
        role: crate::database::models::Role::Employee,
    })
    .await?;

    let token = generate_jwt(Claims::new(user.id))?;
    Ok(ApiResponse::created(AuthData {
        user: UserView::from(&user),
        token,
    }))
}

/// POST /api/auth/login - Exchange credentials for a token.
pub async fn login(ValidJson(req): ValidJson<LoginRequest>) -> ApiResult<AuthData> {
    let email = normalize_email(&req.email)?;

    // Same response for unknown email and wrong password.
    let user = users::find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(&req.password, &user.password) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    if !user.is_active {
        return Err(ApiError::unauthorized(
            "Account is inactive, please contact admin/manager.",
        ));
    }

    let token = generate_jwt(Claims::new(user.id))?;
    Ok(ApiResponse::success(AuthData {
        user: UserView::from(&user),
        token,
    }))
}

/// GET /api/auth/me - Current user with linked employee record, if any.
pub async fn me(Extension(current): Extension<CurrentUser>) -> ApiResult<MeData> {
    let user = users::find_by_id(current.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let employee = match employees::find_by_user(current.id).await? {
        Some(record) => Some(employees::into_view(record).await?),
        None => None,
    };

    Ok(ApiResponse::success(MeData {
        user: UserView::from(&user),
        employee,
    }))
}

/// PUT /api/auth/profile - Update own name, email or password.
pub async fn update_profile(
    Extension(current): Extension<CurrentUser>,
    ValidJson(mut changes): ValidJson<ProfileChanges>,
) -> ApiResult<AuthData> {
    if let Some(email) = changes.email.take() {
        let normalized = normalize_email(&email)?;
        if normalized != current.email {
            if let Some(existing) = users::find_by_email(&normalized).await? {
                if existing.id != current.id {
                    return Err(ApiError::bad_request("Email already registered"));
                }
            }
        }
        changes.email = Some(normalized);
    }

    if let Some(password) = changes.password.take() {
        if password.is_empty() {
            return Err(ApiError::validation_error("Password cannot be empty"));
        }
        changes.password = Some(hash_password(&password)?);
    }

    let user = users::update_profile(current.id, changes).await?;
    let token = generate_jwt(Claims::new(user.id))?;
    Ok(ApiResponse::success(AuthData {
        user: UserView::from(&user),
        token,
    }))
}
