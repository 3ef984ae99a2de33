use std::collections::HashMap;

use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::{Database, StoreError};
use crate::database::models::{Role, User, UserView};

pub struct NewUser {
    pub name: String,
    /// Already normalized (trimmed, lowercased) by the caller.
    pub email: String,
    /// Argon2 hash, never the raw password.
    pub password: String,
    pub role: Role,
}

/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub async fn find_by_id(id: Uuid) -> Result<Option<User>, StoreError> {
    let pool = Database::pool().await?;
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    Ok(user)
}

pub async fn find_by_email(email: &str) -> Result<Option<User>, StoreError> {
    let pool = Database::pool().await?;
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
        .bind(email)
        .fetch_optional(&pool)
        .await?;
    Ok(user)
}

pub async fn list_all() -> Result<Vec<User>, StoreError> {
    let pool = Database::pool().await?;
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&pool)
        .await?;
    Ok(users)
}

pub async fn insert(new: NewUser) -> Result<User, StoreError> {
    let pool = Database::pool().await?;
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, password, role) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(new.name)
    .bind(new.email)
    .bind(new.password)
    .bind(new.role)
    .fetch_one(&pool)
    .await?;
    Ok(user)
}

/// Apply a partial profile update. Password must already be hashed.
pub async fn update_profile(id: Uuid, changes: ProfileChanges) -> Result<User, StoreError> {
    let pool = Database::pool().await?;
    let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new("UPDATE users SET updated_at = now()");
    if let Some(name) = changes.name {
        qb.push(", name = ").push_bind(name);
    }
    if let Some(email) = changes.email {
        qb.push(", email = ").push_bind(email);
    }
    if let Some(password) = changes.password {
        qb.push(", password = ").push_bind(password);
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" RETURNING *");

    let user = qb.build_query_as::<User>().fetch_one(&pool).await?;
    Ok(user)
}

pub async fn set_role(id: Uuid, role: Role) -> Result<User, StoreError> {
    let pool = Database::pool().await?;
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET role = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(role)
    .fetch_one(&pool)
    .await?;
    Ok(user)
}

/// Flip is_active and return the updated row.
pub async fn toggle_active(id: Uuid) -> Result<User, StoreError> {
    let pool = Database::pool().await?;
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET is_active = NOT is_active, updated_at = now() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_one(&pool)
    .await?;
    Ok(user)
}

/// Active admins remaining if `excluded` were demoted or deactivated.
/// The last-admin guard compares this against zero.
pub async fn count_active_admins_excluding(excluded: Uuid) -> Result<i64, StoreError> {
    let pool = Database::pool().await?;
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM users WHERE role = 'admin' AND is_active AND id <> $1",
    )
    .bind(excluded)
    .fetch_one(&pool)
    .await?;
    Ok(count)
}

/// Batch fetch of user views keyed by id, for expanding references.
pub async fn view_map(ids: &[Uuid]) -> Result<HashMap<Uuid, UserView>, StoreError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let pool = Database::pool().await?;
    let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(&pool)
        .await?;
    Ok(users.iter().map(|u| (u.id, UserView::from(u))).collect())
}
