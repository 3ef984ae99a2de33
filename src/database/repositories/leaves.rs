use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::manager::{Database, StoreError};
use crate::database::models::leave::day_span;
use crate::database::models::{Leave, LeaveStatus, LeaveType, LeaveView};

use super::employees;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLeave {
    pub employee: Uuid,
    pub leave_type: LeaveType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub reason: String,
}

/// Partial leave update; `None` leaves the column untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveChanges {
    pub leave_type: Option<LeaveType>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

/// Equality filters for the list endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveFilters {
    pub status: Option<LeaveStatus>,
    pub employee: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveTypeStat {
    pub leave_type: LeaveType,
    pub count: i64,
    pub total_days: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveStats {
    pub total_leaves: i64,
    pub pending_leaves: i64,
    pub approved_leaves: i64,
    pub rejected_leaves: i64,
    pub leave_type_stats: Vec<LeaveTypeStat>,
}

pub async fn list(filters: LeaveFilters) -> Result<Vec<Leave>, StoreError> {
    let pool = Database::pool().await?;
    let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new("SELECT * FROM leaves WHERE TRUE");
    if let Some(status) = filters.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(employee) = filters.employee {
        qb.push(" AND employee_id = ").push_bind(employee);
    }
    qb.push(" ORDER BY created_at DESC");

    let rows = qb.build_query_as::<Leave>().fetch_all(&pool).await?;
    Ok(rows)
}

pub async fn find_by_id(id: Uuid) -> Result<Option<Leave>, StoreError> {
    let pool = Database::pool().await?;
    let row = sqlx::query_as::<_, Leave>("SELECT * FROM leaves WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    Ok(row)
}

pub async fn insert(new: NewLeave) -> Result<Leave, StoreError> {
    let pool = Database::pool().await?;
    let number_of_days = day_span(new.start_date, new.end_date);
    let row = sqlx::query_as::<_, Leave>(
        "INSERT INTO leaves \
         (employee_id, leave_type, start_date, end_date, reason, number_of_days) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(new.employee)
    .bind(new.leave_type)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(new.reason)
    .bind(number_of_days)
    .fetch_one(&pool)
    .await?;
    Ok(row)
}

/// Apply a partial update, recomputing the day count whenever either
/// date moves. `current` is the row the handler already fetched for its
/// authorization checks.
pub async fn update(current: &Leave, changes: LeaveChanges) -> Result<Leave, StoreError> {
    let pool = Database::pool().await?;

    let start = changes.start_date.unwrap_or(current.start_date);
    let end = changes.end_date.unwrap_or(current.end_date);
    let number_of_days = day_span(start, end);

    let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new("UPDATE leaves SET updated_at = now()");
    if let Some(v) = changes.leave_type {
        qb.push(", leave_type = ").push_bind(v);
    }
    if let Some(v) = changes.start_date {
        qb.push(", start_date = ").push_bind(v);
    }
    if let Some(v) = changes.end_date {
        qb.push(", end_date = ").push_bind(v);
    }
    if let Some(v) = changes.reason {
        qb.push(", reason = ").push_bind(v);
    }
    qb.push(", number_of_days = ").push_bind(number_of_days);
    qb.push(" WHERE id = ").push_bind(current.id);
    qb.push(" RETURNING *");

    let row = qb.build_query_as::<Leave>().fetch_one(&pool).await?;
    Ok(row)
}

/// Approve a pending leave. The `status = 'pending'` predicate makes the
/// transition atomic at write time: a leave processed in the meantime
/// yields `None`.
pub async fn approve(id: Uuid, approver: Uuid) -> Result<Option<Leave>, StoreError> {
    let pool = Database::pool().await?;
    let row = sqlx::query_as::<_, Leave>(
        "UPDATE leaves SET status = 'approved', approved_by = $2, \
         approval_date = now(), updated_at = now() \
         WHERE id = $1 AND status = 'pending' RETURNING *",
    )
    .bind(id)
    .bind(approver)
    .fetch_optional(&pool)
    .await?;
    Ok(row)
}

/// Reject a pending leave; same write-time guard as [`approve`].
pub async fn reject(id: Uuid, approver: Uuid, reason: String) -> Result<Option<Leave>, StoreError> {
    let pool = Database::pool().await?;
    let row = sqlx::query_as::<_, Leave>(
        "UPDATE leaves SET status = 'rejected', approved_by = $2, \
         approval_date = now(), rejection_reason = $3, updated_at = now() \
         WHERE id = $1 AND status = 'pending' RETURNING *",
    )
    .bind(id)
    .bind(approver)
    .bind(reason)
    .fetch_optional(&pool)
    .await?;
    Ok(row)
}

pub async fn delete(id: Uuid) -> Result<u64, StoreError> {
    let pool = Database::pool().await?;
    let deleted = sqlx::query("DELETE FROM leaves WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?
        .rows_affected();
    Ok(deleted)
}

pub async fn stats() -> Result<LeaveStats, StoreError> {
    let pool = Database::pool().await?;

    let (total_leaves, pending_leaves, approved_leaves, rejected_leaves): (i64, i64, i64, i64) =
        sqlx::query_as(
            "SELECT COUNT(*), \
                    COUNT(*) FILTER (WHERE status = 'pending'), \
                    COUNT(*) FILTER (WHERE status = 'approved'), \
                    COUNT(*) FILTER (WHERE status = 'rejected') \
             FROM leaves",
        )
        .fetch_one(&pool)
        .await?;

    let leave_type_stats = sqlx::query_as::<_, (LeaveType, i64, i64)>(
        "SELECT leave_type, COUNT(*), COALESCE(SUM(number_of_days), 0) \
         FROM leaves GROUP BY leave_type",
    )
    .fetch_all(&pool)
    .await?
    .into_iter()
    .map(|(leave_type, count, total_days)| LeaveTypeStat {
        leave_type,
        count,
        total_days,
    })
    .collect();

    Ok(LeaveStats {
        total_leaves,
        pending_leaves,
        approved_leaves,
        rejected_leaves,
        leave_type_stats,
    })
}

/// Expand leaves with their owning employee and approver briefs.
pub async fn into_views(leaves: Vec<Leave>) -> Result<Vec<LeaveView>, StoreError> {
    let mut employee_ids: Vec<Uuid> = leaves.iter().map(|l| l.employee_id).collect();
    employee_ids.extend(leaves.iter().filter_map(|l| l.approved_by));
    let briefs = employees::brief_map(&employee_ids).await?;

    Ok(leaves
        .into_iter()
        .map(|l| {
            let employee = briefs.get(&l.employee_id).cloned();
            let approved_by = l.approved_by.and_then(|id| briefs.get(&id).cloned());
            LeaveView::new(l, employee, approved_by)
        })
        .collect())
}

pub async fn into_view(leave: Leave) -> Result<LeaveView, StoreError> {
    let mut views = into_views(vec![leave]).await?;
    Ok(views.remove(0))
}
