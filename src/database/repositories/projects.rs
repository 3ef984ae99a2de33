use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::manager::{Database, StoreError};
use crate::database::models::{Priority, Project, ProjectStatus, ProjectView};

use super::employees;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub client: String,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub budget: f64,
    pub manager: Uuid,
    #[serde(default)]
    pub team_members: Vec<Uuid>,
}

/// Partial project update; `None` leaves the column untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub client: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
    pub manager: Option<Uuid>,
    pub team_members: Option<Vec<Uuid>>,
    pub progress: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct StatusStat {
    pub status: ProjectStatus,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct PriorityStat {
    pub priority: Priority,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total_projects: i64,
    pub status_stats: Vec<StatusStat>,
    pub priority_stats: Vec<PriorityStat>,
}

pub async fn list_all() -> Result<Vec<Project>, StoreError> {
    let pool = Database::pool().await?;
    let rows = sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY created_at DESC")
        .fetch_all(&pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(id: Uuid) -> Result<Option<Project>, StoreError> {
    let pool = Database::pool().await?;
    let row = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    Ok(row)
}

pub async fn insert(new: NewProject) -> Result<Project, StoreError> {
    let pool = Database::pool().await?;
    let row = sqlx::query_as::<_, Project>(
        "INSERT INTO projects \
         (name, description, client, status, priority, start_date, end_date, \
          budget, manager_id, team_members) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
    )
    .bind(new.name)
    .bind(new.description)
    .bind(new.client)
    .bind(new.status.unwrap_or(ProjectStatus::Planning))
    .bind(new.priority.unwrap_or(Priority::Medium))
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(new.budget)
    .bind(new.manager)
    .bind(new.team_members)
    .fetch_one(&pool)
    .await?;
    Ok(row)
}

pub async fn update(id: Uuid, changes: ProjectChanges) -> Result<Project, StoreError> {
    let pool = Database::pool().await?;
    let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new("UPDATE projects SET updated_at = now()");
    if let Some(v) = changes.name {
        qb.push(", name = ").push_bind(v);
    }
    if let Some(v) = changes.description {
        qb.push(", description = ").push_bind(v);
    }
    if let Some(v) = changes.client {
        qb.push(", client = ").push_bind(v);
    }
    if let Some(v) = changes.status {
        qb.push(", status = ").push_bind(v);
    }
    if let Some(v) = changes.priority {
        qb.push(", priority = ").push_bind(v);
    }
    if let Some(v) = changes.start_date {
        qb.push(", start_date = ").push_bind(v);
    }
    if let Some(v) = changes.end_date {
        qb.push(", end_date = ").push_bind(v);
    }
    if let Some(v) = changes.budget {
        qb.push(", budget = ").push_bind(v);
    }
    if let Some(v) = changes.manager {
        qb.push(", manager_id = ").push_bind(v);
    }
    if let Some(v) = changes.team_members {
        qb.push(", team_members = ").push_bind(v);
    }
    if let Some(v) = changes.progress {
        qb.push(", progress = ")
            .push_bind(crate::database::models::project::clamp_progress(v));
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" RETURNING *");

    let row = qb.build_query_as::<Project>().fetch_one(&pool).await?;
    Ok(row)
}

pub async fn set_progress(id: Uuid, progress: i32) -> Result<Project, StoreError> {
    let pool = Database::pool().await?;
    let row = sqlx::query_as::<_, Project>(
        "UPDATE projects SET progress = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(progress)
    .fetch_one(&pool)
    .await?;
    Ok(row)
}

/// Delete a project and its tasks in one transaction. Returns how many
/// tasks went with it.
pub async fn delete_cascade(id: Uuid) -> Result<u64, StoreError> {
    let pool = Database::pool().await?;
    let mut tx = pool.begin().await?;

    let deleted_tasks = sqlx::query("DELETE FROM tasks WHERE project_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(deleted_tasks)
}

pub async fn stats() -> Result<ProjectStats, StoreError> {
    let pool = Database::pool().await?;

    let (total_projects,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects")
        .fetch_one(&pool)
        .await?;

    let status_stats = sqlx::query_as::<_, (ProjectStatus, i64)>(
        "SELECT status, COUNT(*) FROM projects GROUP BY status",
    )
    .fetch_all(&pool)
    .await?
    .into_iter()
    .map(|(status, count)| StatusStat { status, count })
    .collect();

    let priority_stats = sqlx::query_as::<_, (Priority, i64)>(
        "SELECT priority, COUNT(*) FROM projects GROUP BY priority",
    )
    .fetch_all(&pool)
    .await?
    .into_iter()
    .map(|(priority, count)| PriorityStat { priority, count })
    .collect();

    Ok(ProjectStats {
        total_projects,
        status_stats,
        priority_stats,
    })
}

/// Expand projects into views with manager and team member briefs.
pub async fn into_views(projects: Vec<Project>) -> Result<Vec<ProjectView>, StoreError> {
    let mut employee_ids: Vec<Uuid> = projects.iter().map(|p| p.manager_id).collect();
    employee_ids.extend(projects.iter().flat_map(|p| p.team_members.iter().copied()));
    let briefs = employees::brief_map(&employee_ids).await?;

    Ok(projects
        .into_iter()
        .map(|p| {
            let manager = briefs.get(&p.manager_id).cloned();
            let team = p
                .team_members
                .iter()
                .filter_map(|id| briefs.get(id).cloned())
                .collect();
            ProjectView::new(p, manager, team)
        })
        .collect())
}

pub async fn into_view(project: Project) -> Result<ProjectView, StoreError> {
    let mut views = into_views(vec![project]).await?;
    Ok(views.remove(0))
}
