use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use crate::database::manager::{Database, StoreError};
use crate::database::models::task::{CommentView, TaskProjectBrief};
use crate::database::models::{Comment, Priority, Project, Task, TaskStatus, TaskView};

use super::{employees, users};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub project: Uuid,
    pub assigned_to: Uuid,
    pub assigned_by: Uuid,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    pub due_date: DateTime<Utc>,
    pub estimated_hours: f64,
    #[serde(default)]
    pub actual_hours: Option<f64>,
}

/// Partial task update; `None` leaves the column untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub assigned_by: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
}

/// Equality filters for the list endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilters {
    pub project: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct PriorityStat {
    pub priority: Priority,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total_tasks: i64,
    pub todo_tasks: i64,
    pub in_progress_tasks: i64,
    pub review_tasks: i64,
    pub completed_tasks: i64,
    pub priority_stats: Vec<PriorityStat>,
}

pub async fn list(filters: TaskFilters) -> Result<Vec<Task>, StoreError> {
    let pool = Database::pool().await?;
    let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new("SELECT * FROM tasks WHERE TRUE");
    if let Some(project) = filters.project {
        qb.push(" AND project_id = ").push_bind(project);
    }
    if let Some(status) = filters.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(assigned_to) = filters.assigned_to {
        qb.push(" AND assigned_to = ").push_bind(assigned_to);
    }
    qb.push(" ORDER BY created_at DESC");

    let rows = qb.build_query_as::<Task>().fetch_all(&pool).await?;
    Ok(rows)
}

pub async fn find_by_id(id: Uuid) -> Result<Option<Task>, StoreError> {
    let pool = Database::pool().await?;
    let row = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    Ok(row)
}

pub async fn insert(new: NewTask) -> Result<Task, StoreError> {
    let pool = Database::pool().await?;
    let row = sqlx::query_as::<_, Task>(
        "INSERT INTO tasks \
         (title, description, project_id, assigned_to, assigned_by, status, \
          priority, due_date, estimated_hours, actual_hours) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
    )
    .bind(new.title)
    .bind(new.description)
    .bind(new.project)
    .bind(new.assigned_to)
    .bind(new.assigned_by)
    .bind(new.status.unwrap_or(TaskStatus::Todo))
    .bind(new.priority.unwrap_or(Priority::Medium))
    .bind(new.due_date)
    .bind(new.estimated_hours)
    .bind(new.actual_hours.unwrap_or(0.0))
    .fetch_one(&pool)
    .await?;
    Ok(row)
}

pub async fn update(id: Uuid, changes: TaskChanges) -> Result<Task, StoreError> {
    let pool = Database::pool().await?;
    let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new("UPDATE tasks SET updated_at = now()");
    if let Some(v) = changes.title {
        qb.push(", title = ").push_bind(v);
    }
    if let Some(v) = changes.description {
        qb.push(", description = ").push_bind(v);
    }
    if let Some(v) = changes.project {
        qb.push(", project_id = ").push_bind(v);
    }
    if let Some(v) = changes.assigned_to {
        qb.push(", assigned_to = ").push_bind(v);
    }
    if let Some(v) = changes.assigned_by {
        qb.push(", assigned_by = ").push_bind(v);
    }
    if let Some(v) = changes.status {
        qb.push(", status = ").push_bind(v);
    }
    if let Some(v) = changes.priority {
        qb.push(", priority = ").push_bind(v);
    }
    if let Some(v) = changes.due_date {
        qb.push(", due_date = ").push_bind(v);
    }
    if let Some(v) = changes.estimated_hours {
        qb.push(", estimated_hours = ").push_bind(v);
    }
    if let Some(v) = changes.actual_hours {
        qb.push(", actual_hours = ").push_bind(v);
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" RETURNING *");

    let row = qb.build_query_as::<Task>().fetch_one(&pool).await?;
    Ok(row)
}

pub async fn delete(id: Uuid) -> Result<u64, StoreError> {
    let pool = Database::pool().await?;
    let deleted = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?
        .rows_affected();
    Ok(deleted)
}

/// Append a comment to the task's jsonb comment array.
pub async fn add_comment(id: Uuid, comment: Comment) -> Result<Task, StoreError> {
    let pool = Database::pool().await?;
    let row = sqlx::query_as::<_, Task>(
        "UPDATE tasks SET comments = comments || $2, updated_at = now() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(Json(vec![comment]))
    .fetch_one(&pool)
    .await?;
    Ok(row)
}

/// (total, completed, review) task counts for a project, feeding the
/// auto-progress derivation.
pub async fn status_counts_for_project(project_id: Uuid) -> Result<(i64, i64, i64), StoreError> {
    let pool = Database::pool().await?;
    let (total, completed, review): (i64, i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), \
                COUNT(*) FILTER (WHERE status = 'completed'), \
                COUNT(*) FILTER (WHERE status = 'review') \
         FROM tasks WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_one(&pool)
    .await?;
    Ok((total, completed, review))
}

pub async fn stats() -> Result<TaskStats, StoreError> {
    let pool = Database::pool().await?;

    let (total_tasks, todo_tasks, in_progress_tasks, review_tasks, completed_tasks): (
        i64,
        i64,
        i64,
        i64,
        i64,
    ) = sqlx::query_as(
        "SELECT COUNT(*), \
                COUNT(*) FILTER (WHERE status = 'todo'), \
                COUNT(*) FILTER (WHERE status = 'in-progress'), \
                COUNT(*) FILTER (WHERE status = 'review'), \
                COUNT(*) FILTER (WHERE status = 'completed') \
         FROM tasks",
    )
    .fetch_one(&pool)
    .await?;

    let priority_stats = sqlx::query_as::<_, (Priority, i64)>(
        "SELECT priority, COUNT(*) FROM tasks GROUP BY priority",
    )
    .fetch_all(&pool)
    .await?
    .into_iter()
    .map(|(priority, count)| PriorityStat { priority, count })
    .collect();

    Ok(TaskStats {
        total_tasks,
        todo_tasks,
        in_progress_tasks,
        review_tasks,
        completed_tasks,
        priority_stats,
    })
}

/// Expand tasks with project, assignee and comment-author references.
pub async fn into_views(tasks: Vec<Task>) -> Result<Vec<TaskView>, StoreError> {
    let pool = Database::pool().await?;

    let project_ids: Vec<Uuid> = tasks.iter().map(|t| t.project_id).collect();
    let project_briefs: std::collections::HashMap<Uuid, TaskProjectBrief> = if project_ids
        .is_empty()
    {
        Default::default()
    } else {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ANY($1)")
            .bind(&project_ids)
            .fetch_all(&pool)
            .await?
            .into_iter()
            .map(|p| {
                (
                    p.id,
                    TaskProjectBrief {
                        id: p.id,
                        name: p.name,
                        client: p.client,
                    },
                )
            })
            .collect()
    };

    let mut employee_ids: Vec<Uuid> = tasks.iter().map(|t| t.assigned_to).collect();
    employee_ids.extend(tasks.iter().map(|t| t.assigned_by));
    let briefs = employees::brief_map(&employee_ids).await?;

    let comment_user_ids: Vec<Uuid> = tasks
        .iter()
        .flat_map(|t| t.comments.0.iter().map(|c| c.user))
        .collect();
    let comment_users = users::view_map(&comment_user_ids).await?;

    Ok(tasks
        .into_iter()
        .map(|t| {
            let project = project_briefs.get(&t.project_id).cloned();
            let assigned_to = briefs.get(&t.assigned_to).cloned();
            let assigned_by = briefs.get(&t.assigned_by).cloned();
            let comments = t
                .comments
                .0
                .iter()
                .map(|c| CommentView {
                    user: comment_users.get(&c.user).cloned(),
                    text: c.text.clone(),
                    created_at: c.created_at,
                })
                .collect();
            TaskView::new(t, project, assigned_to, assigned_by, comments)
        })
        .collect())
}

pub async fn into_view(task: Task) -> Result<TaskView, StoreError> {
    let mut views = into_views(vec![task]).await?;
    Ok(views.remove(0))
}
