use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::employee::EmployeeBrief;
use super::project::Priority;
use super::user::UserView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Review,
    Completed,
}

/// Comment as stored in the tasks.comments jsonb column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub user: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub project_id: Uuid,
    pub assigned_to: Uuid,
    pub assigned_by: Uuid,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: DateTime<Utc>,
    pub estimated_hours: f64,
    pub actual_hours: f64,
    pub comments: Json<Vec<Comment>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment with its author expanded for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Reduced project reference embedded in task responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProjectBrief {
    pub id: Uuid,
    pub name: String,
    pub client: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<TaskProjectBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<EmployeeBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_by: Option<EmployeeBrief>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: DateTime<Utc>,
    pub estimated_hours: f64,
    pub actual_hours: f64,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskView {
    pub fn new(
        task: Task,
        project: Option<TaskProjectBrief>,
        assigned_to: Option<EmployeeBrief>,
        assigned_by: Option<EmployeeBrief>,
        comments: Vec<CommentView>,
    ) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            project,
            assigned_to,
            assigned_by,
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            estimated_hours: task.estimated_hours,
            actual_hours: task.actual_hours,
            comments,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_status_round_trips_kebab_case() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert_eq!(
            serde_json::from_str::<TaskStatus>("\"todo\"").unwrap(),
            TaskStatus::Todo
        );
        assert!(serde_json::from_str::<TaskStatus>("\"done\"").is_err());
    }
}
