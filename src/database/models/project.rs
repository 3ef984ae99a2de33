use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::employee::EmployeeBrief;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Planning,
    InProgress,
    OnHold,
    Completed,
    Cancelled,
}

/// Shared by projects and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub client: String,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub budget: f64,
    pub manager_id: Uuid,
    pub team_members: Vec<Uuid>,
    pub progress: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub client: String,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub budget: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<EmployeeBrief>,
    pub team_members: Vec<EmployeeBrief>,
    pub progress: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectView {
    pub fn new(
        project: Project,
        manager: Option<EmployeeBrief>,
        team_members: Vec<EmployeeBrief>,
    ) -> Self {
        Self {
            id: project.id,
            name: project.name,
            description: project.description,
            client: project.client,
            status: project.status,
            priority: project.priority,
            start_date: project.start_date,
            end_date: project.end_date,
            budget: project.budget,
            manager,
            team_members,
            progress: project.progress,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// Clamp a manually supplied progress value into the valid range.
pub fn clamp_progress(progress: f64) -> i32 {
    progress.clamp(0.0, 100.0).round() as i32
}

/// Derive progress from task completion counts. Review-status tasks count
/// as 90% done. Ties round half away from zero, so 72.5 becomes 73.
pub fn auto_progress(total: i64, completed: i64, review: i64) -> i32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 + review as f64 * 0.9) / total as f64 * 100.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ProjectStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert_eq!(
            serde_json::from_str::<ProjectStatus>("\"on-hold\"").unwrap(),
            ProjectStatus::OnHold
        );
    }

    #[test]
    fn auto_progress_zero_tasks_is_zero() {
        assert_eq!(auto_progress(0, 0, 0), 0);
    }

    #[test]
    fn auto_progress_rounds_half_up() {
        // 4 tasks, 2 completed, 1 in review: (2 + 0.9) / 4 * 100 = 72.5 -> 73
        assert_eq!(auto_progress(4, 2, 1), 73);
    }

    #[test]
    fn auto_progress_whole_values() {
        assert_eq!(auto_progress(4, 4, 0), 100);
        assert_eq!(auto_progress(4, 0, 0), 0);
        assert_eq!(auto_progress(2, 1, 0), 50);
        assert_eq!(auto_progress(10, 3, 2), 48); // (3 + 1.8) / 10 * 100 = 48
    }

    #[test]
    fn manual_progress_is_clamped() {
        assert_eq!(clamp_progress(-5.0), 0);
        assert_eq!(clamp_progress(100.1), 100);
        assert_eq!(clamp_progress(250.0), 100);
        assert_eq!(clamp_progress(55.0), 55);
    }
}
