use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::employee::EmployeeBrief;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "leave_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    Sick,
    Casual,
    Vacation,
    Personal,
    Maternity,
    Paternity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "leave_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, FromRow)]
pub struct Leave {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub leave_type: LeaveType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub reason: String,
    pub status: LeaveStatus,
    pub approved_by: Option<Uuid>,
    pub approval_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub number_of_days: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveView {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<EmployeeBrief>,
    pub leave_type: LeaveType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub reason: String,
    pub status: LeaveStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<EmployeeBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub number_of_days: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeaveView {
    pub fn new(
        leave: Leave,
        employee: Option<EmployeeBrief>,
        approved_by: Option<EmployeeBrief>,
    ) -> Self {
        Self {
            id: leave.id,
            employee,
            leave_type: leave.leave_type,
            start_date: leave.start_date,
            end_date: leave.end_date,
            reason: leave.reason,
            status: leave.status,
            approved_by,
            approval_date: leave.approval_date,
            rejection_reason: leave.rejection_reason,
            number_of_days: leave.number_of_days,
            created_at: leave.created_at,
            updated_at: leave.updated_at,
        }
    }
}

/// Inclusive day count between two leave dates. Partial days round up,
/// so a same-day leave spans 1 day. Recomputed on every write that
/// touches either date.
pub fn day_span(start: DateTime<Utc>, end: DateTime<Utc>) -> i32 {
    let seconds = (end - start).num_seconds().abs();
    let whole_days = (seconds + 86_399) / 86_400; // ceiling
    (whole_days + 1) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn same_day_leave_is_one_day() {
        let day = at(2025, 3, 10, 0);
        assert_eq!(day_span(day, day), 1);
    }

    #[test]
    fn inclusive_span_counts_both_endpoints() {
        assert_eq!(day_span(at(2025, 3, 10, 0), at(2025, 3, 12, 0)), 3);
        assert_eq!(day_span(at(2025, 3, 1, 0), at(2025, 3, 31, 0)), 31);
    }

    #[test]
    fn partial_days_round_up() {
        // 10:00 -> next day 18:00 is 1.33 days, ceil + 1 = 3
        assert_eq!(day_span(at(2025, 3, 10, 10), at(2025, 3, 11, 18)), 3);
    }

    #[test]
    fn reversed_dates_use_absolute_span() {
        assert_eq!(day_span(at(2025, 3, 12, 0), at(2025, 3, 10, 0)), 3);
    }
}
