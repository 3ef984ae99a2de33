//! Role and field-level authorization rules.
//!
//! Every mutating handler funnels its payload through [`screen_update`]
//! and its route gate through [`require_role`], so the per-role rules
//! live in one table instead of being restated per endpoint. Ownership
//! lookups (which employee row belongs to the caller) stay in the
//! handlers since they need the store; the pure decisions live here.

use serde_json::{Map, Value};

use crate::database::models::Role;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Employee,
    Task,
    Leave,
}

impl Resource {
    fn noun(&self) -> &'static str {
        match self {
            Resource::Employee => "employee record",
            Resource::Task => "task",
            Resource::Leave => "leave request",
        }
    }

    /// Every field an update may touch, in wire (camelCase) spelling.
    /// Admin and manager callers may submit any of these.
    fn mutable_fields(&self) -> &'static [&'static str] {
        match self {
            Resource::Employee => &[
                "employeeId",
                "department",
                "designation",
                "dateOfJoining",
                "salary",
                "phoneNumber",
                "address",
                "emergencyContact",
                "skills",
                "manager",
            ],
            Resource::Task => &[
                "title",
                "description",
                "project",
                "assignedTo",
                "assignedBy",
                "status",
                "priority",
                "dueDate",
                "estimatedHours",
                "actualHours",
            ],
            // Status is deliberately absent: pending -> approved/rejected
            // only happens through the approve/reject endpoints.
            Resource::Leave => &["leaveType", "startDate", "endDate", "reason"],
        }
    }

    /// The subset an employee-role caller may touch on their own resource.
    fn employee_fields(&self) -> &'static [&'static str] {
        match self {
            Resource::Employee => &["phoneNumber", "address"],
            Resource::Task => &["status", "actualHours"],
            Resource::Leave => &["leaveType", "startDate", "endDate", "reason"],
        }
    }
}

/// Route-level role gate. Violations surface the caller's role so the
/// client can explain the denial.
pub fn require_role(role: Role, permitted: &[Role]) -> Result<(), ApiError> {
    if permitted.contains(&role) {
        return Ok(());
    }
    Err(ApiError::forbidden(format!(
        "User role '{}' is not authorized to access this route",
        role
    )))
}

/// Field-permission check for update payloads.
///
/// Admin/manager: any known mutable field; unknown keys are a validation
/// error. Employee role: any key outside the allow-list is rejected
/// outright, and the error enumerates both the offending keys and the
/// permitted set.
pub fn screen_update(
    resource: Resource,
    role: Role,
    payload: &Map<String, Value>,
) -> Result<(), ApiError> {
    if payload.is_empty() {
        return Err(ApiError::validation_error("No fields provided for update"));
    }

    match role {
        Role::Admin | Role::Manager => {
            let known = resource.mutable_fields();
            let unknown: Vec<String> = payload
                .keys()
                .filter(|k| !known.contains(&k.as_str()))
                .cloned()
                .collect();
            if !unknown.is_empty() {
                return Err(ApiError::validation_error(format!(
                    "Unknown field(s) for {}: {}",
                    resource.noun(),
                    unknown.join(", ")
                )));
            }
            Ok(())
        }
        Role::Employee => {
            let allowed = resource.employee_fields();
            let rejected: Vec<String> = payload
                .keys()
                .filter(|k| !allowed.contains(&k.as_str()))
                .cloned()
                .collect();
            if !rejected.is_empty() {
                return Err(ApiError::ForbiddenFields {
                    message: format!(
                        "Employees cannot modify the following fields: {}. You can only update: {}",
                        rejected.join(", "),
                        allowed.join(", ")
                    ),
                    rejected,
                    allowed: allowed.iter().map(|s| s.to_string()).collect(),
                });
            }
            Ok(())
        }
    }
}

/// Ownership denial with a per-resource message.
pub fn not_owner(resource: Resource) -> ApiError {
    match resource {
        Resource::Employee => {
            ApiError::forbidden("You can only modify your own employee details")
        }
        Resource::Task => ApiError::forbidden("You can only update tasks assigned to you"),
        Resource::Leave => ApiError::forbidden("You can only access your own leave requests"),
    }
}

/// Denial for employee-role callers without an employee record.
pub fn no_employee_record() -> ApiError {
    ApiError::forbidden("No employee record is linked to your account")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn admin_and_manager_pass_role_gate() {
        assert!(require_role(Role::Admin, &[Role::Admin, Role::Manager]).is_ok());
        assert!(require_role(Role::Manager, &[Role::Admin, Role::Manager]).is_ok());
        let err = require_role(Role::Employee, &[Role::Admin, Role::Manager]).unwrap_err();
        assert!(err.message().contains("'employee'"));
    }

    #[test]
    fn employee_task_update_within_allow_list_passes() {
        let payload = map(json!({ "status": "completed", "actualHours": 7.5 }));
        assert!(screen_update(Resource::Task, Role::Employee, &payload).is_ok());
    }

    #[test]
    fn employee_task_update_outside_allow_list_names_fields() {
        let payload = map(json!({ "status": "completed", "priority": "high", "title": "x" }));
        let err = screen_update(Resource::Task, Role::Employee, &payload).unwrap_err();
        match err {
            ApiError::ForbiddenFields {
                message,
                rejected,
                allowed,
            } => {
                assert_eq!(rejected, vec!["priority".to_string(), "title".to_string()]);
                assert_eq!(allowed, vec!["status".to_string(), "actualHours".to_string()]);
                assert!(message.contains("priority, title"));
                assert!(message.contains("status, actualHours"));
            }
            other => panic!("expected ForbiddenFields, got {:?}", other),
        }
    }

    #[test]
    fn employee_leave_allow_list_matches_contract() {
        let ok = map(json!({ "leaveType": "sick", "startDate": "2025-01-06T00:00:00Z" }));
        assert!(screen_update(Resource::Leave, Role::Employee, &ok).is_ok());

        let bad = map(json!({ "status": "approved" }));
        assert!(matches!(
            screen_update(Resource::Leave, Role::Employee, &bad),
            Err(ApiError::ForbiddenFields { .. })
        ));
    }

    #[test]
    fn employee_record_allow_list_is_phone_and_address() {
        let ok = map(json!({ "phoneNumber": "555-0101", "address": { "city": "Pune" } }));
        assert!(screen_update(Resource::Employee, Role::Employee, &ok).is_ok());

        let bad = map(json!({ "salary": 90000 }));
        assert!(matches!(
            screen_update(Resource::Employee, Role::Employee, &bad),
            Err(ApiError::ForbiddenFields { .. })
        ));
    }

    #[test]
    fn admin_unknown_field_is_validation_error() {
        let payload = map(json!({ "salary": 90000, "nickname": "ace" }));
        let err = screen_update(Resource::Employee, Role::Admin, &payload).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
        assert!(err.message().contains("nickname"));
    }

    #[test]
    fn admin_full_field_set_passes() {
        let payload = map(json!({ "salary": 90000, "department": "IT", "manager": null }));
        assert!(screen_update(Resource::Employee, Role::Admin, &payload).is_ok());
    }

    #[test]
    fn empty_update_is_rejected() {
        let payload = Map::new();
        assert!(matches!(
            screen_update(Resource::Task, Role::Admin, &payload),
            Err(ApiError::ValidationError(_))
        ));
    }
}
