use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::user::UserView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "department")]
pub enum Department {
    #[sqlx(rename = "IT")]
    #[serde(rename = "IT")]
    It,
    #[sqlx(rename = "HR")]
    #[serde(rename = "HR")]
    Hr,
    Finance,
    Marketing,
    Sales,
    Operations,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub user_id: Uuid,
    pub employee_id: String,
    pub department: Department,
    pub designation: String,
    pub date_of_joining: DateTime<Utc>,
    pub salary: f64,
    pub phone_number: String,
    pub address: Option<Json<Address>>,
    pub emergency_contact: Option<Json<EmergencyContact>>,
    pub skills: Vec<String>,
    pub manager_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Shortened employee reference used when another resource expands its
/// employee links (task assignees, leave owners, project teams).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeBrief {
    pub id: Uuid,
    pub employee_id: String,
    pub designation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
}

impl EmployeeBrief {
    pub fn new(employee: &Employee, user: Option<UserView>) -> Self {
        Self {
            id: employee.id,
            employee_id: employee.employee_id.clone(),
            designation: employee.designation.clone(),
            user,
        }
    }
}

/// Full employee representation with user and manager expanded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeView {
    pub id: Uuid,
    pub employee_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
    pub department: Department,
    pub designation: String,
    pub date_of_joining: DateTime<Utc>,
    pub salary: f64,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<EmergencyContact>,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<EmployeeBrief>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmployeeView {
    pub fn new(employee: Employee, user: Option<UserView>, manager: Option<EmployeeBrief>) -> Self {
        Self {
            id: employee.id,
            employee_id: employee.employee_id,
            user,
            department: employee.department,
            designation: employee.designation,
            date_of_joining: employee.date_of_joining,
            salary: employee.salary,
            phone_number: employee.phone_number,
            address: employee.address.map(|j| j.0),
            emergency_contact: employee.emergency_contact.map(|j| j.0),
            skills: employee.skills,
            manager,
            created_at: employee.created_at,
            updated_at: employee.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn department_wire_names_match_store() {
        assert_eq!(serde_json::to_string(&Department::It).unwrap(), "\"IT\"");
        assert_eq!(
            serde_json::from_str::<Department>("\"Finance\"").unwrap(),
            Department::Finance
        );
        assert!(serde_json::from_str::<Department>("\"Legal\"").is_err());
    }

    #[test]
    fn address_uses_camel_case() {
        let addr = Address {
            zip_code: Some("94110".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&addr).unwrap();
        assert_eq!(json["zipCode"], "94110");
    }
}
