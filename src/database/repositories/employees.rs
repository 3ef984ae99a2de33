use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use crate::database::manager::{Database, StoreError};
use crate::database::models::employee::Department;
use crate::database::models::{
    Address, EmergencyContact, Employee, EmployeeBrief, EmployeeView, User,
};

use super::users::{self, NewUser};

pub struct NewEmployee {
    pub user_id: Uuid,
    pub employee_id: String,
    pub department: Department,
    pub designation: String,
    pub date_of_joining: DateTime<Utc>,
    pub salary: f64,
    pub phone_number: String,
    pub address: Option<Address>,
    pub emergency_contact: Option<EmergencyContact>,
    pub skills: Vec<String>,
    pub manager_id: Option<Uuid>,
}

/// Partial employee update; `None` leaves the column untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeChanges {
    pub employee_id: Option<String>,
    pub department: Option<Department>,
    pub designation: Option<String>,
    pub date_of_joining: Option<DateTime<Utc>>,
    pub salary: Option<f64>,
    pub phone_number: Option<String>,
    pub address: Option<Address>,
    pub emergency_contact: Option<EmergencyContact>,
    pub skills: Option<Vec<String>>,
    pub manager: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DepartmentStat {
    pub department: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeStats {
    pub total_employees: i64,
    pub active_users: i64,
    pub inactive_users: i64,
    pub department_stats: Vec<DepartmentStat>,
}

pub async fn list_all() -> Result<Vec<Employee>, StoreError> {
    let pool = Database::pool().await?;
    let rows = sqlx::query_as::<_, Employee>("SELECT * FROM employees ORDER BY created_at DESC")
        .fetch_all(&pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(id: Uuid) -> Result<Option<Employee>, StoreError> {
    let pool = Database::pool().await?;
    let row = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    Ok(row)
}

/// Employee record linked to a user account, if any. Ownership checks
/// resolve the acting principal's employee row through this.
pub async fn find_by_user(user_id: Uuid) -> Result<Option<Employee>, StoreError> {
    let pool = Database::pool().await?;
    let row = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?;
    Ok(row)
}

pub async fn find_by_employee_code(employee_id: &str) -> Result<Option<Employee>, StoreError> {
    let pool = Database::pool().await?;
    let row = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE employee_id = $1")
        .bind(employee_id)
        .fetch_optional(&pool)
        .await?;
    Ok(row)
}

async fn find_by_ids(ids: &[Uuid]) -> Result<Vec<Employee>, StoreError> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let pool = Database::pool().await?;
    let rows = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(&pool)
        .await?;
    Ok(rows)
}

const INSERT_SQL: &str = "INSERT INTO employees \
    (user_id, employee_id, department, designation, date_of_joining, salary, \
     phone_number, address, emergency_contact, skills, manager_id) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *";

pub async fn insert(new: NewEmployee) -> Result<Employee, StoreError> {
    let pool = Database::pool().await?;
    let row = sqlx::query_as::<_, Employee>(INSERT_SQL)
        .bind(new.user_id)
        .bind(new.employee_id)
        .bind(new.department)
        .bind(new.designation)
        .bind(new.date_of_joining)
        .bind(new.salary)
        .bind(new.phone_number)
        .bind(new.address.map(Json))
        .bind(new.emergency_contact.map(Json))
        .bind(new.skills)
        .bind(new.manager_id)
        .fetch_one(&pool)
        .await?;
    Ok(row)
}

/// Create a user account and its employee record in one transaction, so
/// a failed second write cannot leave an orphaned account behind.
pub async fn insert_with_user(
    new_user: NewUser,
    mut new: NewEmployee,
) -> Result<(User, Employee), StoreError> {
    let pool = Database::pool().await?;
    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, password, role) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(new_user.name)
    .bind(new_user.email)
    .bind(new_user.password)
    .bind(new_user.role)
    .fetch_one(&mut *tx)
    .await?;

    new.user_id = user.id;
    let employee = sqlx::query_as::<_, Employee>(INSERT_SQL)
        .bind(new.user_id)
        .bind(new.employee_id)
        .bind(new.department)
        .bind(new.designation)
        .bind(new.date_of_joining)
        .bind(new.salary)
        .bind(new.phone_number)
        .bind(new.address.map(Json))
        .bind(new.emergency_contact.map(Json))
        .bind(new.skills)
        .bind(new.manager_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok((user, employee))
}

pub async fn update(id: Uuid, changes: EmployeeChanges) -> Result<Employee, StoreError> {
    let pool = Database::pool().await?;
    let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new("UPDATE employees SET updated_at = now()");
    if let Some(v) = changes.employee_id {
        qb.push(", employee_id = ").push_bind(v);
    }
    if let Some(v) = changes.department {
        qb.push(", department = ").push_bind(v);
    }
    if let Some(v) = changes.designation {
        qb.push(", designation = ").push_bind(v);
    }
    if let Some(v) = changes.date_of_joining {
        qb.push(", date_of_joining = ").push_bind(v);
    }
    if let Some(v) = changes.salary {
        qb.push(", salary = ").push_bind(v);
    }
    if let Some(v) = changes.phone_number {
        qb.push(", phone_number = ").push_bind(v);
    }
    if let Some(v) = changes.address {
        qb.push(", address = ").push_bind(Json(v));
    }
    if let Some(v) = changes.emergency_contact {
        qb.push(", emergency_contact = ").push_bind(Json(v));
    }
    if let Some(v) = changes.skills {
        qb.push(", skills = ").push_bind(v);
    }
    if let Some(v) = changes.manager {
        qb.push(", manager_id = ").push_bind(v);
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" RETURNING *");

    let row = qb.build_query_as::<Employee>().fetch_one(&pool).await?;
    Ok(row)
}

/// Delete an employee and its linked user account in one transaction.
pub async fn delete_with_user(employee: &Employee) -> Result<(), StoreError> {
    let pool = Database::pool().await?;
    let mut tx = pool.begin().await?;

    // Detach dependents that reference this employee before removal.
    sqlx::query("UPDATE employees SET manager_id = NULL WHERE manager_id = $1")
        .bind(employee.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM employees WHERE id = $1")
        .bind(employee.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(employee.user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn stats() -> Result<EmployeeStats, StoreError> {
    let pool = Database::pool().await?;

    let (total_employees,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM employees")
        .fetch_one(&pool)
        .await?;
    let (active_users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE is_active")
        .fetch_one(&pool)
        .await?;
    let (inactive_users,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE NOT is_active")
            .fetch_one(&pool)
            .await?;

    let department_stats = sqlx::query_as::<_, (String, i64)>(
        "SELECT department::text, COUNT(*) FROM employees GROUP BY department",
    )
    .fetch_all(&pool)
    .await?
    .into_iter()
    .map(|(department, count)| DepartmentStat { department, count })
    .collect();

    Ok(EmployeeStats {
        total_employees,
        active_users,
        inactive_users,
        department_stats,
    })
}

/// Batch fetch of employee briefs (with user expanded) keyed by id.
/// Used by tasks, leaves and projects to expand their employee refs.
pub async fn brief_map(ids: &[Uuid]) -> Result<HashMap<Uuid, EmployeeBrief>, StoreError> {
    let employees = find_by_ids(ids).await?;
    let user_ids: Vec<Uuid> = employees.iter().map(|e| e.user_id).collect();
    let user_views = users::view_map(&user_ids).await?;

    Ok(employees
        .into_iter()
        .map(|e| {
            let user = user_views.get(&e.user_id).cloned();
            (e.id, EmployeeBrief::new(&e, user))
        })
        .collect())
}

/// Expand a batch of employees into full views (user + manager).
pub async fn into_views(employees: Vec<Employee>) -> Result<Vec<EmployeeView>, StoreError> {
    let user_ids: Vec<Uuid> = employees.iter().map(|e| e.user_id).collect();
    let user_views = users::view_map(&user_ids).await?;

    let manager_ids: Vec<Uuid> = employees.iter().filter_map(|e| e.manager_id).collect();
    let managers = brief_map(&manager_ids).await?;

    Ok(employees
        .into_iter()
        .map(|e| {
            let user = user_views.get(&e.user_id).cloned();
            let manager = e.manager_id.and_then(|id| managers.get(&id).cloned());
            EmployeeView::new(e, user, manager)
        })
        .collect())
}

pub async fn into_view(employee: Employee) -> Result<EmployeeView, StoreError> {
    let mut views = into_views(vec![employee]).await?;
    Ok(views.remove(0))
}
