mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

/// End-to-end run through the authorization policy: field filtering on
/// employee/task/leave updates, the leave approval workflow, project
/// auto-progress and the project -> tasks cascade.
#[tokio::test]
async fn role_and_ownership_rules_hold_across_resources() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let base = &server.base_url;
    let admin = common::admin_token(base).await?;

    let suffix = common::unique_email("x");
    let worker_email = common::unique_email("worker");
    let manager_email = common::unique_email("manager");

    // Admin creates a worker (inline employee-role user)...
    let (status, body) = common::post_json(
        base,
        "/api/employees",
        Some(&admin),
        &json!({
            "user": { "name": "Worker One", "email": worker_email, "password": "worker-pw-1" },
            "employeeId": format!("EMP-{}", suffix),
            "department": "IT",
            "designation": "Engineer",
            "dateOfJoining": "2024-01-15T00:00:00Z",
            "salary": 80000,
            "phoneNumber": "555-0100",
            "skills": ["rust"]
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let worker_employee_id = body["data"]["id"].as_str().unwrap().to_string();

    // ...and a manager with an employee record (needed to approve leaves)
    let (status, body) = common::post_json(
        base,
        "/api/employees",
        Some(&admin),
        &json!({
            "user": { "name": "Mgr One", "email": manager_email, "password": "manager-pw-1", "role": "manager" },
            "employeeId": format!("MGR-{}", suffix),
            "department": "Operations",
            "designation": "Team Lead",
            "dateOfJoining": "2023-05-01T00:00:00Z",
            "salary": 120000,
            "phoneNumber": "555-0101"
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let login = |email: String, password: &'static str| {
        let base = base.clone();
        async move {
            let (status, body) = common::post_json(
                &base,
                "/api/auth/login",
                None,
                &json!({ "email": email, "password": password }),
            )
            .await?;
            anyhow::ensure!(status == StatusCode::OK, "login failed: {}", body);
            Ok::<String, anyhow::Error>(body["data"]["token"].as_str().unwrap().to_string())
        }
    };
    let worker = login(worker_email, "worker-pw-1").await?;
    let manager = login(manager_email, "manager-pw-1").await?;

    // Employee may fix their own phone number and address...
    let (status, body) = common::put_json(
        base,
        &format!("/api/employees/{}", worker_employee_id),
        Some(&worker),
        &json!({ "phoneNumber": "555-0199", "address": { "city": "Pune" } }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["phoneNumber"], "555-0199");

    // ...but touching salary is rejected with the field named
    let (status, body) = common::put_json(
        base,
        &format!("/api/employees/{}", worker_employee_id),
        Some(&worker),
        &json!({ "phoneNumber": "555-0123", "salary": 999999 }),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["rejectedFields"][0], "salary");
    assert!(body["allowedFields"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f == "phoneNumber"));

    // Project with 4 tasks: 2 completed, 1 review, 1 todo
    let (status, body) = common::post_json(
        base,
        "/api/projects",
        Some(&admin),
        &json!({
            "name": "Rollout",
            "description": "Internal rollout",
            "client": "Acme",
            "startDate": "2025-01-01T00:00:00Z",
            "endDate": "2025-12-31T00:00:00Z",
            "budget": 50000,
            "manager": worker_employee_id
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let project_id = body["data"]["id"].as_str().unwrap().to_string();

    let mut first_task_id = String::new();
    for (i, task_status) in ["completed", "completed", "review", "todo"].iter().enumerate() {
        let (status, body) = common::post_json(
            base,
            "/api/tasks",
            Some(&admin),
            &json!({
                "title": format!("Task {}", i),
                "description": "work",
                "project": project_id,
                "assignedTo": worker_employee_id,
                "assignedBy": worker_employee_id,
                "status": task_status,
                "dueDate": "2025-07-01T00:00:00Z",
                "estimatedHours": 8
            }),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        if i == 0 {
            first_task_id = body["data"]["id"].as_str().unwrap().to_string();
        }
    }

    // round((2 + 0.9) / 4 * 100) = 73 - the 72.5 tie rounds up
    let (status, body) = common::put_json(
        base,
        &format!("/api/projects/{}/progress", project_id),
        Some(&admin),
        &json!({ "useAutoCalculate": true }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["progress"], 73);

    // Employee updates status/actualHours on their own task
    let (status, body) = common::put_json(
        base,
        &format!("/api/tasks/{}", first_task_id),
        Some(&worker),
        &json!({ "status": "in-progress", "actualHours": 3.5 }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "in-progress");

    // Any other field is rejected outright, listing the offenders
    let (status, body) = common::put_json(
        base,
        &format!("/api/tasks/{}", first_task_id),
        Some(&worker),
        &json!({ "status": "completed", "priority": "critical" }),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["rejectedFields"][0], "priority");

    // Leave workflow: file, amend while pending, approve once
    let (status, body) = common::post_json(
        base,
        "/api/leaves",
        Some(&worker),
        &json!({
            "employee": worker_employee_id,
            "leaveType": "vacation",
            "startDate": "2025-06-02T00:00:00Z",
            "endDate": "2025-06-04T00:00:00Z",
            "reason": "Family visit"
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["numberOfDays"], 3);
    assert_eq!(body["data"]["status"], "pending");
    let leave_id = body["data"]["id"].as_str().unwrap().to_string();

    // Moving the end date recomputes the day count
    let (status, body) = common::put_json(
        base,
        &format!("/api/leaves/{}", leave_id),
        Some(&worker),
        &json!({ "endDate": "2025-06-06T00:00:00Z" }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["numberOfDays"], 5);

    // Employees cannot self-approve via the status field
    let (status, body) = common::put_json(
        base,
        &format!("/api/leaves/{}", leave_id),
        Some(&worker),
        &json!({ "status": "approved" }),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);

    // Manager approves; the transition is one-way
    let (status, body) = common::put_json(
        base,
        &format!("/api/leaves/{}/approve", leave_id),
        Some(&manager),
        &json!({}),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "approved");
    assert!(body["data"]["approvedBy"].is_object());

    for path in ["approve", "reject"] {
        let (status, _) = common::put_json(
            base,
            &format!("/api/leaves/{}/{}", leave_id, path),
            Some(&manager),
            &json!({}),
        )
        .await?;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    // Processed leaves are immutable to the employee
    let (status, _) = common::put_json(
        base,
        &format!("/api/leaves/{}", leave_id),
        Some(&worker),
        &json!({ "reason": "changed my mind" }),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Role administration guards
    let (status, _) = common::get_json(base, "/api/users", Some(&worker)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let me = common::get_json(base, "/api/auth/me", Some(&worker)).await?.1;
    let worker_user_id = me["data"]["user"]["id"].as_str().unwrap().to_string();
    let (status, body) = common::put_json(
        base,
        &format!("/api/users/{}/role", worker_user_id),
        Some(&manager),
        &json!({ "role": "admin" }),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);

    // Deleting the project removes exactly its 4 tasks
    let client = reqwest::Client::new();
    let resp = client
        .delete(format!("{}/api/projects/{}", base, project_id))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["deletedTasks"], 4);

    let (status, body) = common::get_json(
        base,
        &format!("/api/tasks?project={}", project_id),
        Some(&worker),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);

    // Self-demotion goes through while another active admin remains
    let second_admin = common::admin_token(base).await?;
    let me = common::get_json(base, "/api/auth/me", Some(&second_admin))
        .await?
        .1;
    let second_admin_id = me["data"]["user"]["id"].as_str().unwrap().to_string();
    let (status, body) = common::put_json(
        base,
        &format!("/api/users/{}/role", second_admin_id),
        Some(&second_admin),
        &json!({ "role": "manager" }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["role"], "manager");

    Ok(())
}
