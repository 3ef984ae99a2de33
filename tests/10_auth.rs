mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await?;

    // OK or SERVICE_UNAVAILABLE both count as liveness
    assert!(
        res.status() == StatusCode::OK || res.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        res.status()
    );

    let _body = res.json::<serde_json::Value>().await?;
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let server = common::ensure_server().await?;

    let (status, body) = common::get_json(&server.base_url, "/api/employees", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
    Ok(())
}

#[tokio::test]
async fn register_forces_employee_role_and_login_round_trips() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let email = common::unique_email("reg");

    // Role in the payload must be ignored
    let (status, body) = common::post_json(
        &server.base_url,
        "/api/auth/register",
        None,
        &json!({ "name": "Pat", "email": email, "password": "pw-123456", "role": "admin" }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["role"], "employee");
    assert!(body["data"]["token"].is_string());

    // Duplicate registration is a validation failure
    let (status, _) = common::post_json(
        &server.base_url,
        "/api/auth/register",
        None,
        &json!({ "name": "Pat", "email": email, "password": "pw-123456" }),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Login works with the right password, email case-insensitively
    let (status, body) = common::post_json(
        &server.base_url,
        "/api/auth/login",
        None,
        &json!({ "email": email.to_uppercase(), "password": "pw-123456" }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    // ...and fails closed on a bad one
    let (status, _) = common::post_json(
        &server.base_url,
        "/api/auth/login",
        None,
        &json!({ "email": email, "password": "wrong" }),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The token resolves the principal
    let (status, body) =
        common::get_json(&server.base_url, "/api/auth/me", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["email"], email);
    Ok(())
}

#[tokio::test]
async fn profile_update_refreshes_token() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let email = common::unique_email("prof");

    let (_, body) = common::post_json(
        &server.base_url,
        "/api/auth/register",
        None,
        &json!({ "name": "Sam", "email": email, "password": "pw-123456" }),
    )
    .await?;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = common::put_json(
        &server.base_url,
        "/api/auth/profile",
        Some(&token),
        &json!({ "name": "Sam Renamed" }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["name"], "Sam Renamed");
    assert!(body["data"]["token"].is_string());
    Ok(())
}
