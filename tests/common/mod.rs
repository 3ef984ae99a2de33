use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_staff-api"));
        cmd.env("STAFF_API_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // Inherit environment so the server sees DATABASE_URL and JWT_SECRET
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                // Ready on any non-404 response
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Endpoint tests need a reachable Postgres; without DATABASE_URL they
/// no-op so the pure-logic suite still runs everywhere.
pub fn db_available() -> bool {
    std::env::var("DATABASE_URL").is_ok()
}

/// Unique-enough email for registration tests.
pub fn unique_email(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}@example.test", prefix, nanos)
}

pub async fn post_json(
    base_url: &str,
    path: &str,
    token: Option<&str>,
    body: &Value,
) -> Result<(StatusCode, Value)> {
    let client = reqwest::Client::new();
    let mut req = client.post(format!("{}{}", base_url, path)).json(body);
    if let Some(token) = token {
        req = req.bearer_auth(token);
    }
    let resp = req.send().await?;
    let status = resp.status();
    let body = resp.json::<Value>().await.unwrap_or(Value::Null);
    Ok((status, body))
}

pub async fn put_json(
    base_url: &str,
    path: &str,
    token: Option<&str>,
    body: &Value,
) -> Result<(StatusCode, Value)> {
    let client = reqwest::Client::new();
    let mut req = client.put(format!("{}{}", base_url, path)).json(body);
    if let Some(token) = token {
        req = req.bearer_auth(token);
    }
    let resp = req.send().await?;
    let status = resp.status();
    let body = resp.json::<Value>().await.unwrap_or(Value::Null);
    Ok((status, body))
}

pub async fn get_json(
    base_url: &str,
    path: &str,
    token: Option<&str>,
) -> Result<(StatusCode, Value)> {
    let client = reqwest::Client::new();
    let mut req = client.get(format!("{}{}", base_url, path));
    if let Some(token) = token {
        req = req.bearer_auth(token);
    }
    let resp = req.send().await?;
    let status = resp.status();
    let body = resp.json::<Value>().await.unwrap_or(Value::Null);
    Ok((status, body))
}

/// Create an admin account through staffctl and return a login token.
#[allow(dead_code)]
pub async fn admin_token(base_url: &str) -> Result<String> {
    let email = unique_email("admin");
    let status = Command::new(env!("CARGO_BIN_EXE_staffctl"))
        .args([
            "admin",
            "create",
            "--name",
            "Test Admin",
            "--email",
            email.as_str(),
            "--password",
            "admin-pass-1",
        ])
        .status()
        .context("failed to run staffctl")?;
    anyhow::ensure!(status.success(), "staffctl admin create failed");

    let (status, body) = post_json(
        base_url,
        "/api/auth/login",
        None,
        &serde_json::json!({ "email": email, "password": "admin-pass-1" }),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::OK, "admin login failed: {}", body);
    Ok(body["data"]["token"].as_str().unwrap().to_string())
}
