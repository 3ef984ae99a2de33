use axum::http::HeaderValue;
use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use staff_api::config;
use staff_api::database::Database;
use staff_api::handlers;
use staff_api::middleware::jwt_auth_middleware;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting staff API in {:?} mode", config.environment);

    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    // Connect and migrate up front. A broken backing store is fatal in
    // production posture; development keeps serving a degraded /health.
    match Database::migrate().await {
        Ok(()) => tracing::info!("Database ready"),
        Err(e) if config.database.require_store_at_startup => {
            tracing::error!("Database unavailable at startup: {}", e);
            std::process::exit(1);
        }
        Err(e) => tracing::warn!("Database unavailable, continuing degraded: {}", e),
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("STAFF_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(5000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("staff API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes())
        // Global middleware
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router {
    use handlers::auth;

    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
}

fn protected_routes() -> Router {
    use handlers::{auth, employees, leaves, projects, tasks, users};

    Router::new()
        // Session & profile
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/profile", put(auth::update_profile))
        // User administration
        .route("/api/users", get(users::list))
        .route("/api/users/:id/role", put(users::update_role))
        .route("/api/users/:id/toggle-status", put(users::toggle_status))
        // Employees
        .route(
            "/api/employees",
            get(employees::list).post(employees::create),
        )
        .route("/api/employees/stats/overview", get(employees::stats))
        .route(
            "/api/employees/:id",
            get(employees::get)
                .put(employees::update)
                .delete(employees::delete),
        )
        // Projects
        .route("/api/projects", get(projects::list).post(projects::create))
        .route("/api/projects/stats/overview", get(projects::stats))
        .route("/api/projects/:id/progress", put(projects::set_progress))
        .route(
            "/api/projects/:id",
            get(projects::get)
                .put(projects::update)
                .delete(projects::delete),
        )
        // Tasks
        .route("/api/tasks", get(tasks::list).post(tasks::create))
        .route("/api/tasks/stats/overview", get(tasks::stats))
        .route(
            "/api/tasks/:id",
            get(tasks::get).put(tasks::update).delete(tasks::delete),
        )
        .route("/api/tasks/:id/comments", post(tasks::add_comment))
        // Leaves
        .route("/api/leaves", get(leaves::list).post(leaves::create))
        .route("/api/leaves/stats/overview", get(leaves::stats))
        .route(
            "/api/leaves/:id",
            get(leaves::get).put(leaves::update).delete(leaves::delete),
        )
        .route("/api/leaves/:id/approve", put(leaves::approve))
        .route("/api/leaves/:id/reject", put(leaves::reject))
        .layer(axum_middleware::from_fn(jwt_auth_middleware))
}

fn cors_layer() -> CorsLayer {
    let origins = &config::config().security.cors_origins;
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse::<HeaderValue>().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Staff API",
            "version": version,
            "description": "Employee management REST API built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/api/auth/register, /api/auth/login (public), /api/auth/me, /api/auth/profile (protected)",
                "users": "/api/users (protected, admin/manager)",
                "employees": "/api/employees[/:id] (protected)",
                "projects": "/api/projects[/:id] (protected)",
                "tasks": "/api/tasks[/:id] (protected)",
                "leaves": "/api/leaves[/:id] (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match Database::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "message": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
