use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use dotenvy::dotenv;
use serde::Deserialize;
use serde_json::json;
use std::{env, net::SocketAddr};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mpenzi_admin_rust::{
    load::Loader,
    notifications::NotificationsScreen,
    services::{AdminError, InMemoryService, ScreenContext},
    users::{UserFilters, UsersScreen},
};

#[derive(Clone)]
struct AppState {
    admin: InMemoryService,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let admin = InMemoryService::new_with_sample();
    let state = AppState { admin };
    let app = Router::new()
        .route("/health", get(health))
        .route("/users", get(list_users))
        .route("/users/bulk", post(bulk_users))
        .route("/notifications", post(send_notification))
        .with_state(state);

    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".into())
        .parse()
        .expect("invalid BIND_ADDR, expected host:port");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind HTTP listener");
    info!("admin API listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server crashed");
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn admin_ctx() -> ScreenContext {
    let mut ctx = ScreenContext::default();
    ctx.operator.id = 1;
    ctx.operator.is_admin = true;
    ctx
}

fn error_response(err: AdminError) -> axum::response::Response {
    let status = match err {
        AdminError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        AdminError::Validation(_) => StatusCode::BAD_REQUEST,
        AdminError::NotFound(_) => StatusCode::NOT_FOUND,
        AdminError::LoadFailure(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(json!({ "status": "error", "message": err.to_string() })),
    )
        .into_response()
}

async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "service": "ok", "timestamp": chrono::Utc::now() })),
    )
}

#[derive(Deserialize)]
struct UsersQuery {
    status: Option<String>,
    verified: Option<String>,
    gender: Option<String>,
    age_min: Option<i64>,
    age_max: Option<i64>,
    search: Option<String>,
}

impl UsersQuery {
    fn into_filters(self) -> UserFilters {
        let defaults = UserFilters::default();
        UserFilters {
            status: self.status.unwrap_or(defaults.status),
            verified: self.verified.unwrap_or(defaults.verified),
            gender: self.gender.unwrap_or(defaults.gender),
            age_min: self.age_min.unwrap_or(defaults.age_min),
            age_max: self.age_max.unwrap_or(defaults.age_max),
            search: self.search.unwrap_or_default(),
        }
    }
}

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UsersQuery>,
) -> axum::response::Response {
    let mut screen = UsersScreen::new(state.admin.clone());
    if let Err(err) = screen.load(&Loader::default()).await {
        return error_response(err);
    }
    screen.set_filters(query.into_filters());
    let mut ctx = admin_ctx();
    screen.present(&mut ctx);
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "found": ctx.context.int("users_found"),
            "users": ctx.context.get("user_list"),
        })),
    )
        .into_response()
}

#[derive(Deserialize)]
struct BulkRequest {
    action: String,
    ids: Vec<i64>,
}

async fn bulk_users(
    State(state): State<AppState>,
    Json(body): Json<BulkRequest>,
) -> axum::response::Response {
    let mut screen = UsersScreen::new(state.admin.clone());
    if let Err(err) = screen.load(&Loader::default()).await {
        return error_response(err);
    }
    for id in &body.ids {
        screen.toggle_selection(*id);
    }
    if let Err(err) = screen.set_bulk_action(&body.action) {
        return error_response(err);
    }
    let mut ctx = admin_ctx();
    match screen.apply_bulk(&mut ctx) {
        Ok(affected) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "action": body.action, "affected": affected })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn send_notification(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> axum::response::Response {
    let mut screen = NotificationsScreen::new(state.admin.clone());
    if let Err(err) = screen.load(&Loader::default()).await {
        return error_response(err);
    }
    let mut ctx = admin_ctx();
    if let Some(fields) = body.as_object() {
        for (key, value) in fields {
            ctx.form.set(key, value.clone());
        }
    }
    match screen.send(&mut ctx) {
        Ok(id) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "notification_id": id })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    }
}
