use axum::{extract::State, http::StatusCode, Json, response::IntoResponse};
use serde::Serialize;
use serde_json::json;

use crate::api::state::AppState;

#[derive(Serialize)]
pub struct ApiInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub status: String,
}

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Campus Board API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Role-aware announcement dashboard for campus communities",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "api": "/api",
            "announcements": "/api/announcements",
            "profile": "/api/profile",
            "analytics": "/api/analytics",
            "admin": "/api/admin"
        }
    }))
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = sqlx::query("SELECT 1")
        .execute(&state.service_context.db_pool)
        .await
        .is_ok();

    let status = if database { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(json!({
        "status": if database { "healthy" } else { "degraded" },
        "database": database,
        "integrations": state.service_context.integration_manager.names().await,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

pub async fn api_info() -> impl IntoResponse {
    Json(ApiInfo {
        name: "Campus Board API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Role-aware announcement dashboard for campus communities".to_string(),
        status: "operational".to_string(),
    })
}
