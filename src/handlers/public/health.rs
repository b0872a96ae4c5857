// handlers/public/health.rs - GET / and GET /health handlers

use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use serde_json::{json, Value};

use crate::app::AppState;

pub async fn root_get() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Alumni API",
        "data": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "login": "POST /api/login (public)",
                "profile": "/api/profile",
                "alumni": "/api/alumni[/:id], /api/alumni/employment-status, /api/alumni/check",
                "employment": "/api/employment[/:id], /api/employment/trash, /api/employment/alumni/:alumni_id",
                "roles": "/api/roles[/:id] (admin)",
            }
        }
    }))
}

pub async fn health_get(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let now = state.clock.now();
    let backend = state.store.backend_name();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "ok",
                "data": { "status": "ok", "timestamp": now, "store": backend }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "message": "store unavailable",
                    "data": { "status": "degraded", "timestamp": now, "store": backend, "error": e.to_string() }
                })),
            )
        }
    }
}
