use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Extension, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::clock::Clock;
use crate::config::config;
use crate::database::Store;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(public::root_get))
        .route("/health", get(public::health_get))
        .route("/api/login", post(public::login_post))
        // Protected
        .merge(protected_routes())
        .layer(Extension(state));

    if config().api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    if config().security.enable_cors {
        router = router.layer(cors_layer());
    }
    router
}

fn protected_routes() -> Router {
    Router::new()
        .route("/api/profile", get(protected::profile::profile_get))
        .merge(alumni_routes())
        .merge(employment_routes())
        .merge(role_routes())
        .route_layer(middleware::from_fn(jwt_auth_middleware))
}

fn alumni_routes() -> Router {
    use protected::alumni;

    Router::new()
        .route("/api/alumni", get(alumni::alumni_list).post(alumni::alumni_create))
        // Registered before /:id so the literal segment wins
        .route("/api/alumni/employment-status", get(alumni::employment_status_get))
        .route("/api/alumni/check", get(alumni::alumni_check))
        .route(
            "/api/alumni/:id",
            get(alumni::alumni_get).put(alumni::alumni_update).delete(alumni::alumni_delete),
        )
}

fn employment_routes() -> Router {
    use protected::employment;

    Router::new()
        .route("/api/employment", get(employment::employment_list).post(employment::employment_create))
        .route("/api/employment/trash", get(employment::employment_trash))
        .route("/api/employment/alumni/:alumni_id", get(employment::employment_by_alumnus))
        .route(
            "/api/employment/:id",
            get(employment::employment_get)
                .put(employment::employment_update)
                .delete(employment::employment_delete),
        )
        .route("/api/employment/:id/soft-delete", put(employment::employment_soft_delete))
        .route("/api/employment/:id/restore", put(employment::employment_restore))
        .route("/api/employment/:id/hard-delete", delete(employment::employment_hard_delete))
}

fn role_routes() -> Router {
    use protected::roles;

    Router::new()
        .route("/api/roles", get(roles::roles_list).post(roles::role_create))
        .route("/api/roles/:id", get(roles::role_get).put(roles::role_update).delete(roles::role_delete))
}

fn cors_layer() -> CorsLayer {
    let origins = &config().security.cors_origins;
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()).collect();
    layer.allow_origin(parsed)
}
