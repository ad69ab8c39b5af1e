pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    Router,
    routing::{get, post, patch},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    service::ServiceContext,
};
use state::AppState;

pub fn create_app(
    service_context: Arc<ServiceContext>,
    settings: Arc<Settings>,
) -> Router {
    let app_state = AppState::new(service_context, settings);
    create_app_with_state(app_state)
}

pub fn create_app_with_state(app_state: AppState) -> Router {
    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))
        .route("/api", get(handlers::root::api_info))

        // API routes
        .nest("/api", api_routes(app_state.clone()))

        // Add state to the router
        .with_state(app_state.clone())

        // Middleware
        .layer(axum::middleware::from_fn_with_state(
            app_state,
            middleware::rate_limit::rate_limit,
        ))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(announcement_routes())
        .merge(profile_routes())
        .merge(analytics_routes())
        .nest("/admin", admin_routes())
        // Every API request gets a resolved viewer (possibly anonymous)
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::optional_auth,
        ))
}

fn announcement_routes() -> Router<AppState> {
    // Reads are open to any viewer; visibility is decided per item.
    let reads = Router::new()
        .route("/announcements", get(handlers::announcements::list))
        .route("/announcements/summary", get(handlers::announcements::summary))
        .route("/announcements/:id", get(handlers::announcements::get));

    let writes = Router::new()
        .route("/announcements", post(handlers::announcements::create))
        .route(
            "/announcements/:id",
            patch(handlers::announcements::update).delete(handlers::announcements::delete),
        )
        .route("/announcements/:id/review", post(handlers::announcements::review))
        .route_layer(axum::middleware::from_fn(middleware::auth::require_admin));

    reads.merge(writes)
}

fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(handlers::profile::get_profile))
        .route_layer(axum::middleware::from_fn(middleware::auth::require_auth))
}

fn analytics_routes() -> Router<AppState> {
    let open = Router::new()
        .route("/analytics/track", post(handlers::analytics::track))
        .route("/redirect-announcement", get(handlers::analytics::redirect));

    let admin = Router::new()
        .route("/analytics/stats", get(handlers::analytics::stats))
        .route("/analytics/link-stats/:id", get(handlers::analytics::link_stats))
        .route_layer(axum::middleware::from_fn(middleware::auth::require_admin));

    open.merge(admin)
}

fn admin_routes() -> Router<AppState> {
    let super_admin = Router::new()
        .route("/users/:id/role", patch(handlers::admin::update_role))
        .route("/users/:id/admin-status", patch(handlers::admin::update_admin_status))
        .route_layer(axum::middleware::from_fn(middleware::auth::require_super_admin));

    Router::new()
        .route("/dashboard", get(handlers::admin::dashboard))
        .route("/users", get(handlers::admin::list_users))
        .route("/users/:id", get(handlers::admin::get_user))
        .route_layer(axum::middleware::from_fn(middleware::auth::require_admin))
        .merge(super_admin)
}
