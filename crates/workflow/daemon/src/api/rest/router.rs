//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(handlers::health_check))
        // Templates
        .route(
            "/templates",
            get(handlers::list_templates).post(handlers::create_template),
        )
        .route("/templates/:id", get(handlers::get_template))
        .route("/templates/:id/steps", post(handlers::add_template_step))
        // Status templates
        .route(
            "/status-templates",
            get(handlers::list_status_templates).post(handlers::create_status_template),
        )
        .route("/status-templates/:id", get(handlers::get_status_template))
        // Workflows
        .route(
            "/workflows",
            get(handlers::list_workflows).post(handlers::create_workflow),
        )
        .route("/workflows/stats", get(handlers::workflow_stats))
        .route("/workflows/:id", get(handlers::get_workflow))
        .route("/workflows/:id/advance", post(handlers::advance_workflow))
        .route(
            "/workflows/:id/steps/:step/assign",
            post(handlers::assign_step),
        )
        .route(
            "/workflows/:id/steps/:step/complete",
            post(handlers::complete_step),
        )
        .route("/workflows/:id/status", post(handlers::update_status))
        .route(
            "/workflows/:id/custom-status",
            post(handlers::set_custom_status),
        )
        .route("/workflows/:id/archive", post(handlers::archive_workflow))
        .route("/workflows/:id/restore", post(handlers::restore_workflow))
        .route(
            "/workflows/:id/transitions",
            get(handlers::list_transitions),
        )
        .route(
            "/workflows/:id/assignments",
            get(handlers::list_assignments),
        )
        // Analytics and notifications
        .route("/users/:id/workload", get(handlers::get_user_workload))
        .route("/users/:id/notifications", get(handlers::list_notifications))
        .route("/teams/:id/workload", get(handlers::get_team_workload))
        // Maintenance
        .route(
            "/maintenance/deadline-sweep",
            post(handlers::trigger_deadline_sweep),
        );

    // Build router with middleware
    let router = Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http());

    let router = if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}
