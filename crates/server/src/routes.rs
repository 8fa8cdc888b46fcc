//! Route configuration.

use crate::auth::auth_middleware;
use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Health check (intentionally unauthenticated for probes)
        .route("/api/health", get(handlers::health_check))
        .route("/api/analyzers", get(handlers::list_analyzers))
        .route("/api/analyzers/{kind}", post(handlers::analyze_batch))
        // Projects
        .route(
            "/api/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/api/projects/{project_id}",
            get(handlers::get_project)
                .put(handlers::update_project)
                .delete(handlers::delete_project),
        )
        .route(
            "/api/projects/{project_id}/upload",
            post(handlers::upload_archive),
        )
        // Files
        .route(
            "/api/projects/{project_id}/files",
            get(handlers::list_files).post(handlers::upsert_file),
        )
        .route(
            "/api/projects/{project_id}/files/{file_id}",
            put(handlers::update_file).delete(handlers::delete_file),
        )
        .route(
            "/api/projects/{project_id}/files/{file_id}/analyze",
            post(handlers::analyze_file),
        );

    let mut router = Router::new().merge(api_routes);

    // Metrics carry no per-user data but should still be network-restricted
    // to the scraper when exposed.
    if state.config.server.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    // Order of execution: TraceLayer -> Auth -> Handler
    router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
