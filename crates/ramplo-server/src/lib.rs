pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Catalog
        .route("/api/catalog/sprints", get(routes::catalog::list_sprints))
        .route("/api/catalog/sprints/{id}", get(routes::catalog::get_sprint))
        .route("/api/catalog/templates", get(routes::catalog::list_templates))
        // Selection previews
        .route("/api/roadmap/select", post(routes::roadmap::select_roadmap))
        .route(
            "/api/templates/select",
            post(routes::templates::select_templates),
        )
        // Onboarding
        .route("/api/onboarding", post(routes::onboarding::onboard))
        .route("/api/profile", get(routes::profile::get_profile))
        // Tasks
        .route("/api/tasks", get(routes::tasks::list_tasks))
        .route(
            "/api/tasks/{id}/complete",
            patch(routes::tasks::complete_task),
        )
        // Progress
        .route("/api/progress", get(routes::progress::get_progress))
        .route("/api/progress/advance", post(routes::progress::advance))
        .route("/api/progress/cursor", put(routes::progress::set_cursor))
        .route(
            "/api/progress/outcomes",
            post(routes::progress::record_outcomes),
        )
        // Connections
        .route(
            "/api/connections/{date}",
            put(routes::connections::put_connections).get(routes::connections::get_connections),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the RampLO API server on `0.0.0.0:<port>`.
pub async fn serve(app_state: AppState, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(app_state, listener).await
}

/// Start the server on a pre-bound listener.
///
/// Lets the caller read the actual port first when binding port 0.
pub async fn serve_on(app_state: AppState, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(app_state);

    tracing::info!("RampLO API listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
