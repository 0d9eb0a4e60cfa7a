pub mod error;
pub mod routes;
pub mod seed;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use compmap_core::memory::MemoryStore;
use compmap_core::store::Notifier;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(store: Arc<MemoryStore>, notifier: Arc<dyn Notifier>) -> Router {
    let app_state = state::AppState::new(store, notifier);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Units
        .route("/api/units", get(routes::units::get_units))
        // Processes
        .route(
            "/api/processes/{id}/context",
            get(routes::processes::get_context),
        )
        .route(
            "/api/processes/{id}/start",
            post(routes::processes::start_process),
        )
        .route(
            "/api/processes/{id}/finalize",
            post(routes::processes::finalize_process),
        )
        .route(
            "/api/processes/{id}/bulk",
            post(routes::processes::bulk_action),
        )
        // Subprocesses
        .route(
            "/api/subprocesses/{id}",
            get(routes::subprocesses::get_subprocess),
        )
        .route(
            "/api/subprocesses/{id}/transitions/{action}",
            post(routes::subprocesses::transition),
        )
        .layer(cors)
        .with_state(app_state)
}

/// Start the campaign-management server.
pub async fn serve(
    store: Arc<MemoryStore>,
    notifier: Arc<dyn Notifier>,
    port: u16,
) -> anyhow::Result<()> {
    let app = build_router(store, notifier);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("campaign server listening on http://localhost:{port}");

    axum::serve(listener, app).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
