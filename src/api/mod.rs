//! REST API server module
//!
//! Exposes task creation, reference submission, status polling (which hands
//! out the finished archive) and task removal over HTTP, plus a health check,
//! an event stream and the OpenAPI document.

use crate::{Result, ZipCollector};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Tasks
/// - `POST /api/zip` - Create a task
/// - `POST /api/zip/add?id=&url=` - Add one or more comma-separated URLs
/// - `GET /api/zip/status?id=` - Poll status; returns the archive once full
/// - `DELETE /api/zip?id=` - Drop a task
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /events` - Server-sent events stream
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(collector: Arc<ZipCollector>) -> Router {
    let config = collector.get_config();
    let state = AppState::new(collector, Arc::clone(&config));

    let router = Router::new()
        .route(
            "/api/zip",
            post(routes::create_task).delete(routes::drop_task),
        )
        .route("/api/zip/add", post(routes::add_references))
        .route("/api/zip/status", get(routes::task_status))
        .route("/health", get(routes::health_check))
        .route("/events", get(routes::event_stream))
        .route("/openapi.json", get(routes::openapi_spec));

    // SwaggerUi serves its own copy of the document, so it needs a distinct path
    let router = if config.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.api.cors_enabled {
        router.layer(build_cors_layer(&config.api.cors_origins))
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` (or an empty list) allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured `host:port`.
///
/// Runs until the collector's shutdown is requested, then stops accepting
/// connections and lets in-flight requests finish.
///
/// # Example
///
/// ```no_run
/// use zip_collector::{Config, ZipCollector};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let collector = Arc::new(ZipCollector::new(Config::default())?);
///
/// // Blocks until shutdown
/// zip_collector::api::start_api_server(collector).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(collector: Arc<ZipCollector>) -> Result<()> {
    let bind_address = collector.config.api.bind_address();

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(Arc::clone(&collector));

    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %listener.local_addr().map_err(crate::error::Error::Io)?,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { collector.shutdown_requested().await })
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
