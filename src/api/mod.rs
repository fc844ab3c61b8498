//! HTTP server module
//!
//! Exposes the chunk upload endpoint plus health and OpenAPI routes.

use crate::dispatch::ChunkSender;
use crate::{Config, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use std::future::Future;
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

/// Paths served by the router itself; the upload path must not collide with them
pub const RESERVED_PATHS: &[&str] = &["/health", "/openapi.json", "/swagger-ui", "/api-docs"];

/// Create the router with all route definitions
///
/// # Routes
///
/// - `POST {upload_path}` - Decode one chunk and queue it for the consumer
///   (any other method gets 405)
/// - `GET /health` - Health check including queue occupancy
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(config: Arc<Config>, chunks: ChunkSender) -> Router {
    let state = AppState::new(config.clone(), chunks);

    let router = Router::new()
        .route(
            &config.server.upload_path,
            post(routes::upload_chunk).fallback(routes::method_not_allowed),
        )
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec));

    // Swagger UI serves its own copy of the document, so it needs a path distinct
    // from /openapi.json
    let router = if config.server.swagger_ui {
        router.merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
    } else {
        router
    };

    let router = router
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(TraceLayer::new_for_http());

    if config.server.cors_enabled {
        router.layer(build_cors_layer(&config.server.cors_origins))
    } else {
        router
    }
}

/// CORS for browser upload widgets
///
/// `"*"` or an empty list admits any origin. Only the methods the router serves are
/// allowed; request headers are left open since upload libraries add their own.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let origin = if origins.is_empty() || origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| o.parse::<HeaderValue>().ok()))
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Start the server on the configured bind address
///
/// Runs until SIGTERM/SIGINT (Ctrl+C elsewhere), then stops accepting connections and
/// lets in-flight requests finish.
///
/// # Example
///
/// ```no_run
/// use resumable_upload::{Config, LoggingHandler, chunk_queue, spawn_consumer};
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let (chunks, receiver) = chunk_queue(&config.queue);
/// let consumer = spawn_consumer(receiver, Arc::new(LoggingHandler), CancellationToken::new());
///
/// resumable_upload::api::start_api_server(config, chunks).await?;
/// consumer.await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(config: Arc<Config>, chunks: ChunkSender) -> Result<()> {
    let bind_address = config.server.bind_address;

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    serve(listener, config, chunks, crate::shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` completes
pub async fn serve<F>(
    listener: TcpListener,
    config: Arc<Config>,
    chunks: ChunkSender,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let address = listener.local_addr().map_err(crate::error::Error::Io)?;
    let upload_path = config.server.upload_path.clone();

    let app = create_router(config, chunks);

    tracing::info!(
        address = %address,
        upload_path = %upload_path,
        "Upload server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("Upload server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
