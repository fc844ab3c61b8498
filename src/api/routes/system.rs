//! System handlers: health and OpenAPI.

use crate::api::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

/// GET /health - Health check
///
/// Reports 503 once the chunk consumer has stopped, since every upload would fail.
/// Also reports the size limits so clients can pick a chunk size.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Chunk consumer is not running")
    )
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let consumer_running = !state.chunks.is_closed();
    let config = &state.config;
    let (status, label) = if consumer_running {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status,
        Json(json!({
            "status": label,
            "version": env!("CARGO_PKG_VERSION"),
            "queue": {
                "capacity": state.chunks.capacity(),
                "available": state.chunks.available(),
            },
            "limits": {
                "max_chunk_size": config.upload.max_chunk_size,
                "max_body_size": config.server.max_body_size,
            }
        })),
    )
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}
