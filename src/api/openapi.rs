//! OpenAPI documentation
//!
//! Generated at compile time with utoipa and served at `/openapi.json`.

use utoipa::OpenApi;

/// OpenAPI documentation for the upload server
#[derive(OpenApi)]
#[openapi(
    info(
        title = "resumable-upload",
        version = "0.1.0",
        description = "Chunked multipart upload receiver for resumable.js-style clients",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        crate::api::routes::upload_chunk,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    tags(
        (name = "upload", description = "Chunk upload"),
        (name = "system", description = "Health and documentation")
    )
)]
pub struct ApiDoc;
