//! Chunk upload handler.

use crate::api::AppState;
use crate::error::{Error, ProtocolMismatch};
use axum::extract::{Multipart, State, multipart::MultipartRejection};

/// POST {upload_path} - Decode one chunk and queue it for the consumer
///
/// Responds as soon as the chunk is queued; the consumer processes it later.
#[utoipa::path(
    post,
    path = "/",
    tag = "upload",
    request_body(
        content = Vec<u8>,
        description = "One chunk: `id`, `offset`, `total`, `file` and any extra fields",
        content_type = "multipart/form-data"
    ),
    responses(
        (status = 200, description = "Chunk queued", body = String),
        (status = 400, description = "Field failed to decode, required field missing, body over the size limit, or body not multipart"),
        (status = 405, description = "Method other than POST"),
        (status = 500, description = "Multipart stream failed between fields"),
        (status = 503, description = "Chunk queue full or consumer stopped")
    )
)]
pub async fn upload_chunk(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<&'static str, Error> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "Rejected non-multipart upload request");
        Error::from(ProtocolMismatch::ContentType)
    })?;

    let chunk = state.assembler.assemble(&mut multipart).await?;

    tracing::debug!(
        upload_id = %chunk.upload_id(),
        offset = chunk.offset(),
        size = chunk.body().len(),
        is_final = chunk.is_final(),
        "Chunk decoded"
    );

    state.chunks.dispatch(chunk).await?;
    Ok("OK")
}

/// Any method other than POST on the upload path
pub async fn method_not_allowed() -> Error {
    ProtocolMismatch::Method.into()
}
