//! HTTP error response handling
//!
//! Errors become plain-text responses whose body is the error's display form,
//! e.g. `malformed value: invalid digit found in string (offset)`.

use crate::error::{Error, ToHttpStatus};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "Chunk request failed");
        } else {
            tracing::warn!(code = self.error_code(), error = %self, "Chunk request rejected");
        }

        (status_code, self.to_string()).into_response()
    }
}
