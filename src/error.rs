//! Error types for resumable-upload
//!
//! This module provides error handling for the upload receiver, including:
//! - Field-level decode failures tagged with the offending field name
//! - Protocol mismatches detected before any parsing begins
//! - Handoff queue failures
//! - HTTP status code mapping for API integration

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for resumable-upload operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed cause of a failed read from a multipart part
pub type ReadCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for resumable-upload
///
/// Every request-scoped failure is one of these variants. None of them is fatal to the
/// process; the server reports the error to the client and keeps serving.
#[derive(Debug, Error)]
pub enum Error {
    /// A multipart field failed to decode
    ///
    /// Rendered as `"<cause> (<field-name>)"` so clients can tell which field was rejected.
    #[error("{source} ({field})")]
    Field {
        /// The field name as it appeared in the request
        field: String,
        /// What went wrong while decoding the field
        #[source]
        source: FieldError,
    },

    /// A required field was absent or empty after the whole body was consumed
    #[error("empty ({field})")]
    MissingField {
        /// The configured name of the missing field
        field: String,
    },

    /// Wrong HTTP method or non-multipart body
    #[error("{0}")]
    ProtocolMismatch(#[from] ProtocolMismatch),

    /// The request body is larger than the server's body limit
    ///
    /// Raised before the offending part can be identified, so it carries no field name.
    #[error("request body exceeds the size limit")]
    BodyTooLarge,

    /// The multipart stream failed between parts
    #[error("multipart stream error: {0}")]
    Multipart(String),

    /// The handoff queue has no free slot
    #[error("chunk queue is full")]
    QueueFull,

    /// The chunk consumer has stopped and the queue is closed
    #[error("chunk consumer is not running")]
    QueueClosed,

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "upload.max_chunk_size")
        key: Option<String>,
    },

    /// Configuration file could not be read
    #[error("failed to read config file {path}: {source}")]
    ConfigFile {
        /// Path of the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

impl Error {
    /// Tag a field-level failure with the name of the field it occurred in
    pub fn field(field: impl Into<String>, source: FieldError) -> Self {
        Error::Field {
            field: field.into(),
            source,
        }
    }

    /// Create a configuration error pointing at a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Failures while decoding a single multipart field
#[derive(Debug, Error)]
pub enum FieldError {
    /// Value is present but does not match its interpretation (e.g. non-numeric offset)
    #[error("malformed value: {0}")]
    Malformed(String),

    /// The underlying stream failed while reading the part
    #[error("read failed: {0}")]
    ReadFailure(#[source] ReadCause),

    /// The file payload exceeds the configured chunk ceiling
    #[error("max chunk size exceeded ({limit} bytes)")]
    OversizedChunk {
        /// The configured ceiling in bytes
        limit: usize,
    },
}

/// Requests rejected before the body is parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolMismatch {
    /// Anything but POST
    #[error("POST expected")]
    Method,

    /// Missing or invalid `multipart/form-data` content type
    #[error("multipart/form-data expected")]
    ContentType,
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Field { .. } => 400,
            Error::MissingField { .. } => 400,
            Error::BodyTooLarge => 400,
            Error::ProtocolMismatch(ProtocolMismatch::ContentType) => 400,
            Error::Config { .. } => 400,

            // 405 Method Not Allowed
            Error::ProtocolMismatch(ProtocolMismatch::Method) => 405,

            // 500 Internal Server Error - Server-side issues
            Error::Multipart(_) => 500,
            Error::ConfigFile { .. } => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,

            // 503 Service Unavailable - consumer is behind or gone
            Error::QueueFull => 503,
            Error::QueueClosed => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Field { source, .. } => match source {
                FieldError::Malformed(_) => "malformed_field",
                FieldError::ReadFailure(_) => "read_failure",
                FieldError::OversizedChunk { .. } => "oversized_chunk",
            },
            Error::MissingField { .. } => "missing_field",
            Error::BodyTooLarge => "body_too_large",
            Error::ProtocolMismatch(_) => "protocol_mismatch",
            Error::Multipart(_) => "multipart_error",
            Error::QueueFull => "queue_full",
            Error::QueueClosed => "queue_closed",
            Error::Config { .. } => "config_error",
            Error::ConfigFile { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}
