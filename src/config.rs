//! Configuration types for resumable-upload

use crate::error::{Error, Result};
use crate::types::FieldKind;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, time::Duration};

/// Bytes reserved for multipart boundaries and part headers in one chunk request
const MULTIPART_FRAMING_ALLOWANCE: usize = 4 * 1024;

/// Multipart field names and size ceilings used when decoding a chunk request
///
/// Every difference between chunked-upload client flavors (field names, explicit
/// filename field, whether a filename is mandatory) is expressed here rather than in code.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Field carrying the chunk's byte offset (default: "offset")
    #[serde(default = "default_offset_field")]
    pub offset_field: String,

    /// Field carrying the declared total upload size (default: "total")
    #[serde(default = "default_total_field")]
    pub total_field: String,

    /// Field carrying the chunk payload (default: "file")
    #[serde(default = "default_file_field")]
    pub file_field: String,

    /// Optional field carrying the file name explicitly
    ///
    /// When unset, the file name is taken from the file part's `filename` parameter.
    #[serde(default)]
    pub filename_field: Option<String>,

    /// Field carrying the upload identifier (default: "id")
    #[serde(default = "default_upload_id_field")]
    pub upload_id_field: String,

    /// Reject chunks without a file name (default: true)
    ///
    /// With the default set, a file part sent without a `filename` parameter (and no
    /// explicit filename field) is a 400. Disable it to accept such chunks with an empty
    /// file name, as lenient receivers do.
    #[serde(default = "default_true")]
    pub require_filename: bool,

    /// Maximum payload size of a single chunk in bytes (default: 256 KiB)
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Maximum size of text fields in bytes, before trimming (default: 1024)
    #[serde(default = "default_text_field_limit")]
    pub text_field_limit: usize,

    /// Maximum size of integer fields in bytes (default: 20, enough for any i64)
    ///
    /// Resumable receivers commonly budget 8 bytes here, which caps offsets and totals
    /// at 99,999,999. Set it to 8 to reproduce that behavior.
    #[serde(default = "default_integer_field_limit")]
    pub integer_field_limit: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            offset_field: default_offset_field(),
            total_field: default_total_field(),
            file_field: default_file_field(),
            filename_field: None,
            upload_id_field: default_upload_id_field(),
            require_filename: true,
            max_chunk_size: default_max_chunk_size(),
            text_field_limit: default_text_field_limit(),
            integer_field_limit: default_integer_field_limit(),
        }
    }
}

impl UploadConfig {
    /// Byte ceiling applied when decoding a field of the given kind
    pub fn limit_for(&self, kind: FieldKind) -> usize {
        match kind {
            FieldKind::Integer => self.integer_field_limit,
            FieldKind::Text => self.text_field_limit,
            FieldKind::Payload => self.max_chunk_size,
        }
    }

    /// Smallest request body that fits a full-size chunk with its id, filename, offset and
    /// total fields at their ceilings
    pub fn min_body_size(&self) -> usize {
        self.max_chunk_size
            .saturating_add(self.text_field_limit.saturating_mul(2))
            .saturating_add(self.integer_field_limit.saturating_mul(2))
            .saturating_add(MULTIPART_FRAMING_ALLOWANCE)
    }
}

/// What to do when the handoff queue has no free slot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum QueueFullPolicy {
    /// Fail the request with 503 immediately
    #[default]
    Reject,
    /// Wait for a free slot up to `timeout_ms`, then fail with 503
    Wait {
        /// Maximum time to wait for the consumer, in milliseconds
        timeout_ms: u64,
    },
}

impl QueueFullPolicy {
    /// How long a request may wait for a free slot, if at all
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            QueueFullPolicy::Reject => None,
            QueueFullPolicy::Wait { timeout_ms } => Some(Duration::from_millis(*timeout_ms)),
        }
    }
}

/// Handoff queue between request handlers and the chunk consumer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Number of chunks that can wait for the consumer (default: 64)
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,

    /// Behavior when the queue is full (default: reject)
    #[serde(default)]
    pub full_policy: QueueFullPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
            full_policy: QueueFullPolicy::default(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8080)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Path accepting chunk uploads (default: "/")
    #[serde(default = "default_upload_path")]
    pub upload_path: String,

    /// Maximum request body size in bytes, multipart framing included (default: 1 MiB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Enable CORS for browser uploads (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: false)
    #[serde(default)]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            upload_path: default_upload_path(),
            max_body_size: default_max_body_size(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: false,
        }
    }
}

/// Main configuration for the upload receiver
///
/// - [`upload`](UploadConfig): field names and size ceilings
/// - [`queue`](QueueConfig): handoff queue sizing and full-queue policy
/// - [`server`](ApiConfig): HTTP listener and middleware
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Field names and size ceilings
    #[serde(default)]
    pub upload: UploadConfig,

    /// Handoff queue settings
    #[serde(default)]
    pub queue: QueueConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ApiConfig,
}

impl Config {
    /// Load and validate a JSON configuration file
    ///
    /// Missing keys take their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| Error::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Check the configuration for values the receiver cannot work with
    pub fn validate(&self) -> Result<()> {
        let upload = &self.upload;

        let mut names = vec![
            ("upload.offset_field", &upload.offset_field),
            ("upload.total_field", &upload.total_field),
            ("upload.file_field", &upload.file_field),
            ("upload.upload_id_field", &upload.upload_id_field),
        ];
        if let Some(filename_field) = &upload.filename_field {
            names.push(("upload.filename_field", filename_field));
        }

        for (i, (key, name)) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(Error::config("field name must not be empty", *key));
            }
            if names[..i].iter().any(|(_, other)| other == name) {
                return Err(Error::config(
                    format!("field name '{name}' is used more than once"),
                    *key,
                ));
            }
        }

        if upload.max_chunk_size == 0 {
            return Err(Error::config(
                "must be greater than zero",
                "upload.max_chunk_size",
            ));
        }
        if upload.text_field_limit == 0 {
            return Err(Error::config(
                "must be greater than zero",
                "upload.text_field_limit",
            ));
        }
        if upload.integer_field_limit == 0 {
            return Err(Error::config(
                "must be greater than zero",
                "upload.integer_field_limit",
            ));
        }
        if self.queue.capacity == 0 {
            return Err(Error::config("must be greater than zero", "queue.capacity"));
        }
        let min_body_size = upload.min_body_size();
        if self.server.max_body_size < min_body_size {
            return Err(Error::config(
                format!(
                    "must be at least {min_body_size} bytes to fit a full chunk and its fields"
                ),
                "server.max_body_size",
            ));
        }
        if !self.server.upload_path.starts_with('/') {
            return Err(Error::config("must start with '/'", "server.upload_path"));
        }
        let upload_path = self.server.upload_path.as_str();
        if crate::api::RESERVED_PATHS
            .iter()
            .any(|reserved| upload_path == *reserved || upload_path.starts_with(&format!("{reserved}/")))
        {
            return Err(Error::config(
                format!("'{upload_path}' is reserved"),
                "server.upload_path",
            ));
        }

        Ok(())
    }
}

fn default_offset_field() -> String {
    "offset".to_string()
}

fn default_total_field() -> String {
    "total".to_string()
}

fn default_file_field() -> String {
    "file".to_string()
}

fn default_upload_id_field() -> String {
    "id".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_chunk_size() -> usize {
    256 * 1024
}

fn default_text_field_limit() -> usize {
    1024
}

fn default_integer_field_limit() -> usize {
    20
}

fn default_queue_capacity() -> usize {
    64
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_upload_path() -> String {
    "/".to_string()
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
