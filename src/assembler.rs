//! Chunk assembly from a multipart request body
//!
//! The assembler walks the parts of one request in order, routes each part to the
//! decoder according to its [`FieldRole`], and produces a validated [`Chunk`]. The first
//! field that fails to decode aborts the request; remaining parts are not read.

use crate::config::UploadConfig;
use crate::decoder::{decode_integer, decode_payload, decode_text};
use crate::error::{Error, FieldError, Result};
use crate::types::{Chunk, FieldRole};
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use std::collections::HashMap;
use std::sync::Arc;

/// Turns multipart request bodies into [`Chunk`]s
#[derive(Debug, Clone)]
pub struct ChunkAssembler {
    config: Arc<UploadConfig>,
}

/// Fields collected so far for the chunk being assembled
#[derive(Debug, Default)]
struct ChunkDraft {
    offset: i64,
    total: i64,
    upload_id: String,
    explicit_filename: Option<String>,
    declared_filename: Option<String>,
    body: Vec<u8>,
    extra: HashMap<String, String>,
}

impl ChunkAssembler {
    /// Create an assembler using the given field names and limits
    pub fn new(config: Arc<UploadConfig>) -> Self {
        Self { config }
    }

    /// Consume the whole multipart stream and build a chunk from it
    ///
    /// # Errors
    ///
    /// - [`Error::Field`] when a part fails to decode, tagged with the part's name
    /// - [`Error::MissingField`] when the upload id (or a required filename) is empty
    /// - [`Error::BodyTooLarge`] when the request body runs past the server's body limit
    /// - [`Error::Multipart`] when the stream fails between parts
    pub async fn assemble(&self, multipart: &mut Multipart) -> Result<Chunk> {
        let config = &*self.config;
        let mut draft = ChunkDraft::default();

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) if exceeds_body_limit(&e) => return Err(Error::BodyTooLarge),
                Err(e) => return Err(Error::Multipart(e.body_text())),
            };

            let Some(name) = field.name().map(str::to_owned) else {
                tracing::debug!("Skipping multipart part without a field name");
                continue;
            };
            let role = FieldRole::classify(&name, config);
            let limit = config.limit_for(role.kind());

            match role {
                FieldRole::Offset => {
                    draft.offset = decode_integer(field, limit)
                        .await
                        .map_err(|e| field_failure(name, e))?;
                }
                FieldRole::Total => {
                    draft.total = decode_integer(field, limit)
                        .await
                        .map_err(|e| field_failure(name, e))?;
                }
                FieldRole::UploadId => {
                    draft.upload_id = decode_text(field, limit)
                        .await
                        .map_err(|e| field_failure(name, e))?;
                }
                FieldRole::Filename => {
                    let filename = decode_text(field, limit)
                        .await
                        .map_err(|e| field_failure(name, e))?;
                    draft.explicit_filename = Some(filename);
                }
                FieldRole::File => {
                    let declared = field.file_name().map(|f| f.trim().to_string());
                    draft.body = decode_payload(field, limit)
                        .await
                        .map_err(|e| field_failure(name, e))?;
                    if declared.is_some() {
                        draft.declared_filename = declared;
                    }
                }
                FieldRole::Extra => {
                    let value = decode_text(field, limit)
                        .await
                        .map_err(|e| field_failure(name.clone(), e))?;
                    draft.extra.insert(name, value);
                }
            }
        }

        draft.finish(config)
    }
}

fn exceeds_body_limit(e: &MultipartError) -> bool {
    e.status() == StatusCode::PAYLOAD_TOO_LARGE
}

/// Tag a decode failure with its field, unless the body limit cut the read short
fn field_failure(name: String, e: FieldError) -> Error {
    if let FieldError::ReadFailure(cause) = &e {
        if cause
            .downcast_ref::<MultipartError>()
            .is_some_and(exceeds_body_limit)
        {
            return Error::BodyTooLarge;
        }
    }
    Error::field(name, e)
}

impl ChunkDraft {
    fn finish(self, config: &UploadConfig) -> Result<Chunk> {
        if self.upload_id.is_empty() {
            return Err(Error::MissingField {
                field: config.upload_id_field.clone(),
            });
        }

        let filename = self
            .explicit_filename
            .filter(|f| !f.is_empty())
            .or(self.declared_filename)
            .unwrap_or_default();
        if filename.is_empty() && config.require_filename {
            return Err(Error::MissingField {
                field: config
                    .filename_field
                    .clone()
                    .unwrap_or_else(|| config.file_field.clone()),
            });
        }

        Ok(Chunk::new(
            filename,
            self.upload_id,
            self.offset,
            self.total,
            self.body,
            self.extra,
        ))
    }
}
