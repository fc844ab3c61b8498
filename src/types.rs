//! Core types: the decoded chunk record and the field classification table

use crate::config::UploadConfig;
use std::collections::HashMap;

/// One decoded fragment of a larger upload
///
/// A `Chunk` is only produced by the assembler once every required field is present.
/// Its fields are read-only; the consumer receives it by value and nothing else holds
/// a reference to it after handoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    filename: String,
    upload_id: String,
    offset: i64,
    is_final: bool,
    body: Vec<u8>,
    extra: HashMap<String, String>,
}

impl Chunk {
    pub(crate) fn new(
        filename: String,
        upload_id: String,
        offset: i64,
        total: i64,
        body: Vec<u8>,
        extra: HashMap<String, String>,
    ) -> Self {
        let is_final = completes_upload(offset, body.len(), total);
        Self {
            filename,
            upload_id,
            offset,
            is_final,
            body,
            extra,
        }
    }

    /// Name of the file being uploaded
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Identifier shared by every chunk of one upload
    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    /// Byte position of this chunk within the full upload
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Whether this chunk reaches the declared total size
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// Chunk payload
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Unrecognized form fields, trimmed
    pub fn extra(&self) -> &HashMap<String, String> {
        &self.extra
    }

    /// Take ownership of the payload
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

/// `offset + len >= total`, saturating instead of overflowing
pub fn completes_upload(offset: i64, len: usize, total: i64) -> bool {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    offset.saturating_add(len) >= total
}

/// How the bytes of a field are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Base-10 signed 64-bit integer
    Integer,
    /// Whitespace-trimmed text
    Text,
    /// Raw bytes
    Payload,
}

/// What a multipart field means for the chunk being assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// Byte offset of the chunk
    Offset,
    /// Declared total upload size
    Total,
    /// Upload identifier
    UploadId,
    /// Explicit file name
    Filename,
    /// Chunk payload
    File,
    /// Anything else, kept in [`Chunk::extra`]
    Extra,
}

impl FieldRole {
    /// Classify a field name against the configured names
    pub fn classify(name: &str, config: &UploadConfig) -> Self {
        if name == config.offset_field {
            FieldRole::Offset
        } else if name == config.total_field {
            FieldRole::Total
        } else if name == config.upload_id_field {
            FieldRole::UploadId
        } else if config.filename_field.as_deref() == Some(name) {
            FieldRole::Filename
        } else if name == config.file_field {
            FieldRole::File
        } else {
            FieldRole::Extra
        }
    }

    /// Interpretation applied to fields with this role
    pub fn kind(self) -> FieldKind {
        match self {
            FieldRole::Offset | FieldRole::Total => FieldKind::Integer,
            FieldRole::UploadId | FieldRole::Filename | FieldRole::Extra => FieldKind::Text,
            FieldRole::File => FieldKind::Payload,
        }
    }
}
