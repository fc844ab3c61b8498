//! Field decoding for single multipart parts
//!
//! Each part is read until it ends or until its byte ceiling is exceeded. A part that
//! overruns its ceiling is an error, never a silent truncation.

use crate::error::FieldError;
use crate::types::FieldKind;
use axum::body::Bytes;
use futures::{Stream, StreamExt};

/// Read a whole part into memory, failing once more than `limit` bytes arrive
///
/// `kind` only selects the error reported on overrun: payloads fail with
/// [`FieldError::OversizedChunk`], metadata fields with [`FieldError::Malformed`].
pub async fn read_bounded<S, E>(part: S, limit: usize, kind: FieldKind) -> Result<Vec<u8>, FieldError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    futures::pin_mut!(part);

    let mut buf = Vec::new();
    while let Some(next) = part.next().await {
        let bytes = next.map_err(|e| FieldError::ReadFailure(Box::new(e)))?;
        if buf.len() + bytes.len() > limit {
            return Err(match kind {
                FieldKind::Payload => FieldError::OversizedChunk { limit },
                FieldKind::Integer | FieldKind::Text => {
                    FieldError::Malformed(format!("value exceeds {limit} bytes"))
                }
            });
        }
        buf.extend_from_slice(&bytes);
    }

    Ok(buf)
}

/// Decode a part as a base-10 signed 64-bit integer
pub async fn decode_integer<S, E>(part: S, limit: usize) -> Result<i64, FieldError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let raw = read_bounded(part, limit, FieldKind::Integer).await?;
    parse_integer(&raw)
}

/// Decode a part as text with surrounding whitespace removed
///
/// Invalid UTF-8 is replaced rather than rejected; only read failures and overruns fail.
pub async fn decode_text<S, E>(part: S, limit: usize) -> Result<String, FieldError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let raw = read_bounded(part, limit, FieldKind::Text).await?;
    Ok(String::from_utf8_lossy(&raw).trim().to_string())
}

/// Collect a part's raw bytes, possibly spread over many reads
pub async fn decode_payload<S, E>(part: S, limit: usize) -> Result<Vec<u8>, FieldError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    read_bounded(part, limit, FieldKind::Payload).await
}

fn parse_integer(raw: &[u8]) -> Result<i64, FieldError> {
    let text = std::str::from_utf8(raw)
        .map_err(|_| FieldError::Malformed("value is not valid UTF-8".to_string()))?;
    text.parse::<i64>()
        .map_err(|e| FieldError::Malformed(e.to_string()))
}
