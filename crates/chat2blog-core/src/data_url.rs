//! Base64 `data:` URLs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chat2blog_beeper::MediaBlob;

use crate::error::{Error, Result};

/// Encodes a blob as `data:<mime>;base64,<payload>`.
#[must_use]
pub fn encode(blob: &MediaBlob) -> String {
    format!("data:{};base64,{}", blob.mime_type(), STANDARD.encode(&blob.bytes))
}

/// Decodes a base64 `data:` URL into a blob.
///
/// # Errors
///
/// Returns [`Error::InvalidDataUrl`] if the URL is not a base64 data URL or
/// the payload does not decode.
pub fn decode(url: &str) -> Result<MediaBlob> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| Error::InvalidDataUrl("missing data: prefix".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::InvalidDataUrl("missing payload".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| Error::InvalidDataUrl("only base64 payloads are supported".to_string()))?;
    let mime = if mime.is_empty() {
        chat2blog_beeper::media::OCTET_STREAM
    } else {
        mime
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::InvalidDataUrl(e.to_string()))?;

    Ok(MediaBlob::new(bytes, mime))
}
