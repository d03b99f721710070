//! Image blob to base64 encoding.

use crate::error::Result;
use async_trait::async_trait;
use base64::Engine;

/// Turns an image blob into the base64 string sent to the generator.
///
/// A trait so a caller can substitute, say, an encoder that downsizes large
/// photos before upload, without touching the studio.
#[async_trait]
pub trait ImageEncoder: Send + Sync {
    /// Encodes the blob as base64 (no data-URI prefix).
    async fn encode(&self, blob: &[u8]) -> Result<String>;
}

/// Standard padded base64.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Encoder;

#[async_trait]
impl ImageEncoder for Base64Encoder {
    async fn encode(&self, blob: &[u8]) -> Result<String> {
        Ok(encode_base64(blob))
    }
}

/// Encodes bytes with the standard padded alphabet.
pub fn encode_base64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Decodes a base64 string that may be imperfectly formatted.
///
/// Accepts a data URI prefix (`data:image/png;base64,...`), embedded
/// whitespace and missing `=` padding.
pub fn decode_base64_lenient(input: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let b64 = match input.find(";base64,") {
        Some(pos) => &input[pos + 8..],
        None => input,
    };

    let cleaned: String = b64.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
        return Ok(data);
    }

    base64::engine::general_purpose::STANDARD_NO_PAD.decode(cleaned.trim_end_matches('='))
}
