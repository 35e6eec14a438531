//! `data:` URL encoding and decoding.
//!
//! Everything the exporter produces is base64-encoded. Decoding also
//! accepts plain (non-base64) payloads, which are taken verbatim.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Media type assumed when a payload has none.
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// A decoded `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum DataUrlError {
    #[error("not a data URL")]
    NotDataUrl,
    #[error("data URL has no payload separator")]
    MissingPayload,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Encode `bytes` as a base64 `data:` URL. An empty media type becomes
/// [`DEFAULT_MEDIA_TYPE`].
pub fn encode(media_type: &str, bytes: &[u8]) -> String {
    let media_type = media_type.trim();
    let media_type = if media_type.is_empty() {
        DEFAULT_MEDIA_TYPE
    } else {
        media_type
    };
    format!("data:{media_type};base64,{}", STANDARD.encode(bytes))
}

/// Decode a `data:` URL.
///
/// # Errors
///
/// Returns an error if `url` is not a `data:` URL or its base64 payload is
/// malformed.
pub fn decode(url: &str) -> Result<DataUrl, DataUrlError> {
    let rest = url.strip_prefix("data:").ok_or(DataUrlError::NotDataUrl)?;
    let (meta, payload) = rest.split_once(',').ok_or(DataUrlError::MissingPayload)?;

    let (media_type, bytes) = match meta.strip_suffix(";base64") {
        Some(media_type) => (media_type, STANDARD.decode(payload.trim())?),
        None => (meta, payload.as_bytes().to_vec()),
    };

    Ok(DataUrl {
        media_type: media_type.to_string(),
        bytes,
    })
}

/// Whether `href` is a `data:` URL.
pub fn is_data_url(href: &str) -> bool {
    href.starts_with("data:")
}
