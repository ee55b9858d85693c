//! Object naming for uploaded images.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};

use crate::StorageError;

/// Characters left unescaped inside a single path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const KNOWN_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "avif", "svg"];

/// Picks a file extension for an image, preferring the response content type
/// and falling back to the source URL, then `jpg`.
#[must_use]
pub fn extension_for(content_type: Option<&str>, source_url: &str) -> String {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());

    let from_mime = match mime.as_deref() {
        Some("image/jpeg" | "image/jpg" | "image/pjpeg") => Some("jpg"),
        Some("image/png") => Some("png"),
        Some("image/webp") => Some("webp"),
        Some("image/gif") => Some("gif"),
        Some("image/avif") => Some("avif"),
        Some("image/svg+xml") => Some("svg"),
        _ => None,
    };
    if let Some(ext) = from_mime {
        return ext.to_string();
    }

    let path = source_url
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let last_segment = path.rsplit('/').next().unwrap_or_default();
    match last_segment
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
    {
        Some(ext) if ext == "jpeg" => "jpg".to_string(),
        Some(ext) if KNOWN_EXTENSIONS.contains(&ext.as_str()) => ext,
        _ => "jpg".to_string(),
    }
}

/// Deterministic object file name for an image downloaded from `source_url`:
/// the first 16 hex characters of its SHA-256 plus the extension.
///
/// Re-importing the same URL for the same product overwrites the same object
/// instead of accumulating copies.
#[must_use]
pub fn object_name(source_url: &str, extension: &str) -> String {
    let digest = Sha256::digest(source_url.trim().as_bytes());
    let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    format!("{hex}.{extension}")
}

/// Validates a `/`-separated object path and percent-encodes each segment.
pub(crate) fn encode_object_path(path: &str) -> Result<String, StorageError> {
    let invalid = |reason: &str| StorageError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.is_empty() {
        return Err(invalid("path is empty"));
    }
    if path.starts_with('/') {
        return Err(invalid("path must be relative to the bucket"));
    }

    let mut encoded = Vec::new();
    for segment in path.split('/') {
        if segment.is_empty() {
            return Err(invalid("path contains an empty segment"));
        }
        if segment == "." || segment == ".." {
            return Err(invalid("path contains a relative segment"));
        }
        encoded.push(utf8_percent_encode(segment, SEGMENT).to_string());
    }
    Ok(encoded.join("/"))
}
