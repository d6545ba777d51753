//! Media type detection.
//!
//! Magic bytes decide first; the file extension is consulted only when
//! the leading bytes are not recognised.

use std::path::Path;

use crate::TransferError;

/// Number of leading bytes inspected by [`sniff_content_type`].
pub const SNIFF_LEN: usize = 512;

/// Type used when detection fails.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Identifies common image and video containers from their leading bytes.
pub fn sniff_content_type(head: &[u8]) -> Option<&'static str> {
    let head = &head[..head.len().min(SNIFF_LEN)];

    if head.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some("image/png");
    }
    if head.starts_with(b"\xff\xd8\xff") {
        return Some("image/jpeg");
    }
    if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if head.starts_with(b"BM") {
        return Some("image/bmp");
    }
    if head.len() >= 12 && &head[..4] == b"RIFF" {
        match &head[8..12] {
            b"WEBP" => return Some("image/webp"),
            b"AVI " => return Some("video/avi"),
            _ => {}
        }
    }
    if head.starts_with(b"\x1a\x45\xdf\xa3") {
        return Some("video/webm");
    }
    if head.len() >= 12 && &head[4..8] == b"ftyp" {
        return match &head[8..12] {
            b"qt  " => Some("video/quicktime"),
            _ => Some("video/mp4"),
        };
    }
    None
}

/// Detects the content type from `head`, falling back to the extension of
/// `path`.
pub fn detect_content_type(head: &[u8], path: Option<&Path>) -> Result<String, TransferError> {
    if let Some(ct) = sniff_content_type(head) {
        return Ok(ct.to_string());
    }

    if let Some(path) = path
        && let Some(mime) = mime_guess::from_path(path).first()
    {
        return Ok(mime.essence_str().to_string());
    }

    Err(TransferError::UnknownContentType(
        path.map(|p| p.display().to_string())
            .unwrap_or_else(|| "<stream>".into()),
    ))
}
