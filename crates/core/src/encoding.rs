//! Decoding raw response bytes into HTML text.
//!
//! The fetch step hands over bytes and, for HTTP, the declared Content-Type.
//! This module decides whether those bytes are markup at all and, if so,
//! decodes them to UTF-8. Charset resolution order: the Content-Type header,
//! then `<meta charset>` / `http-equiv` declarations, then UTF-8.

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;

use crate::{Result, Web2mdError};

/// Bytes inspected when sniffing for binary content and charset declarations.
const SNIFF_LEN: usize = 1024;

static CHARSET_META_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s>;]+)"#).expect("valid regex"));

static CONTENT_TYPE_CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).expect("valid regex"));

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[A-Za-z!/?]").expect("valid regex"));

/// Magic numbers of formats that show up behind article URLs but are never HTML.
const BINARY_SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG", "PNG image"),
    (b"\xFF\xD8\xFF", "JPEG image"),
    (b"GIF8", "GIF image"),
    (b"%PDF", "PDF document"),
    (b"PK\x03\x04", "ZIP archive"),
    (b"\x1F\x8B", "gzip data"),
    (b"RIFF", "RIFF media"),
];

/// Returns `true` if a declared media type can carry markup.
///
/// `text/*` and anything mentioning html or xml qualifies. A missing
/// Content-Type is left to byte sniffing.
pub fn is_markup_media_type(content_type: &str) -> bool {
    let media_type = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    media_type.starts_with("text/") || media_type.contains("html") || media_type.contains("xml")
}

/// Identify binary payloads from their first bytes.
///
/// Returns a short description of what the bytes look like, or `None` when
/// they could be text.
pub fn sniff_binary(bytes: &[u8]) -> Option<&'static str> {
    let head = &bytes[..bytes.len().min(SNIFF_LEN)];

    for (signature, name) in BINARY_SIGNATURES {
        if head.starts_with(signature) {
            return Some(name);
        }
    }

    // UTF-16 text is full of NUL bytes
    let utf16_bom = head.starts_with(b"\xFF\xFE") || head.starts_with(b"\xFE\xFF");
    if !utf16_bom && head.contains(&0) {
        return Some("binary data");
    }

    None
}

/// Pick the encoding for a document.
pub fn detect_encoding(bytes: &[u8], content_type: Option<&str>) -> &'static Encoding {
    if let Some(content_type) = content_type
        && let Some(caps) = CONTENT_TYPE_CHARSET_RE.captures(content_type)
        && let Some(encoding) = Encoding::for_label(caps[1].as_bytes())
    {
        return encoding;
    }

    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(SNIFF_LEN)]);
    // a meta tag that could be read as ASCII cannot really be UTF-16
    if let Some(caps) = CHARSET_META_RE.captures(&head)
        && let Some(encoding) = Encoding::for_label(caps[1].as_bytes())
    {
        return encoding.output_encoding();
    }

    UTF_8
}

/// Decode raw bytes into HTML text, rejecting anything that is not markup.
///
/// # Errors
///
/// Returns [`Web2mdError::NotMarkup`] when the Content-Type is not a markup
/// type, when the bytes look binary, or when the decoded text has no tags.
pub fn decode_markup(bytes: &[u8], content_type: Option<&str>) -> Result<String> {
    if let Some(content_type) = content_type
        && !is_markup_media_type(content_type)
    {
        return Err(Web2mdError::NotMarkup(format!("unsupported content type {content_type}")));
    }

    if let Some(kind) = sniff_binary(bytes) {
        return Err(Web2mdError::NotMarkup(format!("response body is {kind}")));
    }

    let encoding = detect_encoding(bytes, content_type);
    // decode() also honours a byte order mark over the detected label
    let (text, used, had_errors) = encoding.decode(bytes);
    tracing::debug!(encoding = used.name(), had_errors, bytes = bytes.len(), "decoded document");

    if !TAG_RE.is_match(&text) {
        return Err(Web2mdError::NotMarkup("no markup tags found".to_string()));
    }

    Ok(text.into_owned())
}
