//! TTL Policy
//!
//! Maps a response's content type and request path to a cache lifetime.
//! Rules are evaluated in order and the first match wins.

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Lifetime for `image/*`.
pub const IMAGE_TTL: u64 = 30 * DAY;
/// Lifetime for stylesheets and scripts.
pub const ASSET_TTL: u64 = DAY;
/// Lifetime for HTML documents.
pub const HTML_TTL: u64 = HOUR;
/// Lifetime for JSON API responses.
pub const JSON_TTL: u64 = 5 * MINUTE;
/// Lifetime for paths ending in `.pdf`.
pub const PDF_TTL: u64 = 7 * DAY;
/// Lifetime for `video/*`.
pub const VIDEO_TTL: u64 = 90 * DAY;
/// Lifetime when nothing else matches.
pub const DEFAULT_TTL: u64 = HOUR;

/// Returns the cache lifetime in seconds for a response.
///
/// Media type parameters such as `; charset=utf-8` are ignored and the
/// comparison is case-insensitive.
pub fn ttl_for(content_type: &str, path: &str) -> u64 {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if media_type.starts_with("image/") {
        IMAGE_TTL
    } else if media_type == "text/css" || media_type == "application/javascript" {
        ASSET_TTL
    } else if media_type == "text/html" {
        HTML_TTL
    } else if media_type == "application/json" {
        JSON_TTL
    } else if path.ends_with(".pdf") {
        PDF_TTL
    } else if media_type.starts_with("video/") {
        VIDEO_TTL
    } else {
        DEFAULT_TTL
    }
}
