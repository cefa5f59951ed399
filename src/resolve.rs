//! Video identifier resolution from heterogeneous URL shapes

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Raised when an input matches none of the known URL shapes.
#[derive(Debug, Error, PartialEq)]
#[error("invalid video reference: {0}")]
pub struct InvalidReference(pub String);

/// Canonical platform-assigned video identifier.
///
/// Only constructed through [`resolve`], so a `VideoId` is always non-empty
/// and charset-clean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// URL markers checked in priority order. The identifier is the span after
/// the marker, cut at the next `&`, `?`, or end of string.
const MARKERS: &[&str] = &["watch?v=", "youtu.be/", "/shorts/"];

fn is_id_charset(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Extract the canonical video identifier from a raw URL or bare id.
///
/// Pure and idempotent: no network access, and resolving an already-resolved
/// identifier returns it unchanged.
pub fn resolve(raw: &str) -> Result<VideoId, InvalidReference> {
    let raw = raw.trim();

    for marker in MARKERS {
        if let Some(pos) = raw.find(marker) {
            let rest = &raw[pos + marker.len()..];
            let id = rest
                .split(|c| c == '&' || c == '?')
                .next()
                .unwrap_or_default();
            if is_id_charset(id) {
                return Ok(VideoId(id.to_string()));
            }
            return Err(InvalidReference(raw.to_string()));
        }
    }

    // The inbound contract accepts a bare identifier as well as a URL.
    if is_id_charset(raw) {
        return Ok(VideoId(raw.to_string()));
    }

    Err(InvalidReference(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_url() {
        let id = resolve("https://www.youtube.com/watch?v=ABC123&t=5").unwrap();
        assert_eq!(id.as_str(), "ABC123");
    }

    #[test]
    fn test_short_link() {
        let id = resolve("https://youtu.be/XYZ987?si=share").unwrap();
        assert_eq!(id.as_str(), "XYZ987");
    }

    #[test]
    fn test_shorts_path() {
        let id = resolve("https://www.youtube.com/shorts/XYZ987?foo=1").unwrap();
        assert_eq!(id.as_str(), "XYZ987");
    }

    #[test]
    fn test_bare_id() {
        let id = resolve("dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_invalid_url() {
        assert!(resolve("https://www.youtube.com/not-a-video").is_err());
        assert!(resolve("").is_err());
        assert!(resolve("https://www.youtube.com/watch?v=").is_err());
    }

    #[test]
    fn test_idempotent() {
        let first = resolve("https://www.youtube.com/watch?v=ABC123&t=5").unwrap();
        let second = resolve(first.as_str()).unwrap();
        assert_eq!(first, second);
    }
}
