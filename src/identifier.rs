//! Canonical video identifier extraction from raw IDs and URLs
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use url::Url;

use crate::error::{CaptionError, Result};

static CANONICAL_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("canonical id regex"));

/// URL shapes tried in order; the first capture group is the identifier
static URL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([A-Za-z0-9_-]{11})",
        r"youtube\.com/watch\?.*v=([A-Za-z0-9_-]{11})",
        r"youtube\.com/(?:shorts|live|v)/([A-Za-z0-9_-]{11})",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("video url regex"))
    .collect()
});

static WATCH_BASE: Lazy<Url> =
    Lazy::new(|| Url::parse("https://www.youtube.com/watch").expect("watch base url"));

/// An 11-character canonical video token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Extract the canonical identifier from a raw ID or any supported URL shape
    pub fn normalize(input: &str) -> Result<Self> {
        let candidate = input.trim();

        if CANONICAL_ID.is_match(candidate) {
            return Ok(Self(candidate.to_string()));
        }

        URL_PATTERNS
            .iter()
            .find_map(|re| re.captures(candidate))
            .and_then(|caps| caps.get(1))
            .map(|id| Self(id.as_str().to_string()))
            .ok_or_else(|| CaptionError::InvalidInput {
                input: input.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Watch page URL handed to the extraction tool
    pub fn watch_url(&self) -> Url {
        let mut url = WATCH_BASE.clone();
        url.query_pairs_mut().append_pair("v", &self.0);
        url
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "dQw4w9WgXcQ";

    #[test]
    fn test_raw_id_is_returned_unchanged() {
        assert_eq!(VideoId::normalize(ID).unwrap().as_str(), ID);
        assert_eq!(VideoId::normalize("a-b_c-d_e-f").unwrap().as_str(), "a-b_c-d_e-f");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in [ID, "https://youtu.be/dQw4w9WgXcQ", "https://www.youtube.com/embed/dQw4w9WgXcQ"] {
            let once = VideoId::normalize(input).unwrap();
            let twice = VideoId::normalize(once.as_str()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_supported_url_shapes() {
        let urls = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?si=abc",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "  https://m.youtube.com/watch?v=dQw4w9WgXcQ  ",
        ];

        for url in urls {
            let id = VideoId::normalize(url).unwrap_or_else(|e| panic!("{url}: {e}"));
            assert_eq!(id.as_str(), ID, "failed for {url}");
        }
    }

    #[test]
    fn test_invalid_input_carries_original() {
        for input in ["", "short", "https://vimeo.com/123456789", "dQw4w9WgXc!", "https://youtu.be/"] {
            match VideoId::normalize(input) {
                Err(CaptionError::InvalidInput { input: carried }) => assert_eq!(carried, input),
                other => panic!("expected InvalidInput for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_watch_url() {
        let id = VideoId::normalize(ID).unwrap();
        assert_eq!(id.watch_url().as_str(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }
}
