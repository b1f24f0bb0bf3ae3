use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::transcript::CaptionSegment;

/// `HH:MM:SS.mmm --> HH:MM:SS.mmm`, capturing the whole-second parts
static CUE_TIMING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}:\d{2}:\d{2})\.\d{3}\s*-->\s*(\d{2}:\d{2}:\d{2})\.\d{3}")
        .expect("cue timing regex")
});

static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("markup regex"));

static SEQUENCE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("sequence regex"));

const HEADER_PREFIXES: [&str; 3] = ["WEBVTT", "Kind:", "Language:"];

/// Parse a WebVTT file. Only an unreadable file is an error.
pub async fn parse_vtt(path: &Path) -> std::io::Result<Vec<CaptionSegment>> {
    let bytes = tokio::fs::read(path).await?;
    Ok(parse_vtt_str(&String::from_utf8_lossy(&bytes)))
}

struct OpenCue {
    start: String,
    end: String,
    text: String,
}

impl OpenCue {
    fn flush_into(self, segments: &mut Vec<CaptionSegment>) {
        if !self.text.is_empty() {
            segments.push(CaptionSegment::new(self.start, self.end, self.text));
        }
    }
}

/// Parse WebVTT text. Malformed content degrades to fewer segments.
pub fn parse_vtt_str(content: &str) -> Vec<CaptionSegment> {
    let mut segments = Vec::new();
    let mut cue: Option<OpenCue> = None;

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || HEADER_PREFIXES.iter().any(|prefix| line.starts_with(prefix)) {
            continue;
        }

        if let Some(caps) = CUE_TIMING.captures(line) {
            if let Some(previous) = cue.take() {
                previous.flush_into(&mut segments);
            }
            cue = Some(OpenCue {
                start: caps[1].to_string(),
                end: caps[2].to_string(),
                text: String::new(),
            });
            continue;
        }

        // Text before the first cue (NOTE, STYLE blocks) has nowhere to go
        let Some(open) = cue.as_mut() else {
            continue;
        };

        if SEQUENCE_NUMBER.is_match(line) {
            continue;
        }

        let text = strip_markup(line);
        if text.is_empty() {
            continue;
        }
        if !open.text.is_empty() {
            open.text.push(' ');
        }
        open.text.push_str(&text);
    }

    if let Some(last) = cue {
        last.flush_into(&mut segments);
    }

    segments
}

/// Remove inline markup such as `<c>`, `<i>` and karaoke timestamps
fn strip_markup(text: &str) -> String {
    MARKUP_TAG.replace_all(text, "").trim().to_string()
}
