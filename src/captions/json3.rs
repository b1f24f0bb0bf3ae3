use serde::Deserialize;
use tracing::warn;

use crate::transcript::{format_timestamp, CaptionSegment};

const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct EventDocument {
    #[serde(default)]
    events: Vec<CaptionEvent>,
}

#[derive(Debug, Deserialize)]
struct CaptionEvent {
    #[serde(rename = "tStartMs", default)]
    start_ms: i64,
    #[serde(rename = "dDurationMs", default)]
    duration_ms: i64,
    #[serde(default)]
    segs: Option<Vec<TextFragment>>,
}

#[derive(Debug, Deserialize)]
struct TextFragment {
    #[serde(default)]
    utf8: Option<String>,
}

/// Parse the event-timed JSON caption format.
///
/// Structural problems are logged and produce an empty list; this never fails.
pub fn parse_event_json(bytes: &[u8]) -> Vec<CaptionSegment> {
    let raw = String::from_utf8_lossy(bytes);
    let raw = raw.trim();

    // The tool occasionally wraps the document in extra text
    let body = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end > start => &raw[start..=end],
        _ => {
            warn!(preview = %preview(raw), "No JSON object found in caption payload");
            return Vec::new();
        }
    };

    let document: EventDocument = match serde_json::from_str(body) {
        Ok(document) => document,
        Err(e) => {
            warn!(error = %e, preview = %preview(body), "Failed to parse event-timed caption JSON");
            return Vec::new();
        }
    };

    if document.events.is_empty() {
        warn!("No events found in caption JSON");
        return Vec::new();
    }

    let mut segments = Vec::with_capacity(document.events.len());

    for event in &document.events {
        let fragments = match &event.segs {
            Some(fragments) if !fragments.is_empty() => fragments,
            _ => continue,
        };

        let text: String = fragments
            .iter()
            .filter_map(|fragment| fragment.utf8.as_deref())
            .collect();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let start_ms = event.start_ms.max(0) as u64;
        let end_ms = start_ms + event.duration_ms.max(0) as u64;

        segments.push(CaptionSegment::new(
            format_timestamp(start_ms),
            format_timestamp(end_ms),
            text,
        ));
    }

    segments
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
