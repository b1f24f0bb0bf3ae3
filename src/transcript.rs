use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identifier::VideoId;

/// One timed unit of speech
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptionSegment {
    /// Start offset, `HH:MM:SS`
    pub start: String,
    /// End offset, `HH:MM:SS`
    pub end: String,
    /// Caption text, trimmed and free of markup
    pub text: String,
}

impl CaptionSegment {
    pub fn new(start: impl Into<String>, end: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            text: text.into().trim().to_string(),
        }
    }
}

impl fmt::Display for CaptionSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.start, self.text)
    }
}

/// Video metadata, fetched once per pipeline call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VideoMetadata {
    pub title: String,
    pub uploader: String,
    pub duration_seconds: u64,
}

/// Successful pipeline output
#[derive(Debug, Clone)]
pub struct TranscriptResult {
    video_id: VideoId,
    metadata: VideoMetadata,
    segments: Vec<CaptionSegment>,
    duration: String,
    strategy: &'static str,
    fetched_at: DateTime<Utc>,
}

impl TranscriptResult {
    pub fn new(
        video_id: VideoId,
        metadata: VideoMetadata,
        segments: Vec<CaptionSegment>,
        strategy: &'static str,
    ) -> Self {
        let duration = format_duration(metadata.duration_seconds);
        Self {
            video_id,
            metadata,
            segments,
            duration,
            strategy,
            fetched_at: Utc::now(),
        }
    }

    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    pub fn segments(&self) -> &[CaptionSegment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<CaptionSegment> {
        self.segments
    }

    /// Formatted total duration (`HH:MM:SS`, or `MM:SS` under an hour)
    pub fn duration(&self) -> &str {
        &self.duration
    }

    /// Name of the strategy that produced the segments
    pub fn strategy(&self) -> &'static str {
        self.strategy
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Wire representation handed to request handlers
    pub fn to_response(&self) -> TranscriptResponse {
        TranscriptResponse {
            video_id: self.video_id.to_string(),
            title: self.metadata.title.clone(),
            author: self.metadata.uploader.clone(),
            duration: self.duration.clone(),
            transcripts: self.segments.clone(),
            strategy: self.strategy.to_string(),
            fetched_at: self.fetched_at,
        }
    }

    /// Plain text, one `[HH:MM:SS] text` line per segment
    pub fn to_text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// SubRip rendering; sub-second precision is not available so milliseconds are zero
    pub fn to_srt(&self) -> String {
        let mut srt_content = String::new();

        for (i, segment) in self.segments.iter().enumerate() {
            srt_content.push_str(&format!(
                "{}\n{},000 --> {},000\n{}\n\n",
                i + 1,
                segment.start,
                segment.end,
                segment.text
            ));
        }

        srt_content
    }
}

/// JSON body returned to API clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptResponse {
    pub video_id: String,
    pub title: String,
    pub author: String,
    pub duration: String,
    pub transcripts: Vec<CaptionSegment>,
    pub strategy: String,
    pub fetched_at: DateTime<Utc>,
}

/// Milliseconds to `HH:MM:SS`, truncating to whole seconds
pub fn format_timestamp(ms: u64) -> String {
    let seconds = ms / 1000;
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Seconds to `HH:MM:SS`, or `MM:SS` when shorter than an hour
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> TranscriptResult {
        TranscriptResult::new(
            VideoId::normalize("dQw4w9WgXcQ").unwrap(),
            VideoMetadata {
                title: "Test video".to_string(),
                uploader: "Uploader".to_string(),
                duration_seconds: 212,
            },
            vec![
                CaptionSegment::new("00:00:00", "00:00:02", "first line"),
                CaptionSegment::new("00:00:02", "00:00:05", "second line"),
            ],
            "auto-json3",
        )
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(59), "00:59");
        assert_eq!(format_duration(60), "01:00");
        assert_eq!(format_duration(3599), "59:59");
        assert_eq!(format_duration(3600), "01:00:00");
        assert_eq!(format_duration(3661), "01:01:01");
    }

    #[test]
    fn test_format_timestamp_truncates() {
        assert_eq!(format_timestamp(0), "00:00:00");
        assert_eq!(format_timestamp(1999), "00:00:01");
        assert_eq!(format_timestamp(3_661_000), "01:01:01");
        assert_eq!(format_timestamp(36_000_500), "10:00:00");
    }

    #[test]
    fn test_segment_text_is_trimmed() {
        let segment = CaptionSegment::new("00:00:01", "00:00:02", "  hello \n");
        assert_eq!(segment.text, "hello");
    }

    #[test]
    fn test_result_duration_and_response() {
        let result = sample_result();
        assert_eq!(result.duration(), "03:32");

        let json = serde_json::to_value(result.to_response()).unwrap();
        assert_eq!(json["videoId"], "dQw4w9WgXcQ");
        assert_eq!(json["author"], "Uploader");
        assert_eq!(json["duration"], "03:32");
        assert_eq!(json["transcripts"][1]["text"], "second line");
        assert_eq!(json["strategy"], "auto-json3");
        assert!(json.get("fetchedAt").is_some());
    }

    #[test]
    fn test_text_and_srt_rendering() {
        let result = sample_result();
        assert_eq!(result.to_text(), "[00:00:00] first line\n[00:00:02] second line");

        let srt = result.to_srt();
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:02,000\nfirst line\n\n"));
        assert!(srt.contains("2\n00:00:02,000 --> 00:00:05,000\nsecond line"));
    }
}
