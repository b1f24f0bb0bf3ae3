//! Subtitle format parsers
//!
//! Both parsers turn raw subtitle payloads into ordered [`CaptionSegment`]s.
//! They never re-sort: output order is the order of the source file.

pub mod json3;
pub mod vtt;

pub use json3::parse_event_json;
pub use vtt::{parse_vtt, parse_vtt_str};

use std::path::Path;

use crate::transcript::CaptionSegment;

/// Subtitle serialization requested from the extraction tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionFormat {
    /// Event-timed JSON (`json3`)
    Json3,
    /// WebVTT
    Vtt,
}

impl CaptionFormat {
    /// File extension, also the value passed as the tool's subtitle format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json3 => "json3",
            Self::Vtt => "vtt",
        }
    }

    /// Read and parse a subtitle file in this format
    pub async fn parse_file(&self, path: &Path) -> std::io::Result<Vec<CaptionSegment>> {
        match self {
            Self::Json3 => {
                let bytes = tokio::fs::read(path).await?;
                Ok(parse_event_json(&bytes))
            }
            Self::Vtt => parse_vtt(path).await,
        }
    }
}
