/// Caption Pipeline
///
/// Extracts timed caption transcripts for YouTube videos by driving yt-dlp
/// through an ordered set of fallback strategies.

pub mod captions;
pub mod config;
pub mod error;
pub mod identifier;
pub mod logging;
pub mod pipeline;
pub mod probe;
pub mod scratch;
pub mod strategies;
pub mod transcript;
pub mod ytdlp;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{CaptionError, ToolError};
pub use crate::identifier::VideoId;
pub use crate::logging::{AttemptOutcome, AttemptSink, ExtractionAttempt, RecordingSink, TracingSink};
pub use crate::pipeline::TranscriptPipeline;
pub use crate::strategies::{ExtractionStrategy, StrategyContext, StrategyOutcome};
pub use crate::transcript::{CaptionSegment, TranscriptResponse, TranscriptResult, VideoMetadata};
pub use crate::ytdlp::{MediaTool, ToolOutput, YtDlp};

pub use tokio_util::sync::CancellationToken;
