use std::path::PathBuf;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, CaptionError>;

/// Errors surfaced to callers of the transcript pipeline.
///
/// Per-strategy failures never show up here; they are folded into
/// [`crate::strategies::StrategyOutcome`] and only logged.
#[derive(thiserror::Error, Debug)]
pub enum CaptionError {
    #[error("Invalid YouTube URL or video ID: {input}")]
    InvalidInput { input: String },

    #[error("Failed to fetch video metadata for {video_id}: {reason}")]
    MetadataFetchFailed { video_id: String, reason: String },

    #[error(
        "Unable to fetch captions for video {video_id}. Possible causes: \
         1) the video has no captions 2) captions are disabled 3) the video is not accessible"
    )]
    NoCaptionsAvailable { video_id: String },

    #[error("Transcript request for {video_id} was cancelled")]
    Cancelled { video_id: String },

    #[error("Cannot create scratch directory under {root}: {source}")]
    Scratch {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CaptionError {
    /// Stable error code for wire responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::MetadataFetchFailed { .. } => "METADATA_FETCH_FAILED",
            Self::NoCaptionsAvailable { .. } => "NO_CAPTIONS",
            Self::Cancelled { .. } => "CANCELLED",
            Self::Scratch { .. } => "INTERNAL",
        }
    }

    /// Whether the caller sent something unusable (as opposed to a service-side failure)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}

/// Errors from a single external tool invocation
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("Failed to spawn {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Tool invocation cancelled")]
    Cancelled,

    #[error("IO error while waiting for tool: {0}")]
    Io(#[from] std::io::Error),
}
