//! yt-dlp invocation: process runner, argument builders and metadata lookup
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::captions::CaptionFormat;
use crate::config::ToolConfig;
use crate::error::{CaptionError, ToolError};
use crate::identifier::VideoId;
use crate::transcript::VideoMetadata;

/// Output naming handed to the tool; `{dir}/` is prepended per invocation
pub const OUTPUT_TEMPLATE: &str = "%(id)s.%(lang)s.%(ext)s";

/// Flags shared by every subtitle-producing invocation
pub const COMMON_ARGS: [&str; 3] = ["--skip-download", "--no-warnings", "--no-playlist"];

const STDERR_EXCERPT_CHARS: usize = 300;

/// Captured result of one finished tool process
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// An external media tool that can be run with an argument list.
///
/// Implementations must stop promptly once `cancel` fires and report
/// [`ToolError::Cancelled`].
#[async_trait]
pub trait MediaTool: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, args: &[String], cancel: &CancellationToken) -> Result<ToolOutput, ToolError>;
}

/// yt-dlp executed as a child process
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
    extra_args: Vec<String>,
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            extra_args: Vec::new(),
        }
    }

    pub fn from_config(config: &ToolConfig) -> Self {
        Self::new(config.binary.clone()).with_extra_args(config.extra_args.clone())
    }

    /// Arguments placed before every invocation's own arguments
    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Report the tool's version string, used to check the installation
    pub async fn version(&self, cancel: &CancellationToken) -> Result<String, ToolError> {
        let output = self.run(&["--version".to_string()], cancel).await?;
        Ok(output.stdout.trim().to_string())
    }
}

#[async_trait]
impl MediaTool for YtDlp {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn run(&self, args: &[String], cancel: &CancellationToken) -> Result<ToolOutput, ToolError> {
        if cancel.is_cancelled() {
            return Err(ToolError::Cancelled);
        }

        let mut cmd = Command::new(&self.binary);
        cmd.args(&self.extra_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Executing command: {:?}", cmd);

        let child = cmd.spawn().map_err(|source| ToolError::Spawn {
            binary: self.binary.display().to_string(),
            source,
        })?;

        let started = Instant::now();

        // Dropping the wait future drops the child, which kills it
        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("🛑 {} cancelled after {:.1}s", self.name(), started.elapsed().as_secs_f64());
                return Err(ToolError::Cancelled);
            }
            output = child.wait_with_output() => output?,
        };

        let result = ToolOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!(
            "{} exited with {:?} in {:.1}s",
            self.name(),
            result.exit_code,
            started.elapsed().as_secs_f64()
        );

        Ok(result)
    }
}

/// Which subtitle track family to request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleKind {
    /// Automatically generated captions
    Auto,
    /// Uploader-provided subtitles
    Manual,
}

impl SubtitleKind {
    pub fn flag(&self) -> &'static str {
        match self {
            Self::Auto => "--write-auto-sub",
            Self::Manual => "--write-subs",
        }
    }
}

/// Arguments for a subtitle download into `output_dir`.
///
/// `languages` is passed verbatim to `--sub-lang` (comma separated).
pub fn subtitle_args(
    video: &VideoId,
    kind: SubtitleKind,
    languages: &str,
    format: CaptionFormat,
    output_dir: &Path,
) -> Vec<String> {
    let mut args = vec![
        kind.flag().to_string(),
        "--sub-lang".to_string(),
        languages.to_string(),
        "--sub-format".to_string(),
        format.extension().to_string(),
    ];
    args.extend(COMMON_ARGS.iter().map(|arg| arg.to_string()));
    args.push("--output".to_string());
    args.push(output_dir.join(OUTPUT_TEMPLATE).display().to_string());
    args.push(video.watch_url().to_string());
    args
}

/// Arguments for a single JSON metadata dump
pub fn metadata_args(video: &VideoId) -> Vec<String> {
    vec![
        "--dump-json".to_string(),
        "--no-warnings".to_string(),
        "--skip-download".to_string(),
        "--no-playlist".to_string(),
        video.watch_url().to_string(),
    ]
}

/// Arguments for listing available subtitle tracks
pub fn list_subs_args(video: &VideoId) -> Vec<String> {
    vec![
        "--list-subs".to_string(),
        "--skip-download".to_string(),
        "--no-warnings".to_string(),
        "--no-playlist".to_string(),
        video.watch_url().to_string(),
    ]
}

#[derive(Debug, Deserialize)]
struct DumpJson {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

/// Fetch title, uploader and duration. Missing fields become empty values.
pub async fn fetch_metadata(
    tool: &dyn MediaTool,
    video: &VideoId,
    cancel: &CancellationToken,
) -> Result<VideoMetadata, CaptionError> {
    info!("🔍 Fetching metadata for {}", video);

    let output = tool
        .run(&metadata_args(video), cancel)
        .await
        .map_err(|e| match e {
            ToolError::Cancelled => CaptionError::Cancelled {
                video_id: video.to_string(),
            },
            other => CaptionError::MetadataFetchFailed {
                video_id: video.to_string(),
                reason: other.to_string(),
            },
        })?;

    if !output.success {
        return Err(CaptionError::MetadataFetchFailed {
            video_id: video.to_string(),
            reason: failure_reason(&output),
        });
    }

    // One JSON object per line; a single video yields exactly one
    let line = output
        .stdout
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with('{'))
        .unwrap_or_default();

    let dump: DumpJson = serde_json::from_str(line).map_err(|e| CaptionError::MetadataFetchFailed {
        video_id: video.to_string(),
        reason: format!("invalid metadata JSON: {}", e),
    })?;

    let metadata = VideoMetadata {
        title: dump.title.unwrap_or_default(),
        uploader: dump.uploader.unwrap_or_default(),
        duration_seconds: dump
            .duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| d as u64)
            .unwrap_or(0),
    };

    info!(
        "✅ Metadata: \"{}\" by {} ({}s)",
        metadata.title, metadata.uploader, metadata.duration_seconds
    );

    Ok(metadata)
}

/// Short human-readable reason for a failed invocation
pub fn failure_reason(output: &ToolOutput) -> String {
    let stderr = output.stderr.trim();
    let status = match output.exit_code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    };

    if stderr.is_empty() {
        status
    } else {
        let excerpt: String = stderr.chars().take(STDERR_EXCERPT_CHARS).collect();
        format!("{}: {}", status, excerpt)
    }
}
