//! Caption extraction strategies, tried in order by the pipeline.
//!
//! Each strategy drives the extraction tool into the scratch directory and then
//! looks for the files it is expected to have written. A strategy never fails
//! the whole request; its outcome only tells the pipeline whether to move on.

pub mod auto_json3;
pub mod auto_vtt;
pub mod discovery;
pub mod manual;

pub use auto_json3::AutoJson3Strategy;
pub use auto_vtt::AutoVttStrategy;
pub use discovery::{parse_available_languages, DiscoveryStrategy};
pub use manual::ManualSubsStrategy;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::captions::CaptionFormat;
use crate::config::LanguageConfig;
use crate::error::ToolError;
use crate::identifier::VideoId;
use crate::logging::{AttemptOutcome, AttemptSink, ExtractionAttempt};
use crate::probe::{self, FilenamePattern};
use crate::transcript::CaptionSegment;
use crate::ytdlp::{self, MediaTool, SubtitleKind, ToolOutput};

/// Result of one strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// At least one segment was extracted
    Success(Vec<CaptionSegment>),
    /// The tool ran but no usable file was found
    NoResult,
    /// The tool could not be run or reported failure
    ToolError(String),
    /// The request was cancelled while this strategy was running
    Cancelled,
}

impl StrategyOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::NoResult => "no-result",
            Self::ToolError(_) => "tool-error",
            Self::Cancelled => "cancelled",
        }
    }
}

#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, ctx: &StrategyContext<'_>) -> StrategyOutcome;
}

/// Why a single invocation produced nothing to probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationFailure {
    Tool(String),
    Cancelled,
}

impl From<InvocationFailure> for StrategyOutcome {
    fn from(failure: InvocationFailure) -> Self {
        match failure {
            InvocationFailure::Tool(reason) => Self::ToolError(reason),
            InvocationFailure::Cancelled => Self::Cancelled,
        }
    }
}

impl From<&InvocationFailure> for AttemptOutcome {
    fn from(failure: &InvocationFailure) -> Self {
        match failure {
            InvocationFailure::Tool(reason) => Self::ToolError(reason.clone()),
            InvocationFailure::Cancelled => Self::Cancelled,
        }
    }
}

/// Everything a strategy needs for one request
pub struct StrategyContext<'a> {
    pub video_id: &'a VideoId,
    pub tool: &'a dyn MediaTool,
    pub scratch_dir: &'a Path,
    pub languages: &'a LanguageConfig,
    pub sink: &'a dyn AttemptSink,
    pub cancel: &'a CancellationToken,
    /// 1-based position in the fallback order
    pub strategy_index: usize,
}

impl StrategyContext<'_> {
    /// Run the tool; a non-zero exit counts as a failure
    pub async fn invoke(&self, args: &[String]) -> Result<ToolOutput, InvocationFailure> {
        match self.tool.run(args, self.cancel).await {
            Ok(output) if output.success => Ok(output),
            Ok(output) => Err(InvocationFailure::Tool(ytdlp::failure_reason(&output))),
            Err(ToolError::Cancelled) => Err(InvocationFailure::Cancelled),
            Err(e) => Err(InvocationFailure::Tool(e.to_string())),
        }
    }

    /// Ask the tool to write subtitles for `languages` (comma separated) into the scratch directory
    pub async fn request_subtitles(
        &self,
        kind: SubtitleKind,
        languages: &str,
        format: CaptionFormat,
    ) -> Result<(), InvocationFailure> {
        let args = ytdlp::subtitle_args(self.video_id, kind, languages, format, self.scratch_dir);
        self.invoke(&args).await?;

        debug!(
            "Scratch contents after {} request: {:?}",
            languages,
            probe::list_produced_files(self.scratch_dir)
        );
        Ok(())
    }

    pub fn record(
        &self,
        strategy: &'static str,
        language: Option<&str>,
        probed: Vec<PathBuf>,
        outcome: AttemptOutcome,
        started: Instant,
    ) {
        self.sink.record(&ExtractionAttempt {
            strategy_index: self.strategy_index,
            strategy,
            language: language.map(str::to_string),
            probed,
            outcome,
            elapsed: started.elapsed(),
        });
    }
}

/// One VTT request per language, probing `patterns` after each successful invocation.
///
/// Failed invocations move on to the next language. Returns `ToolError` only
/// when no invocation succeeded at all.
pub(crate) async fn per_language_vtt(
    ctx: &StrategyContext<'_>,
    strategy: &'static str,
    kind: SubtitleKind,
    languages: &[String],
    patterns: &[FilenamePattern],
) -> StrategyOutcome {
    let mut last_failure = None;
    let mut any_invocation_succeeded = false;

    for lang in languages {
        if ctx.cancel.is_cancelled() {
            return StrategyOutcome::Cancelled;
        }

        let started = Instant::now();

        if let Err(failure) = ctx.request_subtitles(kind, lang, CaptionFormat::Vtt).await {
            ctx.record(strategy, Some(lang), Vec::new(), (&failure).into(), started);
            if failure == InvocationFailure::Cancelled {
                return StrategyOutcome::Cancelled;
            }
            last_failure = Some(failure);
            continue;
        }
        any_invocation_succeeded = true;

        let mut probed = Vec::new();
        let found = probe::probe(
            ctx.scratch_dir,
            ctx.video_id,
            lang,
            CaptionFormat::Vtt,
            patterns,
            &mut probed,
        )
        .await;

        match found {
            Some((_, segments)) => {
                ctx.record(strategy, Some(lang), probed, AttemptOutcome::SegmentsFound(segments.len()), started);
                return StrategyOutcome::Success(segments);
            }
            None => ctx.record(strategy, Some(lang), probed, AttemptOutcome::NotFound, started),
        }
    }

    if ctx.cancel.is_cancelled() {
        return StrategyOutcome::Cancelled;
    }

    match last_failure {
        Some(failure) if !any_invocation_succeeded => failure.into(),
        _ => StrategyOutcome::NoResult,
    }
}

/// The four strategies in fallback order
pub fn default_strategies() -> Vec<Box<dyn ExtractionStrategy>> {
    vec![
        Box::new(AutoJson3Strategy),
        Box::new(AutoVttStrategy),
        Box::new(DiscoveryStrategy),
        Box::new(ManualSubsStrategy),
    ]
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_default_order() {
        let names: Vec<_> = default_strategies().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["auto-json3", "auto-vtt", "discovery", "manual-subs"]);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(StrategyOutcome::NoResult.label(), "no-result");
        assert_eq!(StrategyOutcome::ToolError("x".into()).label(), "tool-error");
        assert_eq!(StrategyOutcome::Cancelled.label(), "cancelled");
        assert_eq!(StrategyOutcome::Success(Vec::new()).label(), "success");
    }

    #[tokio::test]
    async fn test_per_language_skips_failed_invocations() {
        let harness = Harness::new();
        let tool = FakeTool {
            failing_langs: vec!["en".to_string()],
            ..FakeTool::default()
        }
        .with_file("de", "dQw4w9WgXcQ.de.vtt", VTT);

        let languages = vec!["en".to_string(), "de".to_string()];
        let outcome = per_language_vtt(
            &harness.context(&tool),
            "test",
            SubtitleKind::Auto,
            &languages,
            &[FilenamePattern::IdLangExt],
        )
        .await;

        assert!(matches!(outcome, StrategyOutcome::Success(ref s) if s.len() == 1));
        let attempts = harness.sink.attempts();
        assert_eq!(attempts.len(), 2);
        assert!(matches!(attempts[0].outcome, AttemptOutcome::ToolError(_)));
        assert_eq!(attempts[1].outcome, AttemptOutcome::SegmentsFound(1));
    }

    #[tokio::test]
    async fn test_per_language_all_failed_is_tool_error() {
        let harness = Harness::new();
        let tool = FakeTool {
            failing_langs: vec!["en".to_string()],
            ..FakeTool::default()
        };

        let outcome = per_language_vtt(
            &harness.context(&tool),
            "test",
            SubtitleKind::Manual,
            &["en".to_string()],
            &[FilenamePattern::IdLangExt],
        )
        .await;
        assert!(matches!(outcome, StrategyOutcome::ToolError(_)));
    }

    #[tokio::test]
    async fn test_per_language_stops_when_cancelled() {
        let harness = Harness::new();
        harness.cancel.cancel();
        let tool = FakeTool::default();

        let outcome = per_language_vtt(
            &harness.context(&tool),
            "test",
            SubtitleKind::Auto,
            &["en".to_string()],
            &[FilenamePattern::IdLangExt],
        )
        .await;
        assert_eq!(outcome, StrategyOutcome::Cancelled);
        assert!(tool.calls().is_empty());
    }
}
