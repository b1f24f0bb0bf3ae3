use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::config::{Config, LanguageConfig};
use crate::error::{CaptionError, Result};
use crate::identifier::VideoId;
use crate::logging::{AttemptSink, TracingSink};
use crate::scratch::ScratchDir;
use crate::strategies::{default_strategies, ExtractionStrategy, StrategyContext, StrategyOutcome};
use crate::transcript::TranscriptResult;
use crate::ytdlp::{self, MediaTool, YtDlp};

/// Ordered fallback over extraction strategies
pub struct TranscriptPipeline {
    tool: Arc<dyn MediaTool>,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    languages: LanguageConfig,
    scratch_root: Option<PathBuf>,
    sink: Arc<dyn AttemptSink>,
}

impl TranscriptPipeline {
    pub fn new(tool: Arc<dyn MediaTool>, config: &Config) -> Self {
        Self {
            tool,
            strategies: default_strategies(),
            languages: config.languages.clone(),
            scratch_root: config.pipeline.scratch_root.clone(),
            sink: Arc::new(TracingSink),
        }
    }

    /// Pipeline backed by the configured yt-dlp binary
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(YtDlp::from_config(&config.tool)), config)
    }

    pub fn with_strategies(mut self, strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn AttemptSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolve `input` to a video and extract its captions.
    ///
    /// Cancelling `cancel` stops the running tool process and returns
    /// [`CaptionError::Cancelled`].
    pub async fn get_transcript(&self, input: &str, cancel: &CancellationToken) -> Result<TranscriptResult> {
        let video_id = VideoId::normalize(input)?;
        let scratch = ScratchDir::create(self.scratch_root.as_deref(), &video_id)?;

        let span = info_span!(
            "transcript",
            video_id = %video_id,
            invocation_id = %scratch.invocation_id()
        );

        // `scratch` lives until this returns, so every exit path removes it
        self.run_strategies(&video_id, &scratch, cancel).instrument(span).await
    }

    async fn run_strategies(
        &self,
        video_id: &VideoId,
        scratch: &ScratchDir,
        cancel: &CancellationToken,
    ) -> Result<TranscriptResult> {
        let started = Instant::now();
        info!("🚀 Fetching transcript for {}", video_id);

        let metadata = ytdlp::fetch_metadata(self.tool.as_ref(), video_id, cancel).await?;

        let cancelled = || CaptionError::Cancelled {
            video_id: video_id.to_string(),
        };

        for (i, strategy) in self.strategies.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(cancelled());
            }

            let ctx = StrategyContext {
                video_id,
                tool: self.tool.as_ref(),
                scratch_dir: scratch.path(),
                languages: &self.languages,
                sink: self.sink.as_ref(),
                cancel,
                strategy_index: i + 1,
            };

            info!("🔄 Strategy {}/{}: {}", i + 1, self.strategies.len(), strategy.name());

            match strategy.attempt(&ctx).await {
                StrategyOutcome::Success(segments) if !segments.is_empty() => {
                    info!(
                        "🎉 {} segments via {} in {:.1}s",
                        segments.len(),
                        strategy.name(),
                        started.elapsed().as_secs_f64()
                    );
                    return Ok(TranscriptResult::new(
                        video_id.clone(),
                        metadata,
                        segments,
                        strategy.name(),
                    ));
                }
                StrategyOutcome::Cancelled => return Err(cancelled()),
                StrategyOutcome::ToolError(reason) => {
                    warn!("❌ Strategy {} failed: {}", strategy.name(), reason);
                }
                outcome => {
                    warn!("⚠️  Strategy {} finished with {}", strategy.name(), outcome.label());
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        warn!("❌ All {} strategies exhausted for {}", self.strategies.len(), video_id);
        Err(CaptionError::NoCaptionsAvailable {
            video_id: video_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::config::ConfigBuilder;
    use crate::error::ToolError;
    use crate::transcript::CaptionSegment;
    use crate::ytdlp::ToolOutput;

    struct MetadataOnly {
        success: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MediaTool for MetadataOnly {
        fn name(&self) -> &str {
            "metadata-only"
        }

        async fn run(&self, _args: &[String], _cancel: &CancellationToken) -> std::result::Result<ToolOutput, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ToolOutput {
                success: self.success,
                exit_code: Some(if self.success { 0 } else { 1 }),
                stdout: r#"{"title":"T","uploader":"U","duration":3661}"#.to_string(),
                stderr: String::new(),
            })
        }
    }

    struct Counting {
        name: &'static str,
        outcome: StrategyOutcome,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ExtractionStrategy for Counting {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn attempt(&self, _ctx: &StrategyContext<'_>) -> StrategyOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    /// Cancels the token mid-attempt yet reports an ordinary miss
    struct CancelsThenMisses;

    #[async_trait]
    impl ExtractionStrategy for CancelsThenMisses {
        fn name(&self) -> &'static str {
            "cancels"
        }

        async fn attempt(&self, ctx: &StrategyContext<'_>) -> StrategyOutcome {
            ctx.cancel.cancel();
            StrategyOutcome::NoResult
        }
    }

    fn counting(name: &'static str, outcome: StrategyOutcome) -> (Box<dyn ExtractionStrategy>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = Counting {
            name,
            outcome,
            calls: calls.clone(),
        };
        (Box::new(strategy), calls)
    }

    fn pipeline(success: bool, root: &std::path::Path) -> (TranscriptPipeline, Arc<MetadataOnly>) {
        let tool = Arc::new(MetadataOnly {
            success,
            calls: AtomicUsize::new(0),
        });
        let config = ConfigBuilder::new().with_scratch_root(root).build();
        (TranscriptPipeline::new(tool.clone(), &config), tool)
    }

    #[tokio::test]
    async fn test_first_success_stops_fallback() {
        let root = tempfile::TempDir::new().unwrap();
        let (first, first_calls) = counting(
            "one",
            StrategyOutcome::Success(vec![CaptionSegment::new("00:00:00", "00:00:01", "hi")]),
        );
        let (second, second_calls) = counting("two", StrategyOutcome::NoResult);
        let (pipeline, _) = pipeline(true, root.path());
        let pipeline = pipeline.with_strategies(vec![first, second]);

        let result = pipeline.get_transcript("dQw4w9WgXcQ", &CancellationToken::new()).await.unwrap();

        assert_eq!(result.strategy(), "one");
        assert_eq!(result.duration(), "01:01:01");
        assert_eq!(result.metadata().title, "T");
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failures_fall_through_in_order() {
        let root = tempfile::TempDir::new().unwrap();
        let (first, first_calls) = counting("one", StrategyOutcome::ToolError("boom".into()));
        let (second, second_calls) = counting("two", StrategyOutcome::Success(Vec::new()));
        let (third, third_calls) = counting(
            "three",
            StrategyOutcome::Success(vec![CaptionSegment::new("00:00:00", "00:00:01", "x")]),
        );
        let (pipeline, _) = pipeline(true, root.path());
        let pipeline = pipeline.with_strategies(vec![first, second, third]);

        let result = pipeline.get_transcript("dQw4w9WgXcQ", &CancellationToken::new()).await.unwrap();
        assert_eq!(result.strategy(), "three");
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(third_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_is_no_captions() {
        let root = tempfile::TempDir::new().unwrap();
        let (only, _) = counting("only", StrategyOutcome::NoResult);
        let (pipeline, _) = pipeline(true, root.path());
        let pipeline = pipeline.with_strategies(vec![only]);

        let err = pipeline.get_transcript("dQw4w9WgXcQ", &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, CaptionError::NoCaptionsAvailable { ref video_id } if video_id == "dQw4w9WgXcQ"));
    }

    #[tokio::test]
    async fn test_metadata_failure_runs_no_strategy() {
        let root = tempfile::TempDir::new().unwrap();
        let (only, calls) = counting("only", StrategyOutcome::NoResult);
        let (pipeline, tool) = pipeline(false, root.path());
        let pipeline = pipeline.with_strategies(vec![only]);

        let err = pipeline.get_transcript("dQw4w9WgXcQ", &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.code(), "METADATA_FETCH_FAILED");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(tool.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_strategy_stops_fallback() {
        let root = tempfile::TempDir::new().unwrap();
        let (first, _) = counting("one", StrategyOutcome::Cancelled);
        let (second, second_calls) = counting("two", StrategyOutcome::NoResult);
        let (pipeline, _) = pipeline(true, root.path());
        let pipeline = pipeline.with_strategies(vec![first, second]);

        let err = pipeline.get_transcript("dQw4w9WgXcQ", &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.code(), "CANCELLED");
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_last_strategy_is_not_no_captions() {
        let root = tempfile::TempDir::new().unwrap();
        let (first, _) = counting("one", StrategyOutcome::NoResult);
        let (pipeline, _) = pipeline(true, root.path());
        let pipeline = pipeline.with_strategies(vec![first, Box::new(CancelsThenMisses)]);

        let cancel = CancellationToken::new();
        let err = pipeline.get_transcript("dQw4w9WgXcQ", &cancel).await.unwrap_err();
        assert!(matches!(err, CaptionError::Cancelled { ref video_id } if video_id == "dQw4w9WgXcQ"));
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_invalid_input_touches_nothing() {
        let root = tempfile::TempDir::new().unwrap();
        let (pipeline, tool) = pipeline(true, root.path());

        let err = pipeline.get_transcript("not a video", &CancellationToken::new()).await.unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_default_strategy_names() {
        let (pipeline, _) = pipeline(true, &std::env::temp_dir());
        assert_eq!(pipeline.strategy_names(), vec!["auto-json3", "auto-vtt", "discovery", "manual-subs"]);
    }
}
