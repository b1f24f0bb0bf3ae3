use async_trait::async_trait;

use super::{per_language_vtt, ExtractionStrategy, StrategyContext, StrategyOutcome};
use crate::probe::FilenamePattern;
use crate::ytdlp::SubtitleKind;

const NAME: &str = "auto-vtt";

const PATTERNS: [FilenamePattern; 4] = [
    FilenamePattern::IdLangExt,
    FilenamePattern::NaInfix,
    FilenamePattern::IdOnly,
    FilenamePattern::FixedLang("en"),
];

/// Auto-generated VTT captions, one request per language plus the generic sentinel
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoVttStrategy;

#[async_trait]
impl ExtractionStrategy for AutoVttStrategy {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn attempt(&self, ctx: &StrategyContext<'_>) -> StrategyOutcome {
        let languages = ctx.languages.with_sentinel();
        per_language_vtt(ctx, NAME, SubtitleKind::Auto, &languages, &PATTERNS).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::*;

    #[tokio::test]
    async fn test_finds_later_language() {
        let harness = Harness::new();
        let tool = FakeTool::default().with_file("zh-Hans", "dQw4w9WgXcQ.zh-Hans.vtt", VTT);

        let outcome = AutoVttStrategy.attempt(&harness.context(&tool)).await;
        assert!(matches!(outcome, StrategyOutcome::Success(_)));

        let langs: Vec<_> = tool
            .calls()
            .iter()
            .map(|args| {
                let at = args.iter().position(|a| a == "--sub-lang").unwrap();
                args[at + 1].clone()
            })
            .collect();
        assert_eq!(langs, vec!["en", "zh-Hans"]);
    }

    #[tokio::test]
    async fn test_sentinel_is_tried_last() {
        let harness = Harness::new();
        let tool = FakeTool::default().with_file("auto", "dQw4w9WgXcQ.en.vtt", VTT);

        let outcome = AutoVttStrategy.attempt(&harness.context(&tool)).await;
        assert!(matches!(outcome, StrategyOutcome::Success(_)));
        assert_eq!(tool.calls().len(), 7);
        assert_eq!(harness.sink.attempts().last().unwrap().language.as_deref(), Some("auto"));
    }

    #[tokio::test]
    async fn test_id_only_file() {
        let harness = Harness::new();
        let tool = FakeTool::default().with_file("en", "dQw4w9WgXcQ.vtt", VTT);

        let outcome = AutoVttStrategy.attempt(&harness.context(&tool)).await;
        assert!(matches!(outcome, StrategyOutcome::Success(_)));
        assert_eq!(tool.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_is_no_result() {
        let harness = Harness::new();
        let tool = FakeTool::default();
        assert_eq!(AutoVttStrategy.attempt(&harness.context(&tool)).await, StrategyOutcome::NoResult);
        assert_eq!(harness.sink.attempts().len(), 7);
    }
}
