use async_trait::async_trait;

use super::{per_language_vtt, ExtractionStrategy, StrategyContext, StrategyOutcome};
use crate::probe::FilenamePattern;
use crate::ytdlp::SubtitleKind;

const NAME: &str = "manual-subs";

const PATTERNS: [FilenamePattern; 2] = [FilenamePattern::IdLangExt, FilenamePattern::NaInfix];

/// Uploader-provided subtitles over the base priority list
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualSubsStrategy;

#[async_trait]
impl ExtractionStrategy for ManualSubsStrategy {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn attempt(&self, ctx: &StrategyContext<'_>) -> StrategyOutcome {
        per_language_vtt(ctx, NAME, SubtitleKind::Manual, &ctx.languages.priority, &PATTERNS).await
    }
}
