use async_trait::async_trait;
use std::time::Instant;
use tracing::debug;

use super::{ExtractionStrategy, InvocationFailure, StrategyContext, StrategyOutcome};
use crate::captions::CaptionFormat;
use crate::logging::AttemptOutcome;
use crate::probe::{probe, FilenamePattern};
use crate::ytdlp::SubtitleKind;

const NAME: &str = "auto-json3";

/// The tool sometimes ignores the json3 request and writes VTT instead
const VTT_FALLBACK_PATTERNS: [FilenamePattern; 3] = [
    FilenamePattern::NaInfix,
    FilenamePattern::IdLangExt,
    FilenamePattern::IdOnly,
];

/// Auto-generated captions for every priority language in a single json3 request.
///
/// A non-zero exit still probes the scratch directory, since one failing
/// language does not stop the tool writing the others.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoJson3Strategy;

#[async_trait]
impl ExtractionStrategy for AutoJson3Strategy {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn attempt(&self, ctx: &StrategyContext<'_>) -> StrategyOutcome {
        let languages = &ctx.languages.priority;
        let started = Instant::now();

        let requested = ctx
            .request_subtitles(SubtitleKind::Auto, &languages.join(","), CaptionFormat::Json3)
            .await;
        if let Err(failure) = &requested {
            ctx.record(NAME, None, Vec::new(), failure.into(), started);
            if *failure == InvocationFailure::Cancelled {
                return StrategyOutcome::Cancelled;
            }
        }

        for format in [CaptionFormat::Json3, CaptionFormat::Vtt] {
            let patterns: &[FilenamePattern] = match format {
                CaptionFormat::Json3 => &[FilenamePattern::IdLangExt],
                CaptionFormat::Vtt => &VTT_FALLBACK_PATTERNS,
            };

            for lang in languages {
                let started = Instant::now();
                let mut probed = Vec::new();

                if let Some((path, segments)) =
                    probe(ctx.scratch_dir, ctx.video_id, lang, format, patterns, &mut probed).await
                {
                    debug!("Using {} captions from {}", format.extension(), path.display());
                    ctx.record(
                        NAME,
                        Some(lang),
                        probed,
                        AttemptOutcome::SegmentsFound(segments.len()),
                        started,
                    );
                    return StrategyOutcome::Success(segments);
                }

                ctx.record(NAME, Some(lang), probed, AttemptOutcome::NotFound, started);
            }
        }

        match requested {
            Err(failure) => failure.into(),
            Ok(()) => StrategyOutcome::NoResult,
        }
    }
}
