use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;
use tracing::info;

use super::{per_language_vtt, ExtractionStrategy, StrategyContext, StrategyOutcome};
use crate::logging::AttemptOutcome;
use crate::probe::FilenamePattern;
use crate::ytdlp::{self, SubtitleKind};

const NAME: &str = "discovery";

const PATTERNS: [FilenamePattern; 2] = [FilenamePattern::IdLangExt, FilenamePattern::NaInfix];

static LANGUAGE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([a-z-]+)\)").expect("language code regex"));

/// Ask the tool which subtitle tracks exist, then request each one
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscoveryStrategy;

#[async_trait]
impl ExtractionStrategy for DiscoveryStrategy {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn attempt(&self, ctx: &StrategyContext<'_>) -> StrategyOutcome {
        let started = Instant::now();

        let listing = match ctx.invoke(&ytdlp::list_subs_args(ctx.video_id)).await {
            Ok(output) => output,
            Err(failure) => {
                ctx.record(NAME, None, Vec::new(), (&failure).into(), started);
                return failure.into();
            }
        };

        let languages = parse_available_languages(&listing.stdout);
        if languages.is_empty() {
            ctx.record(NAME, None, Vec::new(), AttemptOutcome::NotFound, started);
            return StrategyOutcome::NoResult;
        }

        info!("🔍 Discovered subtitle languages: {}", languages.join(", "));

        per_language_vtt(ctx, NAME, SubtitleKind::Auto, &languages, &PATTERNS).await
    }
}

/// Language codes in a subtitle listing: first parenthesised code per line, de-duplicated
pub fn parse_available_languages(listing: &str) -> Vec<String> {
    let mut languages: Vec<String> = Vec::new();

    for line in listing.lines() {
        if let Some(caps) = LANGUAGE_CODE.captures(line) {
            let code = &caps[1];
            if !languages.iter().any(|seen| seen == code) {
                languages.push(code.to_string());
            }
        }
    }

    languages
}
