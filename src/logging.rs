//! Log initialisation and per-attempt event reporting
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global subscriber. Logs go to stderr so stdout carries only program output.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let level = &config.level;
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!(
            "caption_pipeline={level},caption_fetch={level},check_tool={level},warn"
        ))
    })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))
}

/// How a single invocation or probe ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    SegmentsFound(usize),
    NotFound,
    ToolError(String),
    Cancelled,
}

/// One tool invocation together with the files probed after it
#[derive(Debug, Clone)]
pub struct ExtractionAttempt {
    /// 1-based position of the strategy in the fallback order
    pub strategy_index: usize,
    pub strategy: &'static str,
    pub language: Option<String>,
    pub probed: Vec<PathBuf>,
    pub outcome: AttemptOutcome,
    pub elapsed: Duration,
}

/// Receiver for extraction attempts
pub trait AttemptSink: Send + Sync {
    fn record(&self, attempt: &ExtractionAttempt);
}

/// Emits attempts as `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AttemptSink for TracingSink {
    fn record(&self, attempt: &ExtractionAttempt) {
        let language = attempt.language.as_deref().unwrap_or("-");
        let elapsed_ms = attempt.elapsed.as_millis() as u64;

        match &attempt.outcome {
            AttemptOutcome::SegmentsFound(count) => info!(
                strategy = attempt.strategy,
                index = attempt.strategy_index,
                language,
                elapsed_ms,
                "✅ Found {} segments",
                count
            ),
            AttemptOutcome::NotFound => debug!(
                strategy = attempt.strategy,
                index = attempt.strategy_index,
                language,
                elapsed_ms,
                probed = ?attempt.probed,
                "No usable subtitle file"
            ),
            AttemptOutcome::ToolError(reason) => warn!(
                strategy = attempt.strategy,
                index = attempt.strategy_index,
                language,
                elapsed_ms,
                "❌ Tool invocation failed: {}",
                reason
            ),
            AttemptOutcome::Cancelled => warn!(
                strategy = attempt.strategy,
                index = attempt.strategy_index,
                language,
                "🛑 Attempt cancelled"
            ),
        }
    }
}

/// Collects attempts in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    attempts: Mutex<Vec<ExtractionAttempt>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> Vec<ExtractionAttempt> {
        self.attempts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AttemptSink for RecordingSink {
    fn record(&self, attempt: &ExtractionAttempt) {
        self.attempts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(attempt.clone());
    }
}
