use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the caption pipeline
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// External extraction tool settings
    pub tool: ToolConfig,

    /// Caption language priority
    pub languages: LanguageConfig,

    /// Pipeline limits and scratch area
    pub pipeline: PipelineConfig,

    /// Log output settings
    pub logging: LoggingConfig,

    /// File the configuration was loaded from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Path or name of the yt-dlp binary
    pub binary: PathBuf,

    /// Arguments prepended to every invocation (cookies, proxy, ...)
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Languages tried in order
    pub priority: Vec<String>,

    /// Generic language sentinel appended by the per-language auto-caption retry
    pub auto_sentinel: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Deadline for a whole transcript request, in seconds
    pub request_timeout_seconds: u64,

    /// Parent directory for per-request scratch directories (system temp dir when unset)
    pub scratch_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level for this crate's targets
    pub level: String,

    /// Emit JSON log lines instead of human-readable output
    pub json: bool,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
            extra_args: Vec::new(),
        }
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            priority: ["en", "zh-Hans", "zh-Hant", "zh", "en-US", "en-GB"]
                .iter()
                .map(|lang| lang.to_string())
                .collect(),
            auto_sentinel: "auto".to_string(),
        }
    }
}

impl LanguageConfig {
    /// Priority list followed by the generic sentinel
    pub fn with_sentinel(&self) -> Vec<String> {
        let mut languages = self.priority.clone();
        if !self.auto_sentinel.is_empty() && !languages.contains(&self.auto_sentinel) {
            languages.push(self.auto_sentinel.clone());
        }
        languages
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 120,
            scratch_root: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from the first config file found, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut candidates = vec![
            PathBuf::from("caption-pipeline.toml"),
            PathBuf::from("config/caption-pipeline.toml"),
        ];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("caption-pipeline").join("config.toml"));
        }

        let mut config = match candidates.iter().find(|path| path.is_file()) {
            Some(path) => Self::load_from(path)?,
            None => Self::default(),
        };
        config.apply_env()?;

        Ok(config)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Defaults with environment variable overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override settings from environment variables.
    ///
    /// Fails on a malformed `CAPTION_PIPELINE_TIMEOUT`.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(binary) = std::env::var("CAPTION_PIPELINE_YTDLP") {
            self.tool.binary = PathBuf::from(binary);
        }

        if let Ok(timeout) = std::env::var("CAPTION_PIPELINE_TIMEOUT") {
            self.pipeline.request_timeout_seconds = parse_timeout_seconds(&timeout)
                .context("Invalid CAPTION_PIPELINE_TIMEOUT")?;
        }

        if let Ok(languages) = std::env::var("CAPTION_PIPELINE_LANGUAGES") {
            self.languages.priority = parse_language_list(&languages);
        }

        if let Ok(scratch_root) = std::env::var("CAPTION_PIPELINE_SCRATCH_DIR") {
            self.pipeline.scratch_root = Some(PathBuf::from(scratch_root));
        }

        if let Ok(log_level) = std::env::var("CAPTION_PIPELINE_LOG_LEVEL") {
            self.logging.level = log_level;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.tool.binary.as_os_str().is_empty() {
            return Err(anyhow!("tool.binary must not be empty"));
        }

        if self.languages.priority.is_empty() {
            return Err(anyhow!("languages.priority must list at least one language"));
        }

        if self.languages.priority.iter().any(|lang| lang.trim().is_empty()) {
            return Err(anyhow!("languages.priority contains an empty entry"));
        }

        if self.pipeline.request_timeout_seconds == 0 {
            return Err(anyhow!("pipeline.request_timeout_seconds must be greater than 0"));
        }

        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Caption Pipeline Configuration:\n\
            - Config file: {}\n\
            - yt-dlp binary: {}\n\
            - Extra arguments: {}\n\
            - Language priority: {}\n\
            - Request timeout: {}s\n\
            - Scratch root: {}",
            self.source
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(defaults)".to_string()),
            self.tool.binary.display(),
            if self.tool.extra_args.is_empty() {
                "(none)".to_string()
            } else {
                self.tool.extra_args.join(" ")
            },
            self.languages.priority.join(", "),
            self.pipeline.request_timeout_seconds,
            self.pipeline
                .scratch_root
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| std::env::temp_dir().display().to_string()),
        )
    }
}

/// Whole seconds, as accepted by `CAPTION_PIPELINE_TIMEOUT`
pub fn parse_timeout_seconds(value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .with_context(|| format!("expected whole seconds, got '{}'", value))
}

/// Split a comma separated language list, dropping blanks
pub fn parse_language_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.config.tool.binary = binary.into();
        self
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.config.tool.extra_args = args;
        self
    }

    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.config.languages.priority = languages;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.config.pipeline.request_timeout_seconds = seconds;
        self
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.pipeline.scratch_root = Some(root.into());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
