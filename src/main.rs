use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

use caption_pipeline::config::parse_language_list;
use caption_pipeline::{logging, CancellationToken, Config, TranscriptPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("caption-fetch")
        .version(env!("CARGO_PKG_VERSION"))
        .author("TigreRoll")
        .about("Fetch the caption transcript of a YouTube video")
        .arg(
            Arg::new("input")
                .value_name("URL_OR_ID")
                .help("YouTube URL or 11-character video ID")
                .required(true)
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .value_parser(["json", "text", "srt"])
                .default_value("json")
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (default: search standard locations)")
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECS")
                .help("Deadline for the whole request")
                .value_parser(clap::value_parser!(u64))
        )
        .arg(
            Arg::new("lang")
                .short('l')
                .long("lang")
                .value_name("LIST")
                .help("Comma separated language priority, e.g. en,de")
        )
        .arg(
            Arg::new("ytdlp")
                .long("ytdlp")
                .value_name("PATH")
                .help("Path to the yt-dlp binary")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue)
        )
        .get_matches();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => {
            let mut config = Config::load_from(&PathBuf::from(path))?;
            config.apply_env()?;
            config
        }
        None => Config::load()?,
    };

    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        config.pipeline.request_timeout_seconds = *timeout;
    }
    if let Some(langs) = matches.get_one::<String>("lang") {
        config.languages.priority = parse_language_list(langs);
    }
    if let Some(binary) = matches.get_one::<String>("ytdlp") {
        config.tool.binary = PathBuf::from(binary);
    }
    if matches.get_flag("verbose") {
        config.logging.level = "debug".to_string();
    }

    logging::init(&config.logging)?;
    config.validate()?;

    match &config.source {
        Some(path) => info!("📋 Loaded configuration from {}", path.display()),
        None => info!("📋 Using default configuration"),
    }

    let input = matches
        .get_one::<String>("input")
        .map(String::as_str)
        .unwrap_or_default();
    let format = matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("json");

    let pipeline = TranscriptPipeline::from_config(&config);
    let cancel = CancellationToken::new();
    let watchdog = tokio::spawn(watch_deadline(
        cancel.clone(),
        Duration::from_secs(config.pipeline.request_timeout_seconds),
    ));

    let result = pipeline.get_transcript(input, &cancel).await;
    watchdog.abort();

    match result {
        Ok(transcript) => {
            let rendered = match format {
                "text" => transcript.to_text(),
                "srt" => transcript.to_srt(),
                _ => serde_json::to_string_pretty(&transcript.to_response())?,
            };
            println!("{}", rendered);
            Ok(())
        }
        Err(e) => {
            error!("❌ {}", e);
            eprintln!("{}: {}", e.code(), e);
            std::process::exit(if e.is_client_error() { 2 } else { 1 });
        }
    }
}

/// Cancel the request once the deadline passes or Ctrl-C arrives
async fn watch_deadline(cancel: CancellationToken, deadline: Duration) {
    tokio::select! {
        _ = tokio::time::sleep(deadline) => {
            warn!("⏰ Request timed out after {} seconds", deadline.as_secs());
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("🛑 Interrupted, cancelling request");
        }
    }
    cancel.cancel();
}
