use anyhow::Result;
use caption_pipeline::{logging, CancellationToken, Config, YtDlp};
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    logging::init(&config.logging)?;

    info!("🔍 Checking caption extraction tool availability...");

    if let Err(e) = config.validate() {
        error!("❌ Invalid configuration: {}", e);
        return Err(e);
    }

    for line in config.summary().lines() {
        info!("{}", line);
    }

    let tool = YtDlp::from_config(&config.tool);
    let cancel = CancellationToken::new();

    let version = tokio::time::timeout(Duration::from_secs(30), tool.version(&cancel)).await;

    match version {
        Ok(Ok(version)) if !version.is_empty() => {
            info!("✅ {} {} is runnable", tool.binary().display(), version);
        }
        Ok(Ok(_)) => {
            error!("❌ {} ran but reported no version", tool.binary().display());
            std::process::exit(1);
        }
        Ok(Err(e)) => {
            error!("❌ {}", e);
            info!("💡 Install yt-dlp and make sure it is on PATH, or set tool.binary:");
            info!("   pip install -U yt-dlp");
            info!("   export CAPTION_PIPELINE_YTDLP=/path/to/yt-dlp");
            std::process::exit(1);
        }
        Err(_) => {
            cancel.cancel();
            error!("❌ {} did not answer --version within 30s", tool.binary().display());
            std::process::exit(1);
        }
    }

    Ok(())
}
