//! CLI entry point: download an update and hand it to the logging bridge.

use anyhow::{Context, Result};
use apk_updater::{DownloadRequest, Downloader, DownloaderConfig, LogInstaller, run_update};
use log::error;
use std::env;
use std::path::PathBuf;

struct Args {
    url: String,
    destination: PathBuf,
    config: Option<PathBuf>,
}

fn parse_args() -> Option<Args> {
    let mut url = None;
    let mut destination = None;
    let mut config = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(args.next()?)),
            _ if url.is_none() => url = Some(arg),
            _ if destination.is_none() => destination = Some(PathBuf::from(arg)),
            _ => return None,
        }
    }

    Some(Args {
        url: url?,
        destination: destination?,
        config,
    })
}

fn load_config(path: Option<&PathBuf>) -> Result<DownloaderConfig> {
    let Some(path) = path else {
        return Ok(DownloaderConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let Some(args) = parse_args() else {
        let program = env::args().next().unwrap_or_else(|| "apk-updater".into());
        error!("Usage: {program} <url> <destination> [--config <path>]");
        std::process::exit(1);
    };

    if let Err(e) = run(args).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let downloader = Downloader::with_config(config)?;
    let request = DownloadRequest::new(args.url, args.destination);

    run_update(&downloader, request, &LogInstaller).await?;
    Ok(())
}
