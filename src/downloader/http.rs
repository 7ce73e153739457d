//! HTTP downloader with streamed writes, progress events and cancellation.

use super::models::{
    DownloadError, DownloadEvent, DownloadOutcome, DownloadProgress, DownloadRequest,
    DownloaderConfig,
};
use super::progress::ProgressReporter;
use futures_util::StreamExt;
use log::{debug, warn};
use reqwest::Client;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// One running download: a receiver for its events plus a cancellation
/// handle. Dropping the handle cancels the transfer on its next chunk.
pub struct DownloadHandle {
    events: mpsc::UnboundedReceiver<DownloadEvent>,
    cancel: CancellationToken,
}

impl DownloadHandle {
    /// Next event, or `None` once the terminal event has been consumed.
    pub async fn recv(&mut self) -> Option<DownloadEvent> {
        self.events.recv().await
    }

    /// Requests cancellation. The transfer resolves to
    /// `Failed { error: Cancelled }` promptly and closes its connection
    /// and file handle.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drains events until the terminal outcome, discarding progress.
    pub async fn wait(mut self) -> Result<PathBuf, DownloadError> {
        while let Some(event) = self.recv().await {
            if let DownloadEvent::Done(outcome) = event {
                return match outcome {
                    DownloadOutcome::Completed { file_path } => Ok(file_path),
                    DownloadOutcome::Failed { error } => Err(error),
                };
            }
        }
        // The transfer task always sends a terminal event before exiting,
        // so this is only reachable if it was torn down mid-flight.
        Err(DownloadError::Cancelled)
    }
}

pub struct Downloader {
    client: Client,
    config: DownloaderConfig,
}

impl Downloader {
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_config(DownloaderConfig::default())
    }

    pub fn with_config(config: DownloaderConfig) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .use_rustls_tls()
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    /// Starts a download on the current runtime and returns its handle.
    ///
    /// Each call owns its own channel and cancellation token; concurrent
    /// starts on the same `Downloader` share nothing but the HTTP client
    /// pool, so independent downloads never interfere.
    pub fn start(&self, request: DownloadRequest) -> DownloadHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let client = self.client.clone();
        let idle_timeout = self.config.idle_timeout();
        let token = cancel.clone();

        tokio::spawn(async move {
            run(client, request, idle_timeout, token, tx).await;
        });

        DownloadHandle { events: rx, cancel }
    }

    /// Downloads to completion, logging progress along the way.
    pub async fn download(&self, request: DownloadRequest) -> Result<PathBuf, DownloadError> {
        let name = request
            .destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| request.url.clone());
        let mut reporter = ProgressReporter::new(name);
        let mut handle = self.start(request);

        while let Some(event) = handle.recv().await {
            match event {
                DownloadEvent::Progress(progress) => reporter.update(progress),
                DownloadEvent::Done(DownloadOutcome::Completed { file_path }) => {
                    reporter.complete();
                    return Ok(file_path);
                }
                DownloadEvent::Done(DownloadOutcome::Failed { error }) => return Err(error),
            }
        }

        Err(DownloadError::Cancelled)
    }
}

/// Drives one transfer and guarantees exactly one terminal event: a final
/// `1.0` progress then `Completed` on success, `Failed` otherwise. On any
/// failure the partial file is removed so a collaborator can never pick up
/// a truncated artifact.
async fn run(
    client: Client,
    request: DownloadRequest,
    idle_timeout: std::time::Duration,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<DownloadEvent>,
) {
    let outcome = match transfer(&client, &request, idle_timeout, &cancel, &events).await {
        Ok(()) => {
            let _ = events.send(DownloadEvent::Progress(DownloadProgress::Fraction(1.0)));
            DownloadOutcome::Completed {
                file_path: request.destination.clone(),
            }
        }
        Err(error) => {
            warn!("Download of {} failed: {error}", request.url);
            remove_partial(&request.destination).await;
            DownloadOutcome::Failed { error }
        }
    };

    let _ = events.send(DownloadEvent::Done(outcome));
}

async fn transfer(
    client: &Client,
    request: &DownloadRequest,
    idle_timeout: std::time::Duration,
    cancel: &CancellationToken,
    events: &mpsc::UnboundedSender<DownloadEvent>,
) -> Result<(), DownloadError> {
    if let Some(parent) = request.destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    debug!("Downloading {} to {:?}", request.url, request.destination);

    let response = tokio::select! {
        _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
        response = client.get(&request.url).send() => response?,
    };

    if !response.status().is_success() {
        return Err(DownloadError::HttpStatus(response.status().as_u16()));
    }

    let total_size = response.content_length().filter(|size| *size > 0);
    if total_size.is_none() {
        // Single leading marker; numeric progress resumes at the final 1.0.
        let _ = events.send(DownloadEvent::Progress(DownloadProgress::Indeterminate));
    }

    let mut file = File::create(&request.destination).await?;
    let mut stream = response.bytes_stream();
    let mut downloaded = 0u64;
    let mut last_fraction = 0.0f32;

    loop {
        if events.is_closed() {
            // Nobody is listening anymore; stop wasting the connection.
            return Err(DownloadError::Cancelled);
        }

        let next = tokio::select! {
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            next = timeout(idle_timeout, stream.next()) => next,
        };

        let Ok(next) = next else {
            return Err(DownloadError::Stalled(idle_timeout));
        };
        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk?;

        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        if let Some(total) = total_size {
            let fraction = (downloaded as f32 / total as f32).min(1.0);
            if fraction > last_fraction {
                last_fraction = fraction;
                let _ = events.send(DownloadEvent::Progress(DownloadProgress::Fraction(fraction)));
            }
        }
    }

    file.flush().await?;
    drop(file);

    Ok(())
}

async fn remove_partial(destination: &std::path::Path) {
    match tokio::fs::remove_file(destination).await {
        Ok(()) => debug!("Removed partial file {destination:?}"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial file {destination:?}: {e}"),
    }
}
