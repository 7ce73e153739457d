use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// A single download to perform. Immutable once built.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub destination: PathBuf,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
        }
    }
}

/// Progress of one transfer.
///
/// `Indeterminate` is emitted at most once per attempt, before any numeric
/// value, when the server sent no content length. Numeric fractions are
/// non-decreasing and end at `1.0` on the success path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DownloadProgress {
    Indeterminate,
    Fraction(f32),
}

/// Terminal result of a download attempt. Produced exactly once.
#[derive(Debug)]
pub enum DownloadOutcome {
    Completed { file_path: PathBuf },
    Failed { error: DownloadError },
}

/// Events carried on a download's channel: zero or more `Progress`, then
/// exactly one `Done` and nothing after it.
#[derive(Debug)]
pub enum DownloadEvent {
    Progress(DownloadProgress),
    Done(DownloadOutcome),
}

#[derive(Debug)]
pub enum DownloadError {
    Network(reqwest::Error),
    HttpStatus(u16),
    Filesystem(std::io::Error),
    Stalled(Duration),
    Cancelled,
}

impl From<reqwest::Error> for DownloadError {
    fn from(error: reqwest::Error) -> Self {
        DownloadError::Network(error)
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(error: std::io::Error) -> Self {
        DownloadError::Filesystem(error)
    }
}

impl std::fmt::Display for DownloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadError::Network(err) => write!(f, "Network error: {err}"),
            DownloadError::HttpStatus(code) => write!(f, "HTTP error: {code}"),
            DownloadError::Filesystem(err) => write!(f, "IO error: {err}"),
            DownloadError::Stalled(idle) => {
                write!(f, "Network error: transfer stalled for {}s", idle.as_secs())
            }
            DownloadError::Cancelled => write!(f, "Download cancelled"),
        }
    }
}

impl std::error::Error for DownloadError {}

/// Client settings. Defaults match what the embedding updater ships with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    /// Seconds to wait for the TCP/TLS handshake.
    pub connect_timeout_secs: u64,
    /// Seconds a transfer may sit without receiving a single chunk before
    /// it is failed as stalled.
    pub idle_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            idle_timeout_secs: 30,
            user_agent: "ApkUpdater/0.1.0".to_string(),
        }
    }
}

impl DownloaderConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}
