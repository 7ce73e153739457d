//! Cancellable, progress-reporting HTTP downloader core for in-app updates.
//!
//! A [`Downloader`] streams one HTTP resource to a local file and emits
//! progress events followed by exactly one terminal outcome. The
//! [`updater`] module layers the download/install hand-off of an app
//! updater on top of it.

pub mod downloader;
pub mod updater;

pub use downloader::{
    DownloadError, DownloadEvent, DownloadHandle, DownloadOutcome, DownloadProgress,
    DownloadRequest, Downloader, DownloaderConfig,
};
pub use updater::{InstallerBridge, LogInstaller, run_update};
