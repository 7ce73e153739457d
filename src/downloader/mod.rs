pub mod http;
pub mod models;
pub mod progress;

pub use http::{DownloadHandle, Downloader};
pub use models::{
    DownloadError, DownloadEvent, DownloadOutcome, DownloadProgress, DownloadRequest,
    DownloaderConfig,
};
pub use progress::ProgressReporter;
