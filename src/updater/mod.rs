//! Update orchestration: download an APK and hand it to an installer bridge.
//!
//! The bridge is an opaque collaborator. This crate never installs anything
//! itself; a platform layer (e.g. an Android plugin speaking to
//! PackageInstaller) implements [`InstallerBridge`] and receives the path of
//! the finished download.

use crate::downloader::{DownloadRequest, Downloader};
use anyhow::{Context, Result, bail};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Communication seam between the updater and the platform install plugin.
pub trait InstallerBridge {
    /// Asks the user for permission to install apps from unknown sources.
    /// Returns whether installation may proceed.
    fn request_install_permission(&self) -> bool;

    /// Starts installation of the package at `file_path`. The path points
    /// at a fully downloaded file; partial downloads are never handed over.
    fn install(&self, file_path: &Path) -> Result<()>;
}

/// Bridge that only logs, for platforms without an installer plugin.
pub struct LogInstaller;

impl InstallerBridge for LogInstaller {
    fn request_install_permission(&self) -> bool {
        info!("Install permission requested (no installer plugin, granting)");
        true
    }

    fn install(&self, file_path: &Path) -> Result<()> {
        info!("Would install package from {file_path:?}");
        Ok(())
    }
}

/// Downloads the update and hands the finished file to the bridge.
pub async fn run_update(
    downloader: &Downloader,
    request: DownloadRequest,
    bridge: &dyn InstallerBridge,
) -> Result<PathBuf> {
    if !bridge.request_install_permission() {
        bail!("Install permission denied by the user");
    }

    info!("Downloading update from {}", request.url);
    let url = request.url.clone();
    let file_path = downloader
        .download(request)
        .await
        .with_context(|| format!("Failed to download update from {url}"))?;

    info!("Download finished: {file_path:?}");
    if let Err(e) = bridge.install(&file_path) {
        warn!("Installer rejected {file_path:?}: {e:#}");
        return Err(e).context("Failed to start installation");
    }

    Ok(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::DownloaderConfig;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct RecordingBridge {
        allow: bool,
        installed: AtomicBool,
    }

    impl InstallerBridge for RecordingBridge {
        fn request_install_permission(&self) -> bool {
            self.allow
        }

        fn install(&self, _file_path: &Path) -> Result<()> {
            self.installed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn denied_permission_skips_download() {
        let bridge = RecordingBridge {
            allow: false,
            installed: AtomicBool::new(false),
        };
        let downloader = Downloader::with_config(DownloaderConfig::default()).unwrap();
        let request = DownloadRequest::new("http://127.0.0.1:1/app.apk", "/tmp/never-written.apk");

        let result = run_update(&downloader, request, &bridge).await;

        assert!(result.is_err());
        assert!(!bridge.installed.load(Ordering::SeqCst));
        assert!(!Path::new("/tmp/never-written.apk").exists());
    }
}
