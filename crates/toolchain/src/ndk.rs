//! NDK Provisioner
//!
//! Keeps a per-app, per-triplet copy of a fixed Android NDK release under
//! the install root, downloading it on first use.
//!
//! There is no locking around the cache directory: two runs provisioning the
//! same (app, triplet) at once can interleave. A directory left behind by a
//! failed download is treated as installed on the next run.

use std::path::{Path, PathBuf};
use tracing::{info, debug};

use vina_build_core::{BuildError, BuildSession, BuildSettings};

use crate::downloader::{self, ArchiveFetcher, DownloadError, HttpFetcher};

/// Host tag of the prebuilt NDK toolchains
pub const NDK_HOST_TAG: &str = "linux-x86_64";

/// NDK errors
#[derive(Debug, thiserror::Error)]
pub enum NdkError {
    #[error("Android NDK has not been provisioned for this target")]
    NotProvisioned,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to install Android NDK {version}: {source}")]
    Download {
        version: String,
        #[source]
        source: DownloadError,
    },
}

impl From<NdkError> for BuildError {
    fn from(err: NdkError) -> Self {
        match err {
            NdkError::Io(e) => BuildError::Io(e),
            NdkError::Download { source: DownloadError::Extraction(msg), .. } => {
                BuildError::Extraction(msg)
            }
            NdkError::Download { version, source } => {
                BuildError::Download(format!("NDK {}: {}", version, source))
            }
            NdkError::NotProvisioned => {
                BuildError::Toolchain("Android NDK has not been provisioned".to_string())
            }
        }
    }
}

/// LLVM toolchain root of an NDK installation
pub fn llvm_prebuilt(ndk_path: &Path) -> PathBuf {
    ndk_path
        .join("toolchains")
        .join("llvm")
        .join("prebuilt")
        .join(NDK_HOST_TAG)
}

/// Sysroot of an NDK installation
pub fn sysroot(ndk_path: &Path) -> PathBuf {
    llvm_prebuilt(ndk_path).join("sysroot")
}

/// Binary directory of a GNU binutils toolchain (e.g. `arm-linux-androideabi-4.9`)
pub fn binutils_bin(ndk_path: &Path, binutils: &str) -> PathBuf {
    ndk_path
        .join("toolchains")
        .join(binutils)
        .join("prebuilt")
        .join(NDK_HOST_TAG)
        .join("bin")
}

/// Downloads and caches the Android NDK
pub struct NdkProvisioner<F = HttpFetcher> {
    fetcher: F,
    version: String,
    url: String,
    sha256: Option<String>,
}

impl NdkProvisioner<HttpFetcher> {
    /// Create an HTTP provisioner from the build settings
    pub fn from_settings(settings: &BuildSettings) -> Result<Self, NdkError> {
        let fetcher = HttpFetcher::new().map_err(|source| NdkError::Download {
            version: settings.ndk.version.clone(),
            source,
        })?;
        Ok(Self::new(fetcher, &settings.ndk.version, settings.ndk_url())
            .with_checksum(settings.ndk.sha256.clone()))
    }
}

impl<F: ArchiveFetcher> NdkProvisioner<F> {
    pub fn new(fetcher: F, version: &str, url: impl Into<String>) -> Self {
        Self {
            fetcher,
            version: version.to_string(),
            url: url.into(),
            sha256: None,
        }
    }

    /// Require the downloaded archive to have this SHA-256
    pub fn with_checksum(mut self, sha256: Option<String>) -> Self {
        self.sha256 = sha256;
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Cache directory for one (app, triplet)
    pub fn target_dir(install_root: &Path, app: &str, triplet: &str) -> PathBuf {
        install_root.join(app).join(triplet)
    }

    /// NDK root inside the cache directory
    pub fn ndk_path(&self, install_root: &Path, app: &str, triplet: &str) -> PathBuf {
        Self::target_dir(install_root, app, triplet).join(format!("android-ndk-{}", self.version))
    }

    /// Make sure the NDK for (app, triplet) is on disk and return its root.
    /// The cache directory's existence alone decides whether to download.
    pub async fn ensure(&self, install_root: &Path, app: &str, triplet: &str) -> Result<PathBuf, NdkError> {
        let target_dir = Self::target_dir(install_root, app, triplet);
        let ndk_path = self.ndk_path(install_root, app, triplet);

        if target_dir.exists() {
            debug!("Android NDK cache hit: {:?}", target_dir);
            return Ok(ndk_path);
        }

        info!("Installing Android NDK {} for {} ({})", self.version, app, triplet);
        tokio::fs::create_dir_all(&target_dir).await?;

        let archive = tempfile::Builder::new()
            .prefix("android-ndk-")
            .suffix(".zip")
            .tempfile_in(install_root)?
            .into_temp_path();

        self.download_and_unpack(&archive, &target_dir)
            .await
            .map_err(|source| NdkError::Download {
                version: self.version.clone(),
                source,
            })?;

        archive.close()?;

        info!("Android NDK {} installed to {:?}", self.version, ndk_path);
        Ok(ndk_path)
    }

    async fn download_and_unpack(&self, archive: &Path, target_dir: &Path) -> Result<(), DownloadError> {
        self.fetcher.fetch(&self.url, archive).await?;

        if let Some(ref expected) = self.sha256 {
            downloader::verify_checksum(archive, expected).await?;
        }

        downloader::extract_zip(archive, target_dir).await?;
        Ok(())
    }

    /// Prepend the NDK's LLVM binaries, and the cross binutils when the arch
    /// has them, to the session search path. Once per session.
    pub fn fix_search_path(&self, session: &mut BuildSession, ndk_path: &Path, binutils: Option<&str>) -> bool {
        let mut dirs = vec![llvm_prebuilt(ndk_path).join("bin")];
        if let Some(binutils) = binutils {
            dirs.push(binutils_bin(ndk_path, binutils));
        }
        session.fix_search_path(dirs)
    }
}
