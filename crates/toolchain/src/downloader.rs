//! Archive Downloader
//!
//! Downloads, verifies and extracts toolchain archives.

use std::path::Path;
use tokio::io::AsyncWriteExt;
use reqwest::Client;
use sha2::{Sha256, Digest};
use tracing::{info, debug, warn};

/// Download error types
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
    #[error("Extraction failed: {0}")]
    Extraction(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Source of toolchain archives
#[allow(async_fn_in_trait)]
pub trait ArchiveFetcher {
    /// Download `url` into the file at `target`, returning the byte count
    async fn fetch(&self, url: &str, target: &Path) -> Result<u64, DownloadError>;
}

/// HTTP(S) archive fetcher
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher. Requests have no timeout: NDK archives are large.
    pub fn new() -> Result<Self, DownloadError> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }
}

impl ArchiveFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, target: &Path) -> Result<u64, DownloadError> {
        info!("Downloading {} to {:?}", url, target);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(DownloadError::InvalidResponse(
                format!("HTTP {} for {}", response.status(), url)
            ));
        }

        let total_size = response.content_length().unwrap_or(0);
        let mut downloaded: u64 = 0;
        let mut next_report: u64 = 0;

        let mut file = tokio::fs::File::create(target).await?;
        let mut stream = response.bytes_stream();

        use futures::StreamExt;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            if downloaded >= next_report {
                debug!("Downloaded {} of {} bytes", downloaded, total_size);
                next_report += 64 * 1024 * 1024;
            }
        }

        file.flush().await?;

        info!("Download complete: {} bytes", downloaded);
        Ok(downloaded)
    }
}

/// Verify the SHA-256 of a file
pub async fn verify_checksum(path: &Path, expected: &str) -> Result<(), DownloadError> {
    debug!("Verifying checksum for {:?}", path);

    let path = path.to_path_buf();
    let actual = tokio::task::spawn_blocking(move || -> Result<String, DownloadError> {
        let mut file = std::fs::File::open(&path)?;
        let mut hasher = Sha256::new();
        std::io::copy(&mut file, &mut hasher)?;
        Ok(hex::encode(hasher.finalize()))
    })
    .await
    .map_err(|e| DownloadError::Extraction(e.to_string()))??;

    if actual.eq_ignore_ascii_case(expected) {
        debug!("Checksum verified");
        Ok(())
    } else {
        warn!("Checksum mismatch: expected {}, got {}", expected, actual);
        Err(DownloadError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Extract every entry of a ZIP archive into `target_dir`
pub async fn extract_zip(archive: &Path, target_dir: &Path) -> Result<usize, DownloadError> {
    info!("Extracting {:?} to {:?}", archive, target_dir);

    let archive = archive.to_path_buf();
    let target_dir = target_dir.to_path_buf();

    // zip is synchronous
    tokio::task::spawn_blocking(move || extract_zip_blocking(&archive, &target_dir))
        .await
        .map_err(|e| DownloadError::Extraction(e.to_string()))?
}

fn extract_zip_blocking(archive: &Path, target_dir: &Path) -> Result<usize, DownloadError> {
    let file = std::fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| DownloadError::Extraction(e.to_string()))?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)
            .map_err(|e| DownloadError::Extraction(e.to_string()))?;

        let relative = match entry.enclosed_name() {
            Some(name) => name.to_path_buf(),
            None => {
                warn!("Skipping entry with unsafe path: {}", entry.name());
                continue;
            }
        };
        let outpath = target_dir.join(relative);

        // The Linux NDK links its compiler drivers (`clang` -> `clang-12`)
        #[cfg(unix)]
        {
            if entry.unix_mode().map_or(false, is_symlink_mode) {
                unpack_symlink(&mut entry, &outpath)?;
                continue;
            }
        }

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut outfile = std::fs::File::create(&outpath)?;
            std::io::copy(&mut entry, &mut outfile)?;
        }

        // NDK binaries must stay executable
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))?;
            }
        }
    }

    debug!("Extracted {} entries", zip.len());
    Ok(zip.len())
}

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

#[cfg_attr(not(unix), allow(dead_code))]
fn is_symlink_mode(mode: u32) -> bool {
    mode & S_IFMT == S_IFLNK
}

#[cfg(unix)]
fn unpack_symlink(entry: &mut zip::read::ZipFile<'_>, outpath: &Path) -> Result<(), DownloadError> {
    use std::io::Read;

    let mut target = String::new();
    entry.read_to_string(&mut target)?;

    if Path::new(&target).is_absolute() {
        warn!("Skipping absolute symlink {} -> {}", entry.name(), target);
        return Ok(());
    }

    if let Some(parent) = outpath.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if outpath.symlink_metadata().is_ok() {
        std::fs::remove_file(outpath)?;
    }
    std::os::unix::fs::symlink(&target, outpath)?;
    Ok(())
}
