//! Build Settings
//!
//! Settings read from `vina-build.toml`:
//! - Android NDK version, download location and cache root
//! - Known apps and the vcpkg/CMake directory layout

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::{info, debug};

use crate::error::Result;

/// Default settings file name, looked up in the working directory
pub const SETTINGS_FILE: &str = "vina-build.toml";

/// Android NDK settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NdkSettings {
    /// NDK release tag (e.g. `r23c`)
    pub version: String,
    /// Archive URL; `{version}` is replaced with the release tag
    pub url_template: String,
    /// Root of the per-app, per-triplet NDK cache
    pub install_root: PathBuf,
    /// Expected SHA-256 of the archive, checked after download when set
    pub sha256: Option<String>,
}

impl Default for NdkSettings {
    fn default() -> Self {
        Self {
            version: "r23c".to_string(),
            url_template: "https://dl.google.com/android/repository/android-ndk-{version}-linux.zip"
                .to_string(),
            install_root: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join("vina-build")
                .join("ndk"),
            sha256: None,
        }
    }
}

/// Project layout settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Apps that can be built (each is a CMake source directory)
    pub apps: Vec<String>,
    /// vcpkg checkout
    pub vcpkg_root: PathBuf,
    /// Directory holding the overlay triplet sets (`default`, `ci`, ...)
    pub triplet_sets_dir: PathBuf,
    /// Overlay ports directory
    pub ports_dir: PathBuf,
    /// CMake binary directory root
    pub build_dir: PathBuf,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            apps: vec!["boinc-autodock-vina".to_string()],
            vcpkg_root: PathBuf::from("vcpkg"),
            triplet_sets_dir: PathBuf::from("vcpkg_triplets"),
            ports_dir: PathBuf::from("vcpkg_custom_ports"),
            build_dir: PathBuf::from("build"),
        }
    }
}

/// Top-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    pub ndk: NdkSettings,
    pub build: LayoutSettings,
}

impl BuildSettings {
    /// Load settings from `path`, falling back to defaults when it does not exist
    pub async fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading settings from {:?}", path);
            let contents = tokio::fs::read_to_string(path).await?;
            let settings: BuildSettings = toml::from_str(&contents)?;
            Ok(settings)
        } else {
            info!("Settings file {:?} not found, using defaults", path);
            Ok(Self::default())
        }
    }

    /// NDK archive URL for the configured version
    pub fn ndk_url(&self) -> String {
        self.ndk.url_template.replace("{version}", &self.ndk.version)
    }

    /// Check whether `app` is one of the configured apps
    pub fn is_known_app(&self, app: &str) -> bool {
        self.build.apps.iter().any(|a| a == app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = BuildSettings::default();
        assert_eq!(settings.ndk.version, "r23c");
        assert_eq!(
            settings.ndk_url(),
            "https://dl.google.com/android/repository/android-ndk-r23c-linux.zip"
        );
        assert!(settings.is_known_app("boinc-autodock-vina"));
        assert!(!settings.is_known_app("all"));
    }

    #[tokio::test]
    async fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(
            &path,
            "[ndk]\nversion = \"r21e\"\ninstall_root = \"/opt/ndk\"\n\n[build]\napps = [\"a\", \"b\"]\n",
        )
        .unwrap();

        let settings = BuildSettings::load(&path).await.unwrap();
        assert_eq!(settings.ndk.version, "r21e");
        assert_eq!(settings.ndk.install_root, PathBuf::from("/opt/ndk"));
        assert!(settings.ndk_url().ends_with("android-ndk-r21e-linux.zip"));
        assert_eq!(settings.build.apps, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(settings.build.build_dir, PathBuf::from("build"));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = BuildSettings::load(&dir.path().join("absent.toml")).await.unwrap();
        assert_eq!(settings.build.apps.len(), 1);
    }

    #[tokio::test]
    async fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "[ndk\nversion = ").unwrap();

        let err = BuildSettings::load(&path).await.unwrap_err();
        assert!(matches!(err, crate::BuildError::TomlParse(_)));
    }
}
