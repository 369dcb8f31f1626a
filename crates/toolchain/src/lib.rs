//! Cross-compilation Toolchain Resolution
//!
//! Turns a platform descriptor (`arm-neon-linux-static`, `arm64-android`, ...)
//! into the compiler, linker and flags needed to cross-build for it:
//! - Triplet parsing and architecture normalization
//! - The (target OS, arch) toolchain table
//! - Android NDK download and caching
//! - The environment overlay passed to CMake

pub mod triplet;
pub mod arch;
pub mod registry;
pub mod downloader;
pub mod ndk;
pub mod env;
pub mod detector;

pub use triplet::{Triplet, TargetOs};
pub use arch::CanonicalArch;
pub use registry::{ToolchainConfig, ToolchainRegistry, ToolchainRecipe, arch_selection_flag, ANDROID_API_LEVEL};
pub use downloader::{ArchiveFetcher, HttpFetcher, DownloadError};
pub use ndk::{NdkProvisioner, NdkError};
pub use env::{shell_escape, shell_quote, EnvOverlay};

use std::path::PathBuf;
use tracing::info;

use vina_build_core::BuildSession;

/// Everything resolved for one (app, triplet)
#[derive(Debug, Clone)]
pub struct Resolution {
    pub triplet: Triplet,
    pub arch: CanonicalArch,
    pub config: ToolchainConfig,
    pub overlay: EnvOverlay,
    /// CMake architecture selection, for targets that use it
    pub arch_flag: Option<Vec<String>>,
    /// NDK root, for Android targets
    pub ndk_path: Option<PathBuf>,
}

/// Resolves triplets to toolchains, provisioning the NDK when needed
pub struct ToolchainResolver<F = HttpFetcher> {
    registry: ToolchainRegistry,
    ndk: NdkProvisioner<F>,
    install_root: PathBuf,
}

impl<F: ArchiveFetcher> ToolchainResolver<F> {
    pub fn new(ndk: NdkProvisioner<F>, install_root: PathBuf) -> Self {
        Self {
            registry: ToolchainRegistry::new(),
            ndk,
            install_root,
        }
    }

    pub fn registry(&self) -> &ToolchainRegistry {
        &self.registry
    }

    /// Resolve `triplet` for `app`. Android targets download the NDK on
    /// first use and put its binaries on the session search path.
    pub async fn resolve(&self, session: &mut BuildSession, app: &str, triplet: &str) -> Result<Resolution, NdkError> {
        let parsed = Triplet::parse(triplet);
        let arch = CanonicalArch::of(&parsed);
        let os = parsed.target_os();
        info!("Resolving {} for {}: arch {}, os {}", triplet, app, arch, os);

        let recipe = self.registry.recipe(&arch, &os).copied();
        let ndk_path = match recipe {
            Some(recipe) if recipe.needs_ndk() => {
                let path = self.ndk.ensure(&self.install_root, app, triplet).await?;
                self.ndk.fix_search_path(session, &path, recipe.binutils());
                Some(path)
            }
            _ => None,
        };

        let config = self.registry.lookup(&arch, &os, ndk_path.as_deref())?;
        let overlay = EnvOverlay::compose(&config);
        let arch_flag = arch_selection_flag(&arch, &os);

        Ok(Resolution {
            triplet: parsed,
            arch,
            config,
            overlay,
            arch_flag,
            ndk_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vina_build_core::HostOs;

    use crate::downloader::tests::write_zip;

    struct CountingFetcher(AtomicUsize);

    impl ArchiveFetcher for CountingFetcher {
        async fn fetch(&self, _url: &str, target: &Path) -> Result<u64, DownloadError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            write_zip(target, &[("android-ndk-r23c/source.properties", "Pkg.Revision = 23.2\n")]);
            Ok(1)
        }
    }

    fn resolver(root: &Path) -> ToolchainResolver<CountingFetcher> {
        let ndk = NdkProvisioner::new(CountingFetcher(AtomicUsize::new(0)), "r23c", "https://example.invalid/ndk.zip");
        ToolchainResolver::new(ndk, root.to_path_buf())
    }

    #[tokio::test]
    async fn test_resolve_linux_neon() {
        let root = tempfile::tempdir().unwrap();
        let resolver = resolver(root.path());
        let mut session = BuildSession::new(HostOs::Linux);

        let res = resolver.resolve(&mut session, "app", "arm-neon-linux-static").await.unwrap();
        assert_eq!(res.arch.as_str(), "armneon");
        assert_eq!(res.overlay.get("CC"), Some("arm-linux-gnueabihf-gcc"));
        assert!(res.overlay.get("CFLAGS").unwrap().contains("neon-vfpv3"));
        assert_eq!(res.arch_flag, None);
        assert_eq!(res.ndk_path, None);
        assert!(!session.is_path_fixed());
        assert_eq!(resolver.ndk.fetcher_calls(), 0);
    }

    #[tokio::test]
    async fn test_resolve_windows_uses_arch_flag() {
        let root = tempfile::tempdir().unwrap();
        let resolver = resolver(root.path());
        let mut session = BuildSession::new(HostOs::Windows);

        let res = resolver.resolve(&mut session, "app", "x86-windows-static").await.unwrap();
        assert!(res.overlay.is_empty());
        assert_eq!(res.arch_flag, Some(vec!["-A".to_string(), "Win32".to_string()]));
    }

    #[tokio::test]
    async fn test_resolve_android_provisions_once() {
        let root = tempfile::tempdir().unwrap();
        let resolver = resolver(root.path());
        let mut session = BuildSession::new(HostOs::Linux);

        let first = resolver.resolve(&mut session, "app", "arm-android").await.unwrap();
        let second = resolver.resolve(&mut session, "app", "arm-android").await.unwrap();

        assert_eq!(resolver.ndk.fetcher_calls(), 1);
        assert_eq!(first.ndk_path, second.ndk_path);
        assert!(first.overlay.get("LDFLAGS").unwrap().contains("--fix-cortex-a8"));
        assert_eq!(first.overlay.len(), 6);

        // LLVM bin plus the arm binutils, added once
        assert!(session.is_path_fixed());
        assert_eq!(session.path_prefix().len(), 2);
    }

    impl NdkProvisioner<CountingFetcher> {
        fn fetcher_calls(&self) -> usize {
            self.fetcher().0.load(Ordering::SeqCst)
        }
    }
}
