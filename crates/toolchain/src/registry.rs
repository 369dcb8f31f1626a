//! Toolchain Registry
//!
//! Declarative table of cross toolchains keyed by (target OS, canonical
//! arch). Adding a platform means adding a row to [`TOOLCHAIN_TABLE`].

use std::path::Path;
use tracing::debug;

use crate::arch::CanonicalArch;
use crate::ndk::{self, NdkError};
use crate::triplet::TargetOs;

/// Android API level every Android build targets
pub const ANDROID_API_LEVEL: u32 = 21;

/// Compiler, linker and flags for one target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainConfig {
    pub cc: Option<String>,
    pub cxx: Option<String>,
    pub ld: Option<String>,
    pub cflags: Option<String>,
    pub cxxflags: Option<String>,
    pub ldflags: Option<String>,
}

impl ToolchainConfig {
    /// True when no field is set (the host default toolchain applies)
    pub fn is_empty(&self) -> bool {
        self.cc.is_none()
            && self.cxx.is_none()
            && self.ld.is_none()
            && self.cflags.is_none()
            && self.cxxflags.is_none()
            && self.ldflags.is_none()
    }

    /// Tools named by this configuration, without their arguments
    pub fn tools(&self) -> Vec<&str> {
        [&self.cc, &self.cxx, &self.ld]
            .into_iter()
            .flatten()
            .filter_map(|cmd| cmd.split_whitespace().next())
            .collect()
    }
}

/// How to build the configuration for one table row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolchainRecipe {
    /// Host gcc in 32 or 64 bit mode
    HostMultilib { bits: &'static str },
    /// GNU cross compiler installed on the host
    GnuCross { prefix: &'static str, march: &'static str },
    /// NDK clang targeting armv7-a
    AndroidArmv7 { fpu: &'static str, binutils: &'static str },
    /// NDK clang for the other Android ABIs
    AndroidAbi { triple: &'static str, binutils: Option<&'static str> },
}

impl ToolchainRecipe {
    pub fn needs_ndk(&self) -> bool {
        matches!(self, ToolchainRecipe::AndroidArmv7 { .. } | ToolchainRecipe::AndroidAbi { .. })
    }

    /// Binutils directory under `toolchains/` for arches that have one
    pub fn binutils(&self) -> Option<&'static str> {
        match self {
            ToolchainRecipe::AndroidArmv7 { binutils, .. } => Some(*binutils),
            ToolchainRecipe::AndroidAbi { binutils, .. } => *binutils,
            _ => None,
        }
    }

    fn render(&self, ndk_path: Option<&Path>) -> Result<ToolchainConfig, NdkError> {
        match *self {
            ToolchainRecipe::HostMultilib { bits } => {
                let flag = format!("-m{}", bits);
                Ok(ToolchainConfig {
                    cc: Some(format!("gcc {}", flag)),
                    cxx: Some(format!("g++ {}", flag)),
                    ld: None,
                    cflags: Some(flag.clone()),
                    cxxflags: Some(flag.clone()),
                    ldflags: Some(format!("{} -static-libstdc++ -static", flag)),
                })
            }
            ToolchainRecipe::GnuCross { prefix, march } => {
                let flag = format!("-march={}", march);
                Ok(ToolchainConfig {
                    cc: Some(format!("{}-gcc", prefix)),
                    cxx: Some(format!("{}-g++", prefix)),
                    ld: Some(format!("{}-ld", prefix)),
                    cflags: Some(flag.clone()),
                    cxxflags: Some(flag.clone()),
                    ldflags: Some(format!("{} -static-libstdc++ -static", flag)),
                })
            }
            ToolchainRecipe::AndroidArmv7 { fpu, .. } => {
                let ndk_path = ndk_path.ok_or(NdkError::NotProvisioned)?;
                let root = ndk::llvm_prebuilt(ndk_path);
                let sysroot = ndk::sysroot(ndk_path);
                let abi_dir = root.join("arm-linux-androideabi");

                let flags = format!(
                    "--sysroot={} -I{} -O3 -fomit-frame-pointer -fPIE -march=armv7-a \
                     -mfloat-abi=softfp -mfpu={} -D__ANDROID_API__={}",
                    sysroot.display(),
                    abi_dir.join("include").display(),
                    fpu,
                    ANDROID_API_LEVEL,
                );
                let ldflags = format!(
                    "-L{} -L{} -fPIE -pie -march=armv7-a -static-libstdc++ -llog -latomic \
                     -Wl,--fix-cortex-a8",
                    abi_dir.join("usr").join("lib").display(),
                    abi_dir.join("lib").display(),
                );

                Ok(ToolchainConfig {
                    cc: Some(format!("armv7a-linux-androideabi{}-clang", ANDROID_API_LEVEL)),
                    cxx: Some(format!("armv7a-linux-androideabi{}-clang++", ANDROID_API_LEVEL)),
                    ld: Some("arm-linux-androideabi-ld".to_string()),
                    cflags: Some(flags.clone()),
                    cxxflags: Some(flags),
                    ldflags: Some(ldflags),
                })
            }
            ToolchainRecipe::AndroidAbi { triple, .. } => {
                let ndk_path = ndk_path.ok_or(NdkError::NotProvisioned)?;
                let root = ndk::llvm_prebuilt(ndk_path);
                let sysroot = ndk::sysroot(ndk_path);
                let abi_dir = root.join(triple);

                let flags = format!(
                    "--sysroot={} -I{} -O3 -fomit-frame-pointer -fPIE -D__ANDROID_API__={}",
                    sysroot.display(),
                    abi_dir.join("include").display(),
                    ANDROID_API_LEVEL,
                );
                let ldflags = format!(
                    "-L{} -L{} -fPIE -pie -static-libstdc++ -llog -latomic",
                    abi_dir.join("usr").join("lib").display(),
                    abi_dir.join("lib").display(),
                );

                Ok(ToolchainConfig {
                    cc: Some(format!("{}{}-clang", triple, ANDROID_API_LEVEL)),
                    cxx: Some(format!("{}{}-clang++", triple, ANDROID_API_LEVEL)),
                    ld: Some(format!("{}-ld", triple)),
                    cflags: Some(flags.clone()),
                    cxxflags: Some(flags),
                    ldflags: Some(ldflags),
                })
            }
        }
    }
}

/// (target OS, canonical arch, recipe)
pub const TOOLCHAIN_TABLE: &[(&str, &str, ToolchainRecipe)] = &[
    ("linux", "64", ToolchainRecipe::HostMultilib { bits: "64" }),
    ("linux", "32", ToolchainRecipe::HostMultilib { bits: "32" }),
    (
        "linux",
        "arm",
        ToolchainRecipe::GnuCross { prefix: "arm-linux-gnueabihf", march: "armv7-a+vfpv3-d16" },
    ),
    (
        "linux",
        "armneon",
        ToolchainRecipe::GnuCross { prefix: "arm-linux-gnueabihf", march: "armv7-a+neon-vfpv3" },
    ),
    (
        "linux",
        "arm64",
        ToolchainRecipe::GnuCross { prefix: "aarch64-linux-gnu", march: "armv8-a" },
    ),
    (
        "android",
        "arm",
        ToolchainRecipe::AndroidArmv7 { fpu: "vfpv3-d16", binutils: "arm-linux-androideabi-4.9" },
    ),
    (
        "android",
        "armneon",
        ToolchainRecipe::AndroidArmv7 { fpu: "neon-vfpv3", binutils: "arm-linux-androideabi-4.9" },
    ),
    (
        "android",
        "arm64",
        ToolchainRecipe::AndroidAbi {
            triple: "aarch64-linux-android",
            binutils: Some("aarch64-linux-android-4.9"),
        },
    ),
    (
        "android",
        "x64",
        ToolchainRecipe::AndroidAbi { triple: "x86_64-linux-android", binutils: None },
    ),
    (
        "android",
        "x86",
        ToolchainRecipe::AndroidAbi { triple: "i686-linux-android", binutils: None },
    ),
];

/// Lookup over [`TOOLCHAIN_TABLE`]
#[derive(Debug, Clone, Copy)]
pub struct ToolchainRegistry {
    entries: &'static [(&'static str, &'static str, ToolchainRecipe)],
}

impl Default for ToolchainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolchainRegistry {
    pub fn new() -> Self {
        Self { entries: TOOLCHAIN_TABLE }
    }

    /// Recipe for a target, if the table has one
    pub fn recipe(&self, arch: &CanonicalArch, os: &TargetOs) -> Option<&ToolchainRecipe> {
        let (os, arch) = (os.as_str(), arch.as_str());
        self.entries
            .iter()
            .find(|(row_os, row_arch, _)| *row_os == os && *row_arch == arch)
            .map(|(_, _, recipe)| recipe)
    }

    /// Whether resolving this target needs a provisioned NDK
    pub fn needs_ndk(&self, arch: &CanonicalArch, os: &TargetOs) -> bool {
        self.recipe(arch, os).map(|r| r.needs_ndk()).unwrap_or(false)
    }

    /// Look up the configuration for a target. Unknown targets resolve to an
    /// empty configuration; Android targets need `ndk_path`.
    pub fn lookup(
        &self,
        arch: &CanonicalArch,
        os: &TargetOs,
        ndk_path: Option<&Path>,
    ) -> Result<ToolchainConfig, NdkError> {
        match self.recipe(arch, os) {
            Some(recipe) => {
                debug!("Toolchain recipe for {}/{}: {:?}", os, arch, recipe);
                recipe.render(ndk_path)
            }
            None => {
                debug!("No toolchain entry for {}/{}, using host defaults", os, arch);
                Ok(ToolchainConfig::default())
            }
        }
    }
}

/// CMake architecture selection for targets that use it instead of an
/// environment overlay
pub fn arch_selection_flag(arch: &CanonicalArch, os: &TargetOs) -> Option<Vec<String>> {
    match os {
        TargetOs::Windows => Some(vec!["-A".to_string(), arch.to_string()]),
        TargetOs::Osx => Some(vec![format!("-DCMAKE_OSX_ARCHITECTURES={}", arch)]),
        _ => None,
    }
}
