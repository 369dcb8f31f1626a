//! vina-build
//!
//! Resolves the cross-compilation toolchain for a vcpkg triplet and plans
//! the vcpkg/CMake build of the BOINC Autodock Vina apps.
//!
//! ## Architecture
//!
//! - `vina-build-core`: errors, settings and the per-run build session
//! - `vina-build-toolchain`: triplet parsing, toolchain table, Android NDK provisioning
//! - `vina-build-engine`: vcpkg/CMake step planning

#![warn(clippy::all)]

pub mod commands;

// Re-export crates
pub use vina_build_core as core;
pub use vina_build_toolchain as toolchain;
pub use vina_build_engine as engine;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
