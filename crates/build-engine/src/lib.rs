//! vina-build Engine
//!
//! Plans the vcpkg/CMake build of each app for a target triplet, with the
//! cross toolchain resolved by `vina-build-toolchain`.

pub mod config;
pub mod cmake;
pub mod runner;

pub use config::{BuildOptions, ALL_APPS, DEFAULT_TRIPLET_SET};
pub use cmake::{BuildStep, CMakePlanner};
pub use runner::{BuildInvoker, BuildRunner, BuildSummary, ScriptWriter};
