//! vina-build Core - shared types
//!
//! This crate provides the pieces every other vina-build crate relies on:
//! the error type, the TOML settings, and the per-run build session.

pub mod config;
pub mod error;
pub mod session;

pub use config::{BuildSettings, NdkSettings, LayoutSettings, SETTINGS_FILE};
pub use error::{BuildError, Result};
pub use session::{BuildSession, HostOs};

/// vina-build version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
