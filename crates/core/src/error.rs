//! Error types for vina-build
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type for vina-build
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Unknown app: {0}")]
    UnknownApp(String),

    #[error("Toolchain error: {0}")]
    Toolchain(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Step '{step}' failed: {reason}")]
    Step { step: String, reason: String },
}

/// Result type alias for vina-build operations
pub type Result<T> = std::result::Result<T, BuildError>;

impl BuildError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            BuildError::Io(e) => format!("File operation failed: {}", e),
            BuildError::UnknownApp(app) => format!("Invalid app: {}", app),
            BuildError::Download(msg) => {
                format!("Android NDK download failed: {}. Please check your connection.", msg)
            }
            BuildError::Extraction(msg) => format!("Android NDK unpack failed: {}", msg),
            BuildError::Step { step, .. } => format!("Failed to {}", step),
            _ => self.to_string(),
        }
    }
}
