//! Build Session
//!
//! State owned by a single run of the tool: the host platform and the
//! executable search path adjustments made while resolving toolchains.

use std::ffi::OsString;
use std::path::PathBuf;
use tracing::{info, debug};

use crate::error::{BuildError, Result};

/// Platform the tool is running on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    MacOs,
    Linux,
}

impl HostOs {
    /// Detect the host platform
    pub fn current() -> Self {
        if cfg!(windows) {
            HostOs::Windows
        } else if cfg!(target_os = "macos") {
            HostOs::MacOs
        } else {
            HostOs::Linux
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, HostOs::Windows)
    }

    /// Triplet used when none is given on the command line
    pub fn default_triplet(&self) -> &'static str {
        match self {
            HostOs::Windows => "x64-windows-static",
            HostOs::MacOs | HostOs::Linux => "x64-linux-static",
        }
    }

    pub fn exe_suffix(&self) -> &'static str {
        match self {
            HostOs::Windows => ".exe",
            HostOs::MacOs | HostOs::Linux => "",
        }
    }
}

/// Per-run build session
#[derive(Debug)]
pub struct BuildSession {
    host: HostOs,
    path_fixed: bool,
    path_prefix: Vec<PathBuf>,
    base_path: Option<OsString>,
}

impl BuildSession {
    /// Create a session for `host`, capturing the current `PATH`
    pub fn new(host: HostOs) -> Self {
        Self {
            host,
            path_fixed: false,
            path_prefix: Vec::new(),
            base_path: std::env::var_os("PATH"),
        }
    }

    /// Replace the captured base `PATH`
    pub fn with_base_path(mut self, base_path: Option<OsString>) -> Self {
        self.base_path = base_path;
        self
    }

    pub fn host(&self) -> HostOs {
        self.host
    }

    /// Whether the search path has already been adjusted in this run
    pub fn is_path_fixed(&self) -> bool {
        self.path_fixed
    }

    /// Prepend `dirs` to the search path. Only the first call in a session
    /// has an effect; returns whether the directories were applied.
    pub fn fix_search_path(&mut self, dirs: impl IntoIterator<Item = PathBuf>) -> bool {
        if self.path_fixed {
            debug!("Search path already fixed for this session");
            return false;
        }

        for dir in dirs {
            info!("Prepending {:?} to PATH", dir);
            self.path_prefix.push(dir);
        }
        self.path_fixed = true;
        true
    }

    /// Directories prepended so far
    pub fn path_prefix(&self) -> &[PathBuf] {
        &self.path_prefix
    }

    /// Full `PATH` value for child processes, or `None` when unchanged
    pub fn search_path(&self) -> Result<Option<OsString>> {
        if self.path_prefix.is_empty() {
            return Ok(None);
        }

        let base: Vec<PathBuf> = self
            .base_path
            .as_ref()
            .map(|p| std::env::split_paths(p).collect())
            .unwrap_or_default();

        std::env::join_paths(self.path_prefix.iter().chain(base.iter()))
            .map(Some)
            .map_err(|e| BuildError::Config(format!("Cannot compose PATH: {}", e)))
    }
}
