//! Build Options
//!
//! What one invocation builds: which apps, for which triplet, and which
//! phases run.

use std::path::PathBuf;
use tracing::debug;

use vina_build_core::{BuildError, BuildSettings, HostOs, Result};

/// Pseudo-app expanding to every configured app
pub const ALL_APPS: &str = "all";

/// Triplet set used when none is given
pub const DEFAULT_TRIPLET_SET: &str = "default";

/// Build options for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Apps to build, in order
    pub apps: Vec<String>,
    /// vcpkg target triplet
    pub triplet: String,
    /// Overlay triplet set (subdirectory of the triplet sets directory)
    pub triplet_set: String,
    /// Bootstrap vcpkg, configure and build
    pub run_build: bool,
    /// Run the unit tests
    pub run_tests: bool,
    /// OpenCppCoverage executable wrapping the unit tests on Windows
    pub coverage_tool: Option<PathBuf>,
}

impl BuildOptions {
    /// Validate the requested apps against the settings. `all` expands to
    /// every configured app; unknown names are rejected.
    pub fn for_apps(requested: &[String], settings: &BuildSettings, host: HostOs) -> Result<Self> {
        let mut apps: Vec<String> = Vec::new();

        for app in requested {
            if app != ALL_APPS && !settings.is_known_app(app) {
                return Err(BuildError::UnknownApp(app.clone()));
            }
            if !apps.contains(app) {
                apps.push(app.clone());
            }
        }

        if apps.is_empty() {
            return Err(BuildError::Config("No app to build specified".into()));
        }

        if apps.iter().any(|a| a == ALL_APPS) {
            apps = settings.build.apps.clone();
        }

        debug!("Apps to build: {:?}", apps);

        Ok(Self {
            apps,
            triplet: host.default_triplet().to_string(),
            triplet_set: DEFAULT_TRIPLET_SET.to_string(),
            run_build: true,
            run_tests: true,
            coverage_tool: None,
        })
    }

    /// Override the target triplet
    pub fn with_triplet(mut self, triplet: Option<String>) -> Self {
        if let Some(triplet) = triplet {
            self.triplet = triplet;
        }
        self
    }

    /// Override the overlay triplet set
    pub fn with_triplet_set(mut self, triplet_set: Option<String>) -> Self {
        if let Some(triplet_set) = triplet_set {
            self.triplet_set = triplet_set;
        }
        self
    }

    pub fn with_phases(mut self, run_build: bool, run_tests: bool) -> Self {
        self.run_build = run_build;
        self.run_tests = run_tests;
        self
    }

    pub fn with_coverage_tool(mut self, tool: Option<PathBuf>) -> Self {
        self.coverage_tool = tool;
        self
    }
}
