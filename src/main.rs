//! vina-build - cross-compilation toolchain resolver and build planner
//!
//! Parses the command line, sets up logging, loads `vina-build.toml` and
//! dispatches to the selected command.

use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use vina_build::commands::{NdkCommand, PlanCommand, ResolveCommand};
use vina_build::core::{BuildSettings, SETTINGS_FILE};

#[derive(Parser)]
#[command(name = "vina-build", version, about = "Cross-compilation toolchain resolver and build planner")]
struct Cli {
    /// Settings file
    #[arg(long, global = true, default_value = SETTINGS_FILE)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the vcpkg/CMake build plan for one or more apps as a shell script
    Plan {
        /// Apps to build, or `all`
        #[arg(required = true)]
        apps: Vec<String>,

        /// vcpkg target triplet (default: x64-windows-static on Windows, x64-linux-static elsewhere)
        #[arg(short, long)]
        triplet: Option<String>,

        /// Overlay triplet set, e.g. `default` or `ci`
        #[arg(short = 's', long = "triplet-set")]
        triplet_set: Option<String>,

        /// Skip bootstrapping vcpkg, configuring and building
        #[arg(long)]
        no_build: bool,

        /// Skip the unit tests
        #[arg(long)]
        no_tests: bool,

        /// OpenCppCoverage executable to run the unit tests under (Windows)
        #[arg(long)]
        coverage: Option<PathBuf>,
    },

    /// Show the compiler, linker and flags selected for a triplet
    Resolve {
        /// Platform descriptor, e.g. `arm-neon-linux-static`
        triplet: String,

        /// App the Android NDK is cached for
        #[arg(long, default_value = "boinc-autodock-vina")]
        app: String,
    },

    /// Download the Android NDK for an app and triplet and print its path
    Ndk {
        app: String,
        triplet: String,
    },
}

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr, plans and results to stdout
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    debug!("vina-build v{}", vina_build::VERSION);

    let settings = BuildSettings::load(&cli.config)
        .await
        .with_context(|| format!("Failed to load settings from {:?}", cli.config))?;

    match cli.command {
        Commands::Plan { apps, triplet, triplet_set, no_build, no_tests, coverage } => {
            PlanCommand { apps, triplet, triplet_set, no_build, no_tests, coverage }
                .execute(&settings)
                .await
        }
        Commands::Resolve { triplet, app } => {
            ResolveCommand { triplet, app }.execute(&settings).await
        }
        Commands::Ndk { app, triplet } => {
            NdkCommand { app, triplet }.execute(&settings).await
        }
    }
}
