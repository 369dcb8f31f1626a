//! CLI commands for vina-build
//!
//! Each command validates its arguments against the settings before any
//! toolchain resolution starts.

use std::path::PathBuf;
use anyhow::{Context, Result};
use tracing::info;

use vina_build_core::{BuildError, BuildSession, BuildSettings, HostOs};
use vina_build_engine::{BuildOptions, BuildRunner, ScriptWriter};
use vina_build_toolchain::{detector, NdkProvisioner, ToolchainResolver};

fn with_user_message(err: BuildError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

fn resolver(settings: &BuildSettings) -> Result<ToolchainResolver> {
    let ndk = NdkProvisioner::from_settings(settings)?;
    Ok(ToolchainResolver::new(ndk, settings.ndk.install_root.clone()))
}

/// Plan command options
pub struct PlanCommand {
    pub apps: Vec<String>,
    pub triplet: Option<String>,
    pub triplet_set: Option<String>,
    pub no_build: bool,
    pub no_tests: bool,
    pub coverage: Option<PathBuf>,
}

impl PlanCommand {
    /// Resolve the toolchain and print the build plan as a shell script
    pub async fn execute(&self, settings: &BuildSettings) -> Result<()> {
        let host = HostOs::current();
        let options = BuildOptions::for_apps(&self.apps, settings, host)
            .map_err(with_user_message)?
            .with_triplet(self.triplet.clone())
            .with_triplet_set(self.triplet_set.clone())
            .with_phases(!self.no_build, !self.no_tests)
            .with_coverage_tool(self.coverage.clone());

        info!("Planning {:?} for {}", options.apps, options.triplet);

        let source_root = std::env::current_dir().context("Cannot determine working directory")?;
        let resolver = resolver(settings)?;
        let runner = BuildRunner::new(&options, settings, &resolver, source_root);

        let mut session = BuildSession::new(host);
        let stdout = std::io::stdout();
        let mut writer = ScriptWriter::new(stdout.lock());

        let summary = runner
            .run(&mut session, &mut writer)
            .await
            .map_err(with_user_message)?;

        info!("Planned {} steps for {} app(s)", summary.steps, summary.apps.len());
        if !summary.missing_tools.is_empty() {
            info!("Tools not found on PATH: {}", summary.missing_tools.join(", "));
        }
        Ok(())
    }
}

/// Resolve command options
pub struct ResolveCommand {
    pub triplet: String,
    pub app: String,
}

impl ResolveCommand {
    /// Print the resolved toolchain for a triplet
    pub async fn execute(&self, settings: &BuildSettings) -> Result<()> {
        if !settings.is_known_app(&self.app) {
            return Err(BuildError::UnknownApp(self.app.clone()).into());
        }

        let resolver = resolver(settings)?;
        let mut session = BuildSession::new(HostOs::current());
        let resolution = resolver
            .resolve(&mut session, &self.app, &self.triplet)
            .await
            .with_context(|| format!("Failed to resolve toolchain for {}", self.triplet))?;

        let triplet = &resolution.triplet;
        println!("Triplet:      {}", triplet);
        println!("Architecture: {} ({})", resolution.arch, triplet.arch);
        println!("OS:           {}", triplet.os);
        if let Some(ref modifier) = triplet.abi_modifier {
            println!("Modifier:     {}", modifier);
        }
        if let Some(ref flag) = resolution.arch_flag {
            println!("CMake flag:   {}", flag.join(" "));
        }
        if let Some(ref ndk) = resolution.ndk_path {
            println!("Android NDK:  {}", ndk.display());
        }

        if resolution.overlay.is_empty() {
            println!("Environment:  (host defaults)");
        } else {
            println!("Environment:");
            for assignment in resolution.overlay.assignments() {
                println!("  {}", assignment);
            }
        }

        let search_path = session.search_path()?;
        if let Some(ref path) = search_path {
            println!("PATH:         {}", path.to_string_lossy());
        }

        let cwd = std::env::current_dir().context("Cannot determine working directory")?;
        let missing = detector::missing_tools(&resolution.config, search_path.as_deref(), &cwd);
        if !missing.is_empty() {
            println!("Not found:    {}", missing.join(", "));
        }

        Ok(())
    }
}

/// NDK command options
pub struct NdkCommand {
    pub app: String,
    pub triplet: String,
}

impl NdkCommand {
    /// Download the NDK for (app, triplet) if needed and print its path
    pub async fn execute(&self, settings: &BuildSettings) -> Result<()> {
        if !settings.is_known_app(&self.app) {
            return Err(BuildError::UnknownApp(self.app.clone()).into());
        }

        let ndk = NdkProvisioner::from_settings(settings)?;
        let path = ndk
            .ensure(&settings.ndk.install_root, &self.app, &self.triplet)
            .await
            .with_context(|| format!("Failed to provision Android NDK {}", ndk.version()))?;

        println!("{}", path.display());
        Ok(())
    }
}
