//! Build Runner
//!
//! Walks the requested apps, resolves the toolchain for the target triplet
//! and hands every planned step to a [`BuildInvoker`].

use std::io::Write;
use std::path::PathBuf;
use tracing::{info, debug};

use vina_build_core::{BuildError, BuildSession, BuildSettings, Result};
use vina_build_toolchain::{detector, shell_escape, ArchiveFetcher, ToolchainResolver};

use crate::cmake::{BuildStep, CMakePlanner};
use crate::config::BuildOptions;

/// Executes (or records) build steps. Running the real build system lives
/// behind this interface.
pub trait BuildInvoker {
    fn invoke(&mut self, step: &BuildStep) -> Result<()>;
}

/// Writes each step as a line of a POSIX shell script
pub struct ScriptWriter<W: Write> {
    out: W,
    header_written: bool,
}

impl<W: Write> ScriptWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, header_written: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(step: &BuildStep) -> String {
        let mut line = String::new();

        if let Some(ref path) = step.search_path {
            line.push_str(&format!("PATH=\"{}\" ", shell_escape(&path.to_string_lossy())));
        }

        for assignment in step.env.assignments() {
            line.push_str(&assignment);
            line.push(' ');
        }

        line.push_str(&step.command_line());

        match step.only_if_exists {
            Some(ref path) => format!(
                "if [ -f \"{}\" ]; then {}; fi",
                shell_escape(&path.to_string_lossy()),
                line
            ),
            None => line,
        }
    }
}

impl<W: Write> BuildInvoker for ScriptWriter<W> {
    fn invoke(&mut self, step: &BuildStep) -> Result<()> {
        if !self.header_written {
            writeln!(self.out, "#!/bin/sh")?;
            writeln!(self.out, "set -e")?;
            self.header_written = true;
        }
        writeln!(self.out)?;
        writeln!(self.out, "# {}", step.name)?;
        writeln!(self.out, "{}", Self::render(step))?;
        Ok(())
    }
}

/// Summary of a planned run
#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    pub steps: usize,
    pub apps: Vec<String>,
    /// Tools named by the resolved toolchains that were not found
    pub missing_tools: Vec<String>,
}

/// Drives the build loop for one run
pub struct BuildRunner<'a, F: ArchiveFetcher> {
    options: &'a BuildOptions,
    settings: &'a BuildSettings,
    resolver: &'a ToolchainResolver<F>,
    source_root: PathBuf,
}

impl<'a, F: ArchiveFetcher> BuildRunner<'a, F> {
    pub fn new(
        options: &'a BuildOptions,
        settings: &'a BuildSettings,
        resolver: &'a ToolchainResolver<F>,
        source_root: PathBuf,
    ) -> Self {
        Self {
            options,
            settings,
            resolver,
            source_root,
        }
    }

    /// Plan every step for the configured apps and pass them to `invoker`,
    /// stopping at the first failure
    pub async fn run(&self, session: &mut BuildSession, invoker: &mut dyn BuildInvoker) -> Result<BuildSummary> {
        let planner = CMakePlanner::new(&self.settings.build, self.source_root.clone(), session.host());
        let triplet = self.options.triplet.as_str();
        let mut summary = BuildSummary::default();

        if self.options.run_build {
            for step in planner.vcpkg_steps() {
                Self::invoke(invoker, &step, &mut summary)?;
            }
        }

        for app in &self.options.apps {
            if self.options.run_build {
                info!("Building {}", app);

                let resolution = self.resolver.resolve(session, app, triplet).await?;
                let search_path = session.search_path()?;

                let missing = detector::missing_tools(&resolution.config, search_path.as_deref(), &self.source_root);
                summary.missing_tools.extend(missing);

                let mut configure = planner.configure(app, &self.options.triplet_set, &resolution);
                configure.search_path = search_path.clone();
                Self::invoke(invoker, &configure, &mut summary)?;

                let mut build = planner.build(app, triplet);
                build.search_path = search_path;
                Self::invoke(invoker, &build, &mut summary)?;
            }

            if self.options.run_tests {
                info!("Testing {}", app);
                let step = planner.unit_tests(app, triplet, self.options.coverage_tool.as_deref());
                Self::invoke(invoker, &step, &mut summary)?;
            }

            summary.apps.push(app.clone());
        }

        Ok(summary)
    }

    fn invoke(invoker: &mut dyn BuildInvoker, step: &BuildStep, summary: &mut BuildSummary) -> Result<()> {
        debug!("Step: {}", step.command_line());
        invoker.invoke(step).map_err(|e| match e {
            BuildError::Step { .. } => e,
            other => BuildError::Step {
                step: step.name.clone(),
                reason: other.to_string(),
            },
        })?;
        summary.steps += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use vina_build_core::HostOs;
    use vina_build_toolchain::{DownloadError, NdkProvisioner};

    /// Records every step it is given
    #[derive(Default)]
    struct RecordingInvoker {
        steps: Vec<BuildStep>,
        fail_on: Option<String>,
    }

    impl BuildInvoker for RecordingInvoker {
        fn invoke(&mut self, step: &BuildStep) -> Result<()> {
            if self.fail_on.as_deref() == Some(step.name.as_str()) {
                return Err(BuildError::Step {
                    step: step.name.clone(),
                    reason: "exit status 1".into(),
                });
            }
            self.steps.push(step.clone());
            Ok(())
        }
    }

    /// Must never be reached by non-Android plans
    struct NoNetwork;

    impl ArchiveFetcher for NoNetwork {
        async fn fetch(&self, url: &str, _target: &Path) -> std::result::Result<u64, DownloadError> {
            Err(DownloadError::InvalidResponse(format!("unexpected download of {}", url)))
        }
    }

    fn names(invoker: &RecordingInvoker) -> Vec<&str> {
        invoker.steps.iter().map(|s| s.name.as_str()).collect()
    }

    fn setup(root: &Path) -> (BuildSettings, ToolchainResolver<NoNetwork>) {
        let mut settings = BuildSettings::default();
        settings.ndk.install_root = root.join("ndk");
        let ndk = NdkProvisioner::new(NoNetwork, &settings.ndk.version, settings.ndk_url());
        let resolver = ToolchainResolver::new(ndk, settings.ndk.install_root.clone());
        (settings, resolver)
    }

    #[tokio::test]
    async fn test_linux_plan() {
        let root = tempfile::tempdir().unwrap();
        let (settings, resolver) = setup(root.path());
        let options = BuildOptions::for_apps(&["all".to_string()], &settings, HostOs::Linux).unwrap();

        let runner = BuildRunner::new(&options, &settings, &resolver, root.path().to_path_buf());
        let mut session = BuildSession::new(HostOs::Linux);
        let mut invoker = RecordingInvoker::default();

        let summary = runner.run(&mut session, &mut invoker).await.unwrap();

        assert_eq!(
            names(&invoker),
            vec![
                "clone vcpkg",
                "pull vcpkg",
                "bootstrap vcpkg",
                "configure boinc-autodock-vina",
                "build boinc-autodock-vina",
                "run unit tests for boinc-autodock-vina",
            ]
        );
        assert_eq!(summary.steps, 6);
        assert_eq!(summary.apps, vec!["boinc-autodock-vina".to_string()]);

        let configure = &invoker.steps[3];
        assert_eq!(configure.env.get("CC"), Some("gcc -m64"));
        assert!(configure.env.get("LDFLAGS").unwrap().contains("-static"));
        assert_eq!(configure.search_path, None);
    }

    #[tokio::test]
    async fn test_tests_only_skips_resolution() {
        let root = tempfile::tempdir().unwrap();
        let (settings, resolver) = setup(root.path());
        let options = BuildOptions::for_apps(&["all".to_string()], &settings, HostOs::Linux)
            .unwrap()
            .with_triplet(Some("arm64-android".into()))
            .with_phases(false, true);

        let runner = BuildRunner::new(&options, &settings, &resolver, root.path().to_path_buf());
        let mut session = BuildSession::new(HostOs::Linux);
        let mut invoker = RecordingInvoker::default();

        runner.run(&mut session, &mut invoker).await.unwrap();

        assert_eq!(names(&invoker), vec!["run unit tests for boinc-autodock-vina"]);
        assert!(!session.is_path_fixed());
    }

    #[tokio::test]
    async fn test_ndk_failure_aborts_before_cmake() {
        let root = tempfile::tempdir().unwrap();
        let (settings, resolver) = setup(root.path());
        let options = BuildOptions::for_apps(&["all".to_string()], &settings, HostOs::Linux)
            .unwrap()
            .with_triplet(Some("arm64-android".into()));

        let runner = BuildRunner::new(&options, &settings, &resolver, root.path().to_path_buf());
        let mut session = BuildSession::new(HostOs::Linux);
        let mut invoker = RecordingInvoker::default();

        let err = runner.run(&mut session, &mut invoker).await.unwrap_err();

        assert!(matches!(err, BuildError::Download(_)));
        assert!(!names(&invoker).iter().any(|n| n.starts_with("configure")));
    }

    #[tokio::test]
    async fn test_failing_step_stops_the_run() {
        let root = tempfile::tempdir().unwrap();
        let (settings, resolver) = setup(root.path());
        let options = BuildOptions::for_apps(&["all".to_string()], &settings, HostOs::Linux).unwrap();

        let runner = BuildRunner::new(&options, &settings, &resolver, root.path().to_path_buf());
        let mut session = BuildSession::new(HostOs::Linux);
        let mut invoker = RecordingInvoker {
            fail_on: Some("configure boinc-autodock-vina".into()),
            ..Default::default()
        };

        let err = runner.run(&mut session, &mut invoker).await.unwrap_err();
        assert_eq!(err.user_message(), "Failed to configure boinc-autodock-vina");
        assert_eq!(invoker.steps.len(), 3);
    }

    #[test]
    fn test_script_writer() {
        let mut writer = ScriptWriter::new(Vec::new());
        let mut step = BuildStep::new("build app", "cmake").args(["--build", "build/app/x64-linux-static"]);
        step.env = vina_build_toolchain::EnvOverlay::compose(&vina_build_toolchain::ToolchainConfig {
            cc: Some("gcc -m64".into()),
            ..Default::default()
        });

        writer.invoke(&step).unwrap();
        writer.invoke(&BuildStep::new("pull vcpkg", "git")).unwrap();

        let script = String::from_utf8(writer.into_inner()).unwrap();
        assert!(script.starts_with("#!/bin/sh\nset -e\n"));
        assert!(script.contains("# build app\nCC=\"gcc -m64\" cmake --build build/app/x64-linux-static\n"));
        assert_eq!(script.matches("#!/bin/sh").count(), 1);
    }

    #[test]
    fn test_script_writer_optional_step() {
        let mut step = BuildStep::new("run unit tests for app", "/src/build/app/t/unit-tests");
        step.only_if_exists = Some(PathBuf::from("/src/build/app/t/unit-tests"));

        let line = ScriptWriter::<Vec<u8>>::render(&step);
        assert_eq!(
            line,
            "if [ -f \"/src/build/app/t/unit-tests\" ]; then /src/build/app/t/unit-tests; fi"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_script_succeeds_without_unit_tests() {
        let dir = tempfile::tempdir().unwrap();
        let tests = dir.path().join("build dir").join("unit-tests");

        let mut writer = ScriptWriter::new(Vec::new());
        writer.invoke(&BuildStep::new("prepare", "true")).unwrap();
        let mut step = BuildStep::new("run unit tests for app", tests.display().to_string());
        step.only_if_exists = Some(tests);
        writer.invoke(&step).unwrap();

        let script = dir.path().join("plan.sh");
        std::fs::write(&script, writer.into_inner()).unwrap();

        let status = std::process::Command::new("sh").arg(&script).status().unwrap();
        assert!(status.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_script_quotes_search_path() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran $here");

        let mut step = BuildStep::new("touch marker", "touch").arg(marker.display().to_string());
        step.search_path = Some(std::ffi::OsString::from("/usr/bin:/bin:/opt/my tools"));

        let mut writer = ScriptWriter::new(Vec::new());
        writer.invoke(&step).unwrap();
        let script = dir.path().join("plan.sh");
        std::fs::write(&script, writer.into_inner()).unwrap();

        let status = std::process::Command::new("sh").arg(&script).status().unwrap();
        assert!(status.success());
        assert!(marker.exists());
    }
}
