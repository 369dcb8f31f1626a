//! CMake / vcpkg command planning
//!
//! Builds the command lines for bootstrapping vcpkg, configuring and
//! building an app with CMake, and running its unit tests.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use vina_build_core::{HostOs, LayoutSettings};
use vina_build_toolchain::{shell_quote, EnvOverlay, Resolution};

/// One command of a build plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStep {
    /// What the step does, e.g. `configure boinc-autodock-vina`
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
    /// Toolchain overlay for the command's environment
    pub env: EnvOverlay,
    /// `PATH` for the command, when the session adjusted it
    pub search_path: Option<OsString>,
    /// Skip the step unless this file exists when it runs
    pub only_if_exists: Option<PathBuf>,
}

impl BuildStep {
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            env: EnvOverlay::default(),
            search_path: None,
            only_if_exists: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The command line as a single shell-quoted string
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Plans CMake and vcpkg commands for a source tree
pub struct CMakePlanner<'a> {
    layout: &'a LayoutSettings,
    source_root: PathBuf,
    host: HostOs,
}

impl<'a> CMakePlanner<'a> {
    pub fn new(layout: &'a LayoutSettings, source_root: PathBuf, host: HostOs) -> Self {
        Self { layout, source_root, host }
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        self.source_root.join(path)
    }

    fn bootstrap_script(&self) -> &'static str {
        if self.host.is_windows() {
            "bootstrap-vcpkg.bat"
        } else {
            "bootstrap-vcpkg.sh"
        }
    }

    /// Binary directory for (app, triplet)
    pub fn binary_dir(&self, app: &str, triplet: &str) -> PathBuf {
        self.layout.build_dir.join(app).join(triplet)
    }

    /// Clone (when missing), update and bootstrap vcpkg
    pub fn vcpkg_steps(&self) -> Vec<BuildStep> {
        let vcpkg_root = &self.layout.vcpkg_root;
        let script = vcpkg_root.join(self.bootstrap_script());
        let mut steps = Vec::new();

        if !self.absolute(&script).is_file() {
            steps.push(
                BuildStep::new("clone vcpkg", "git")
                    .args(["clone", "https://github.com/microsoft/vcpkg.git"])
                    .arg(vcpkg_root.display().to_string()),
            );
        }

        steps.push(
            BuildStep::new("pull vcpkg", "git")
                .arg("-C")
                .arg(vcpkg_root.display().to_string())
                .arg("pull"),
        );

        let bootstrap = if self.host.is_windows() {
            script.display().to_string()
        } else {
            format!("./{}", script.display())
        };
        steps.push(BuildStep::new("bootstrap vcpkg", bootstrap));

        steps
    }

    /// `cmake -B ... -S ...` with the vcpkg toolchain and the resolved
    /// toolchain overlay
    pub fn configure(&self, app: &str, triplet_set: &str, resolution: &Resolution) -> BuildStep {
        let triplet = resolution.triplet.raw.as_str();
        let vcpkg_cmake = self
            .absolute(&self.layout.vcpkg_root)
            .join("scripts")
            .join("buildsystems")
            .join("vcpkg.cmake");
        let overlay_triplets = self.absolute(&self.layout.triplet_sets_dir).join(triplet_set);
        let overlay_ports = self.absolute(&self.layout.ports_dir);

        let mut step = BuildStep::new(format!("configure {}", app), "cmake")
            .arg("-B")
            .arg(self.binary_dir(app, triplet).display().to_string())
            .arg("-S")
            .arg(app);

        if let Some(ref flag) = resolution.arch_flag {
            step = step.args(flag.iter().cloned());
        }

        step = step.args([
            format!("-DCMAKE_TOOLCHAIN_FILE={}", vcpkg_cmake.display()),
            format!("-DVCPKG_OVERLAY_PORTS={}", overlay_ports.display()),
            format!("-DVCPKG_OVERLAY_TRIPLETS={}", overlay_triplets.display()),
            format!("-DVCPKG_TARGET_TRIPLET={}", triplet),
            "-DVCPKG_INSTALL_OPTIONS=--clean-after-build".to_string(),
        ]);

        step.env = resolution.overlay.clone();
        step
    }

    /// `cmake --build ... --config Release`
    pub fn build(&self, app: &str, triplet: &str) -> BuildStep {
        BuildStep::new(format!("build {}", app), "cmake")
            .arg("--build")
            .arg(self.binary_dir(app, triplet).display().to_string())
            .args(["--config", "Release"])
    }

    /// Path of the unit test binary for (app, triplet)
    pub fn unit_tests_path(&self, app: &str, triplet: &str) -> PathBuf {
        let dir = self.absolute(&self.binary_dir(app, triplet));
        if self.host.is_windows() {
            dir.join("Release").join("unit-tests.exe")
        } else {
            dir.join("unit-tests")
        }
    }

    /// Run the unit tests if they were built, under OpenCppCoverage when
    /// a coverage tool is given on Windows
    pub fn unit_tests(&self, app: &str, triplet: &str, coverage_tool: Option<&Path>) -> BuildStep {
        let tests = self.unit_tests_path(app, triplet);
        let name = format!("run unit tests for {}", app);

        let mut step = match coverage_tool {
            Some(tool) if self.host.is_windows() => BuildStep::new(name, tool.display().to_string())
                .args([
                    "--cover_children".to_string(),
                    "--optimized_build".to_string(),
                    "--sources".to_string(),
                    self.source_root.display().to_string(),
                    "--export_type=cobertura:cobertura.xml".to_string(),
                    "--".to_string(),
                    tests.display().to_string(),
                    "--gtest_output=xml:gtest.xml".to_string(),
                ]),
            _ => BuildStep::new(name, tests.display().to_string()),
        };

        step.only_if_exists = Some(tests);
        step
    }
}
