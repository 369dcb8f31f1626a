//! Toolchain Detection
//!
//! Checks that the compilers and linkers named by a resolved configuration
//! can be found on the search path the build will run with.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::registry::ToolchainConfig;

/// Locate a single tool, on `search_path` if given, else on the process `PATH`
pub fn find_tool(name: &str, search_path: Option<&OsStr>, cwd: &Path) -> Option<PathBuf> {
    let found = match search_path {
        Some(paths) => which::which_in(name, Some(paths), cwd),
        None => which::which(name),
    };
    found.ok()
}

/// Tools of `config` that cannot be found. Missing tools are only warned
/// about: the build itself reports the real failure.
pub fn missing_tools(config: &ToolchainConfig, search_path: Option<&OsStr>, cwd: &Path) -> Vec<String> {
    let mut missing = Vec::new();

    for tool in config.tools() {
        match find_tool(tool, search_path, cwd) {
            Some(path) => debug!("Found {} at {:?}", tool, path),
            None => {
                warn!("{} not found on PATH", tool);
                missing.push(tool.to_string());
            }
        }
    }

    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn test_empty_config_has_nothing_missing() {
        let cwd = std::env::temp_dir();
        assert!(missing_tools(&ToolchainConfig::default(), None, &cwd).is_empty());
    }

    #[test]
    fn test_missing_cross_compiler() {
        let dir = tempfile::tempdir().unwrap();
        let search_path = OsString::from(dir.path());
        let config = ToolchainConfig {
            cc: Some("arm-linux-gnueabihf-gcc".to_string()),
            cflags: Some("-march=armv7-a+vfpv3-d16".to_string()),
            ..Default::default()
        };

        let missing = missing_tools(&config, Some(search_path.as_os_str()), dir.path());
        assert_eq!(missing, vec!["arm-linux-gnueabihf-gcc".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_finds_tool_on_search_path() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("aarch64-linux-android21-clang");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let search_path = OsString::from(dir.path());
        let found = find_tool("aarch64-linux-android21-clang", Some(search_path.as_os_str()), dir.path());
        assert!(found.unwrap().ends_with(tool.file_name().unwrap()));
    }
}
